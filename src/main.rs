use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use stepline::cli::commands::{
    FmtCommand, HistoryCommand, ListCommand, RunCommand, TriggerCommand, ValidateCommand,
};
use stepline::cli::output::*;
use stepline::cli::{exit_code, Cli, Command, RunOutcome, EXIT_CONFIG_ERROR};
use stepline::core::config::PipelineConfig;
use stepline::core::env::EnvSecretStore;
use stepline::core::{should_run, Event, Pipeline, RunContext, RunStatus};
use stepline::execution::{ExecutionEngine, ShellCommandRunner};
use stepline::persistence::{create_summary, PersistenceBackend, RunSummary};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    let cli = Cli::from_args();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("{} {:#}", WARN, e);
    }

    let result = match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await.map(|outcome| outcome.exit_code()),
        Command::Validate(cmd) => validate_pipeline(cmd),
        Command::Trigger(cmd) => check_trigger(cmd),
        Command::Fmt(cmd) => format_pipeline(cmd),
        Command::List(cmd) => list_pipelines(cmd).await,
        Command::History(cmd) => show_history(cmd).await,
    };

    if let Err(e) = &result {
        eprintln!("{} {}", CROSS, style(format!("{:#}", e)).red());
    }
    std::process::exit(exit_code(&result));
}

/// Logs go to stderr; `RUST_LOG` overrides the level picked by `--verbose`
fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")
}

fn load_pipeline(path: &str) -> Result<Pipeline> {
    let config = PipelineConfig::from_file(path)
        .with_context(|| format!("Failed to load pipeline config {}", path))?;
    config
        .to_pipeline()
        .with_context(|| format!("Invalid pipeline definition in {}", path))
}

async fn open_store() -> Result<Arc<dyn PersistenceBackend>> {
    #[cfg(feature = "sqlite")]
    {
        let store = stepline::persistence::SqliteExecutionStore::with_default_path()
            .await
            .context("Failed to open run history")?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "sqlite"))]
    {
        warn!("Built without sqlite support; run history only lasts for this process");
        Ok(Arc::new(stepline::persistence::InMemoryPersistence::new()))
    }
}

async fn run_pipeline(cmd: &RunCommand) -> Result<RunOutcome> {
    let pipeline = load_pipeline(&cmd.file)?;
    let human = !cmd.json;

    if human {
        println!("{} Loaded pipeline: {}", INFO, style(&pipeline.name).bold());
    }

    let mut event = Event::new(cmd.event.as_str());
    if let Some(branch) = &cmd.branch {
        event = event.with_branch(branch.as_str());
    }

    if !should_run(&event, &pipeline.trigger) {
        if event.kind().is_none() {
            warn!("Unrecognized event kind '{}'", event.name);
        }
        if human {
            println!(
                "{} Event {} does not trigger {} (accepts: {})",
                SKIP,
                style(&event.name).cyan(),
                style(&pipeline.name).bold(),
                pipeline.trigger.names().join(", ")
            );
        } else {
            let data = serde_json::json!({
                "pipeline": pipeline.name,
                "event": event.name,
                "triggered": false,
            });
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        return Ok(RunOutcome::NotTriggered);
    }

    let working_dir = PathBuf::from(&cmd.workdir);
    if !working_dir.is_dir() {
        anyhow::bail!("Working directory does not exist: {}", working_dir.display());
    }

    let secrets = match &cmd.secret_prefix {
        Some(prefix) => EnvSecretStore::with_prefix(prefix.as_str()),
        None => EnvSecretStore::new(),
    };
    let mut context = RunContext::prepare(&pipeline, event, &secrets, working_dir)
        .context("Failed to resolve pipeline environment")?;
    debug!("Resolved environment: {:?}", context.environment);

    // Apply variable overrides
    for (key, value) in &cmd.var {
        if context.environment.is_secret(key) {
            warn!("Override replaces secret variable {}", key);
        }
        context.set_variable(key.clone(), value.clone());
        if human {
            println!(
                "{} Variable override: {} = {}",
                INFO,
                style(key).cyan(),
                style(value).dim()
            );
        }
    }

    let mut engine = ExecutionEngine::new(ShellCommandRunner::default());
    if human {
        engine.add_event_handler(|event| {
            println!("{}", format_execution_event(&event));
        });
    }

    let cancel = engine.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, no further steps will start");
            cancel.cancel();
        }
    });

    if human {
        println!();
    }
    let result = engine
        .run(&pipeline, &context)
        .await
        .context("Pipeline run failed")?;

    // Save to history
    if !cmd.no_history {
        let summary = create_summary(&pipeline, &context, &result);
        match save_history(&summary).await {
            Ok(()) if human => println!(
                "\n{} Run saved to history (ID: {})",
                INFO,
                style(&summary.execution_id.to_string()[..8]).dim()
            ),
            Ok(()) => {}
            Err(e) => warn!("Could not save run to history: {:#}", e),
        }
    }

    if human {
        println!("\n{}", format_run_result(&pipeline.name, &result));
    } else {
        let data = serde_json::json!({
            "pipeline": pipeline.name,
            "execution_id": context.execution_id,
            "event": context.event.name,
            "triggered": true,
            "result": result,
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
    }

    Ok(RunOutcome::Finished(result.status))
}

async fn save_history(summary: &RunSummary) -> Result<()> {
    let store = open_store().await?;
    store.save_run(summary).await
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<i32> {
    if !cmd.json {
        println!("{} Validating pipeline...", INFO);
    }

    let pipeline = match PipelineConfig::from_file(&cmd.file).and_then(|c| c.to_pipeline()) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            if cmd.json {
                let data = serde_json::json!({ "valid": false, "error": e.to_string() });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{} Validation failed:", CROSS);
                println!("  {}", style(e).red());
            }
            return Ok(EXIT_CONFIG_ERROR);
        }
    };

    if cmd.json {
        let data = serde_json::json!({
            "valid": true,
            "name": pipeline.name,
            "on": pipeline.trigger.names(),
            "steps": pipeline.steps().iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            "env": pipeline.env.keys().collect::<Vec<_>>(),
            "secrets": pipeline.required_secrets(),
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(0);
    }

    println!("{} Pipeline configuration is valid!", CHECK);
    println!("  Name: {}", style(&pipeline.name).bold());
    println!("  Triggers: {}", style(pipeline.trigger.names().join(", ")).cyan());
    if pipeline.trigger.is_empty() {
        println!("  {} Empty 'on' list: no event will start this pipeline", WARN);
    }
    println!("  Steps: {}", style(pipeline.len()).cyan());
    for (index, step) in pipeline.steps().iter().enumerate() {
        println!("    {}. {}", index + 1, step.label());
    }
    println!("  Variables: {}", style(pipeline.env.len()).cyan());

    let secrets = pipeline.required_secrets();
    if !secrets.is_empty() {
        println!("  Secrets: {}", style(secrets.join(", ")).yellow());
    }

    Ok(0)
}

fn check_trigger(cmd: &TriggerCommand) -> Result<i32> {
    let pipeline = load_pipeline(&cmd.file)?;
    let event = Event::new(cmd.event.as_str());

    if event.kind().is_none() {
        warn!("Unrecognized event kind '{}'", event.name);
    }

    if should_run(&event, &pipeline.trigger) {
        println!(
            "{} {} runs on {}",
            CHECK,
            style(&pipeline.name).bold(),
            style(&event.name).cyan()
        );
        Ok(0)
    } else {
        println!(
            "{} {} does not run on {} (accepts: {})",
            SKIP,
            style(&pipeline.name).bold(),
            style(&event.name).cyan(),
            pipeline.trigger.names().join(", ")
        );
        Ok(1)
    }
}

fn format_pipeline(cmd: &FmtCommand) -> Result<i32> {
    let pipeline = load_pipeline(&cmd.file)?;
    let yaml = PipelineConfig::from_pipeline(&pipeline)
        .to_yaml()
        .context("Failed to serialize pipeline")?;
    print!("{}", yaml);
    Ok(0)
}

async fn list_pipelines(cmd: &ListCommand) -> Result<i32> {
    let spinner = create_spinner("Reading run history...");
    let store = open_store().await?;
    let mut pipelines = Vec::new();
    for name in store.list_pipelines().await? {
        let runs = store.list_runs(&name).await?;
        pipelines.push((name, runs));
    }
    spinner.finish_and_clear();

    if cmd.json {
        let data: Vec<_> = pipelines
            .iter()
            .map(|(name, runs)| {
                serde_json::json!({
                    "name": name,
                    "run_count": runs.len(),
                    "succeeded": runs.iter().filter(|r| r.status.is_success()).count(),
                })
            })
            .collect();
        let data = serde_json::json!({ "pipelines": data });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(0);
    }

    if pipelines.is_empty() {
        println!("{} No pipelines found in history", INFO);
        return Ok(0);
    }

    println!("{} Pipelines in history:", INFO);
    for (name, runs) in &pipelines {
        if cmd.with_counts {
            let succeeded = runs.iter().filter(|r| r.status.is_success()).count();
            let failed = runs
                .iter()
                .filter(|r| matches!(r.status, RunStatus::Failed { .. }))
                .count();
            println!(
                "  {} ({} runs: {} succeeded, {} failed)",
                style(name).bold(),
                style(runs.len()).cyan(),
                style(succeeded).green(),
                style(failed).red()
            );
        } else {
            println!("  {}", style(name).bold());
        }
    }

    Ok(0)
}

async fn show_history(cmd: &HistoryCommand) -> Result<i32> {
    let spinner = create_spinner("Reading run history...");
    let store = open_store().await?;

    // If specific execution ID is requested
    if let Some(exec_id) = &cmd.execution_id {
        let exec_id = Uuid::parse_str(exec_id).context("Invalid execution ID format")?;
        let summary = store.load_run(exec_id).await?;
        spinner.finish_and_clear();

        return match summary {
            Some(summary) => {
                print_run_details(&summary, cmd.steps, cmd.json)?;
                Ok(0)
            }
            None => {
                println!("{} Run not found", WARN);
                Ok(1)
            }
        };
    }

    let mut runs = match &cmd.pipeline {
        Some(name) => store.list_runs(name).await?,
        None => store.recent_runs(cmd.limit).await?,
    };
    runs.truncate(cmd.limit);
    spinner.finish_and_clear();

    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(0);
    }

    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(0);
    }

    println!("{} Run history (showing latest {}):", INFO, runs.len());
    for summary in &runs {
        println!("  {}", format_run_summary(summary));
    }

    Ok(0)
}

fn print_run_details(summary: &RunSummary, show_steps: bool, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("{} Run Details", INFO);
    println!("  ID: {}", style(summary.execution_id).cyan());
    println!("  Pipeline: {}", style(&summary.pipeline_name).bold());
    println!("  Event: {}", style(&summary.event).cyan());
    println!("  Status: {}", format_status(summary.status));
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    println!("  Completed: {}", style(summary.completed_at.to_rfc3339()).dim());
    if let Ok(duration) = summary
        .completed_at
        .signed_duration_since(summary.started_at)
        .to_std()
    {
        println!("  Duration: {}", style(format_duration(duration)).dim());
    }
    println!(
        "  Steps: {}/{}",
        summary.attempted_steps(),
        summary.total_steps
    );

    if show_steps {
        println!("\n  {}", style("Steps:").bold());
        for (index, outcome) in summary.outcomes.iter().enumerate() {
            println!("    {}", format_outcome(index + 1, outcome));
        }
    }

    Ok(())
}
