//! CLI output formatting

use crate::{
    core::{RunResult, RunStatus, StepExit, StepOutcome},
    execution::ExecutionEvent,
    persistence::RunSummary,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Create a spinner shown while waiting on the history store
///
/// Not used while steps run: their output goes straight to the terminal.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let spinner_style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(spinner_style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Success => style("SUCCESS").green().to_string(),
        RunStatus::Failed { step } => style(format!("FAILED (step {})", step)).red().to_string(),
        RunStatus::Cancelled { before_step } => {
            style(format!("CANCELLED (before step {})", before_step))
                .yellow()
                .to_string()
        }
    }
}

fn status_icon(status: RunStatus) -> &'static Emoji<'static, 'static> {
    match status {
        RunStatus::Success => &CHECK,
        RunStatus::Failed { .. } => &CROSS,
        RunStatus::Cancelled { .. } => &WARN,
    }
}

/// Format a single step outcome
pub fn format_outcome(number: usize, outcome: &StepOutcome) -> String {
    let line = format!(
        "{}. {} ({})",
        number,
        outcome.step_name,
        format_duration(outcome.duration)
    );
    match &outcome.exit {
        StepExit::Code(0) => format!("{} {}", CHECK, style(line).green()),
        exit => format!("{} {}: {}", CROSS, style(line).red(), style(exit).dim()),
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted {
            execution_id,
            pipeline_name,
            total_steps,
        } => format!(
            "{} Starting pipeline {} ({}, {} steps)",
            ROCKET,
            style(pipeline_name).bold(),
            style(&execution_id.to_string()[..8]).dim(),
            total_steps
        ),
        ExecutionEvent::StepStarted { number, name } => {
            format!("{} {}. {}", SPINNER, number, style(name).cyan())
        }
        ExecutionEvent::StepFinished { number, outcome } => format_outcome(*number, outcome),
        ExecutionEvent::RunFinished {
            execution_id,
            status,
        } => format!(
            "{} Pipeline ({}) {}",
            INFO,
            style(&execution_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Final line printed after a run
pub fn format_run_result(pipeline_name: &str, result: &RunResult) -> String {
    let verdict = match result.status {
        RunStatus::Success => format!("completed {}", style("successfully").green()),
        RunStatus::Failed { step } => {
            let reason = result
                .failed_outcome()
                .map(|o| format!(" ({})", o.exit))
                .unwrap_or_default();
            format!("{} at step {}{}", style("failed").red(), step, reason)
        }
        RunStatus::Cancelled { before_step } => format!(
            "{} before step {}",
            style("cancelled").yellow(),
            before_step
        ),
    };

    format!(
        "{} {} {} in {}",
        status_icon(result.status),
        style(pipeline_name).bold(),
        verdict,
        format_duration(result.total_duration())
    )
}

/// Format a history entry for display
pub fn format_run_summary(summary: &RunSummary) -> String {
    format!(
        "{} {} - {} - {} - {} ({}/{}) - {}",
        status_icon(summary.status),
        style(&summary.execution_id.to_string()[..8]).dim(),
        style(&summary.pipeline_name).bold(),
        style(&summary.event).cyan(),
        format_status(summary.status),
        summary.attempted_steps(),
        summary.total_steps,
        style(summary.started_at.format("%Y-%m-%d %H:%M:%S")).dim()
    )
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
