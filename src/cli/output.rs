//! CLI output formatting

use crate::{
    core::{JobResult, JobStatus, PipelineResult, PipelineStatus, StepStatus},
    execution::ExecutionEvent,
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
pub static STOP: Emoji<'_, '_> = Emoji("🛑 ", "x ");

/// Create a progress bar over the jobs of a run
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} jobs {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a step status for display
pub fn format_step_status(status: StepStatus) -> String {
    match status {
        StepStatus::Success => style("SUCCESS").green().to_string(),
        StepStatus::Failure => style("FAILURE").red().to_string(),
        StepStatus::Skipped => style("SKIPPED").dim().to_string(),
        StepStatus::Cancelled => style("CANCELLED").yellow().to_string(),
    }
}

/// Format a job status for display
pub fn format_job_status(status: JobStatus) -> String {
    match status {
        JobStatus::Pending => style("PENDING").dim().to_string(),
        JobStatus::Running => style("RUNNING").yellow().to_string(),
        JobStatus::Success => style("SUCCESS").green().to_string(),
        JobStatus::Failure => style("FAILURE").red().to_string(),
        JobStatus::Cancelled => style("CANCELLED").yellow().to_string(),
    }
}

/// Format a pipeline status for display
pub fn format_pipeline_status(status: PipelineStatus) -> String {
    match status {
        PipelineStatus::Success => style("SUCCESS").green().to_string(),
        PipelineStatus::Failure => style("FAILURE").red().to_string(),
        PipelineStatus::Cancelled => style("CANCELLED").yellow().to_string(),
    }
}

fn step_icon(status: StepStatus) -> Emoji<'static, 'static> {
    match status {
        StepStatus::Success => CHECK,
        StepStatus::Failure => CROSS,
        StepStatus::Skipped => SKIP,
        StepStatus::Cancelled => STOP,
    }
}

fn job_icon(status: JobStatus) -> Emoji<'static, 'static> {
    match status {
        JobStatus::Success => CHECK,
        JobStatus::Failure => CROSS,
        JobStatus::Cancelled => STOP,
        JobStatus::Pending | JobStatus::Running => SPINNER,
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            run_id,
            pipeline_name,
            total_jobs,
        } => format!(
            "{} Starting pipeline {} ({}) with {} jobs",
            ROCKET,
            style(pipeline_name).bold(),
            style(&run_id.to_string()[..8]).dim(),
            style(total_jobs).cyan()
        ),
        ExecutionEvent::JobStarted { job } => {
            format!("{} {}", SPINNER, style(job).cyan())
        }
        ExecutionEvent::StepStarted { job, step } => {
            format!("  {} {} {}", SPINNER, style(job).dim(), step)
        }
        ExecutionEvent::StepFinished { job, result } => format!(
            "  {} {} {} {}",
            step_icon(result.status),
            style(job).dim(),
            result.name,
            format_step_status(result.status)
        ),
        ExecutionEvent::JobCompleted { result } => format!(
            "{} {} {}",
            job_icon(result.status),
            style(&result.instance).bold(),
            format_job_status(result.status)
        ),
        ExecutionEvent::PipelineCompleted { run_id, status } => format!(
            "{} Pipeline ({}) {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_pipeline_status(*status)
        ),
    }
}

/// Notice printed when the user interrupts a run
pub fn format_interrupt(forced: bool) -> String {
    if forced {
        format!(
            "{} {}",
            STOP,
            style("Interrupted again, aborting running steps").red()
        )
    } else {
        format!(
            "{} {}",
            WARN,
            style("Interrupted, finishing running steps (press Ctrl-C again to abort)").yellow()
        )
    }
}

/// Format one job with its steps
pub fn format_job_result(result: &JobResult, show_output: bool) -> String {
    let mut lines = vec![format!(
        "{} {} {}",
        job_icon(result.status),
        style(&result.instance).bold(),
        format_job_status(result.status)
    )];

    if let Some(error) = &result.error {
        lines.push(format!("    {}", style(error).red()));
    }

    for step in &result.steps {
        lines.push(format!(
            "    {} {} {}",
            step_icon(step.status),
            step.name,
            format_step_status(step.status)
        ));

        if let Some(error) = &step.runner_error {
            lines.push(format!("        {}", style(error).red()));
        }
        if show_output && step.status == StepStatus::Failure && !step.output.is_empty() {
            for line in format_output(&step.output, 10).lines() {
                lines.push(format!("        {}", line));
            }
        }
    }

    lines.join("\n")
}

/// Format the final summary of a run
pub fn format_pipeline_summary(result: &PipelineResult) -> String {
    let duration = result
        .finished_at
        .signed_duration_since(result.started_at)
        .to_std()
        .unwrap_or_default();

    format!(
        "{} {} {} in {} ({} succeeded, {} failed, {} cancelled)",
        job_icon(match result.status {
            PipelineStatus::Success => JobStatus::Success,
            PipelineStatus::Failure => JobStatus::Failure,
            PipelineStatus::Cancelled => JobStatus::Cancelled,
        }),
        style(&result.pipeline_name).bold(),
        format_pipeline_status(result.status),
        format_duration(duration),
        style(result.count(JobStatus::Success)).green(),
        style(result.count(JobStatus::Failure)).red(),
        style(result.count(JobStatus::Cancelled)).yellow()
    )
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[lines.len() - max_lines..].join("\n");
        format!(
            "{}... ({} earlier lines)\n{}",
            style("[truncated]").dim(),
            lines.len() - max_lines,
            truncated
        )
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
