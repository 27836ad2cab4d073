use anyhow::{Context, Result};
use matrix_pipeline::cli::commands::{ListCommand, RunCommand, ValidateCommand};
use matrix_pipeline::cli::interrupt::watch_interrupts;
use matrix_pipeline::cli::output::*;
use matrix_pipeline::cli::{Cli, Command};
use matrix_pipeline::core::config::PipelineConfig;
use matrix_pipeline::core::Pipeline;
use matrix_pipeline::execution::{ExecutionEvent, PipelineOrchestrator};
use matrix_pipeline::runner::{DryRunRunner, ShellRunner, ShellRunnerConfig, StepRunner};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::List(cmd) => list_jobs(cmd)?,
    }

    Ok(())
}

/// Load a pipeline and narrow its matrix to the `--only` filters
fn load_pipeline(file: &str, only: &[(String, String)]) -> Result<Pipeline> {
    let config = PipelineConfig::from_file(file)
        .with_context(|| format!("Failed to load pipeline config from {}", file))?;
    let mut pipeline = config.to_pipeline()?;

    for (axis, value) in only {
        pipeline
            .matrix
            .restrict(axis, value)
            .with_context(|| format!("Invalid filter {}={}", axis, value))?;
    }

    Ok(pipeline)
}

async fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let pipeline = load_pipeline(&cmd.file, &cmd.only)?;
    let total = pipeline.matrix.job_count();

    if !cmd.json {
        println!(
            "{} Loaded pipeline: {} ({} jobs)",
            INFO,
            style(&pipeline.name).bold(),
            style(total).cyan()
        );
    }

    let runner: Box<dyn StepRunner> = if cmd.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(ShellRunner::new(
            ShellRunnerConfig::new().with_timeout(cmd.timeout),
        ))
    };

    let mut orchestrator = PipelineOrchestrator::new(runner).with_max_parallel(cmd.max_parallel);

    // Set up event handler for console output
    if !cmd.json {
        let progress = create_progress_bar(total);
        orchestrator.add_event_handler(move |event| match &event {
            ExecutionEvent::StepFinished { .. } | ExecutionEvent::JobStarted { .. } => {
                progress.println(format_execution_event(&event));
            }
            ExecutionEvent::JobCompleted { result } => {
                progress.println(format_execution_event(&event));
                progress.set_message(result.instance.to_string());
                progress.inc(1);
            }
            ExecutionEvent::PipelineCompleted { .. } => progress.finish_and_clear(),
            _ => {}
        });
    }

    // Ctrl-C stops dispatching and lets running steps finish; a second one exits
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let notify = cancel.clone();
            tokio::spawn(async move {
                notify.cancelled().await;
                eprintln!("{}", format_interrupt(false));
            });
            if watch_interrupts(tokio::signal::ctrl_c, cancel).await {
                eprintln!("{}", format_interrupt(true));
                std::process::exit(130);
            }
        });
    }

    let result = orchestrator
        .run_with_cancellation(&pipeline, cancel)
        .await
        .context("Failed to start pipeline")?;

    let json = serde_json::to_string_pretty(&result)?;
    if let Some(path) = &cmd.output {
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write result to {}", path.display()))?;
        info!("Result written to {}", path.display());
    }

    if cmd.json {
        println!("{}", json);
    } else {
        println!();
        for job in &result.jobs {
            println!("{}", format_job_result(job, true));
        }
        println!("\n{}", format_pipeline_summary(&result));
    }

    if !result.is_success() {
        std::process::exit(result.exit_code());
    }

    Ok(())
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    if !cmd.json {
        println!("{} Validating pipeline...", INFO);
    }

    let result = PipelineConfig::from_file(&cmd.file).and_then(|config| {
        let pipeline = config.to_pipeline()?;
        Ok((config, pipeline))
    });

    match result {
        Ok((config, pipeline)) => {
            if cmd.json {
                let data = serde_json::json!({
                    "valid": true,
                    "name": config.name,
                    "jobs": pipeline.matrix.job_count(),
                    "steps": config.steps.len(),
                    "pipeline": config,
                });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{} Pipeline configuration is valid!", CHECK);
                println!("  Name: {}", style(&config.name).bold());
                println!("  Axes: {}", style(pipeline.matrix.axes().len()).cyan());
                println!("  Jobs: {}", style(pipeline.matrix.job_count()).cyan());
                println!("  Steps: {}", style(config.steps.len()).cyan());
            }
            Ok(())
        }
        Err(e) => {
            if cmd.json {
                let data = serde_json::json!({ "valid": false, "error": e.to_string() });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{} Validation failed:", CROSS);
                println!("  {}", style(e).red());
            }
            std::process::exit(1);
        }
    }
}

fn list_jobs(cmd: &ListCommand) -> Result<()> {
    let pipeline = load_pipeline(&cmd.file, &cmd.only)?;
    let jobs: Vec<_> = pipeline.jobs()?.collect();

    if cmd.json {
        let data = serde_json::json!({ "pipeline": pipeline.name, "jobs": jobs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!(
        "{} {} expands to {} jobs:",
        INFO,
        style(&pipeline.name).bold(),
        style(jobs.len()).cyan()
    );
    for job in &jobs {
        println!("  #{} {}", style(job.index).dim(), style(job).bold());
    }

    Ok(())
}
