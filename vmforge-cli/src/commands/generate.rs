//! `generate` command handler
//!
//! Loads the template list, shows the plan, then drives the generation
//! scheduler while echoing stage transitions.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::*;
use tokio::sync::mpsc;
use vmforge_core::domain::report::{GenerationReport, TemplateOutcome};
use vmforge_core::domain::stage::StageEvent;
use vmforge_core::domain::template::TemplateSpec;
use vmforge_engine::GenerationScheduler;
use vmforge_engine::image::ProviderRegistry;
use vmforge_engine::scheduler::DEFAULT_CONCURRENCY;

use crate::commands::{Session, build_client};
use crate::config;

/// Report output format
#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yml")]
    config: String,

    /// Maximum number of templates generated concurrently
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    parallel: usize,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,

    /// Report output format
    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,
}

pub async fn handle_generate(args: GenerateArgs, session: &Session) -> Result<()> {
    let specs = config::load_templates(Path::new(&args.config))
        .with_context(|| format!("failed to load configuration from {}", args.config))?;

    if specs.is_empty() {
        println!("{}", "The configuration lists no templates.".yellow());
        return Ok(());
    }

    print_plan(&specs);

    if !args.yes && !confirm("Continue with template generation?")? {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }

    let client = Arc::new(build_client(session)?);
    let scheduler = GenerationScheduler::new(client, ProviderRegistry::builtin())
        .with_concurrency(args.parallel);

    let (events, mut progress) = mpsc::unbounded_channel::<StageEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = progress.recv().await {
            println!(
                "  {} {} {}",
                "▸".cyan(),
                event.template.bold(),
                event.stage.to_string().dimmed()
            );
        }
    });

    let report = scheduler.run(specs, Some(events)).await;
    // The channel closes once the scheduler has dropped every sender.
    let _ = printer.await;

    print_report(&report, args.output)?;

    if report.has_failures() {
        bail!(
            "{} of {} template(s) failed",
            report.failed(),
            report.outcomes.len()
        );
    }
    Ok(())
}

/// Show what a run would do before asking for confirmation.
fn print_plan(specs: &[TemplateSpec]) {
    println!("{}", format!("Templates to generate ({}):", specs.len()).bold());
    println!();
    for spec in specs {
        println!("  {} {}", "▸".cyan(), spec.target.name.bold());
        println!(
            "    Source:    {} {} {} ({})",
            spec.source.distribution,
            spec.source.version,
            spec.source.variant,
            spec.source.architecture
        );
        println!("    Base:      {}", spec.source.base_template);
        println!(
            "    Shape:     {} vCPU, {} GiB",
            spec.target.cpu, spec.target.memory_gib
        );
        println!(
            "    Placement: network '{}', SR '{}'",
            spec.target.network, spec.target.sr
        );
        println!();
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [Y/n] ", prompt);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let answer = line.trim().to_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}

fn print_report(report: &GenerationReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!();
    for (name, outcome) in &report.outcomes {
        match outcome {
            TemplateOutcome::Success { template, warnings } => {
                println!("{} {} ({})", "ok".green().bold(), name.bold(), template);
                for warning in warnings {
                    println!("   {} {}", "warning:".yellow(), warning);
                }
            }
            TemplateOutcome::Failure {
                stage,
                error,
                rollback_warnings,
            } => {
                println!(
                    "{} {} failed while {}: {}",
                    "err".red().bold(),
                    name.bold(),
                    stage,
                    error
                );
                for warning in rollback_warnings {
                    println!("   {} {}", "warning:".yellow(), warning);
                }
            }
        }
    }
    println!();
    println!(
        "{}",
        format!(
            "{} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        )
        .bold()
    );
    Ok(())
}
