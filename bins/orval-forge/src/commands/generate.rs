//! Generate command - run the generator, print a plan, or watch

use crate::watch;
use crate::OutputFormat;
use anyhow::Result;
use forge_cli::{format_count, format_duration, progress, Status};
use forge_generator::{GenerationPlan, GeneratorOptions, LoadedConfig, Orchestrator};
use std::path::{Path, PathBuf};

/// Arguments of the generate command
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub config: Option<PathBuf>,
    pub watch: bool,
    pub dry_run: bool,
    pub adapter_dir: Option<PathBuf>,
    pub verbose: bool,
}

impl GenerateArgs {
    /// Orchestrator options for `cwd`
    pub fn options(&self, cwd: &Path) -> GeneratorOptions {
        let options = GeneratorOptions::new(cwd).with_stream_output(self.verbose);
        match &self.adapter_dir {
            Some(dir) => options.with_adapter_dir(dir.clone()),
            None => options,
        }
    }
}

/// Run generate command
pub fn run(args: &GenerateArgs, format: OutputFormat) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let loaded = LoadedConfig::load(args.config.as_deref(), &cwd)?;

    if args.dry_run {
        let orchestrator = Orchestrator::new(loaded.config, args.options(&cwd));
        let plan = orchestrator.plan()?;
        print_plan(&plan, &loaded.path, format)?;
        return Ok(());
    }

    if args.watch {
        return watch::run(&loaded.path, &cwd, &args.options(&cwd));
    }

    let orchestrator = Orchestrator::new(loaded.config, args.options(&cwd));
    generate_once(&orchestrator)
}

/// One generator run with spinner and summary
pub fn generate_once(orchestrator: &Orchestrator) -> Result<()> {
    let spinner = if orchestrator.options().stream_output {
        None
    } else {
        Some(progress::spinner("Generating API code..."))
    };

    match orchestrator.generate() {
        Ok(report) => {
            if let Some(pb) = &spinner {
                progress::finish_success(pb, "Generator finished");
            }
            Status::success(&format!(
                "Generated {} with the {} client in {}",
                format_count(report.entries.len(), "entry", "entries"),
                report.client_type,
                format_duration(report.duration)
            ));
            Ok(())
        }
        Err(e) => {
            if let Some(pb) = &spinner {
                progress::finish_error(pb, "Generator failed");
            }
            Err(e.into())
        }
    }
}

fn print_plan(plan: &GenerationPlan, config_path: &Path, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(());
    }

    Status::header("Dry run");
    Status::detail("Config", &config_path.display().to_string());
    Status::detail("HTTP client", &plan.client_type);

    for (index, entry) in plan.entries.iter().enumerate() {
        Status::step(index + 1, plan.entries.len(), &entry.name);
        Status::detail("input", entry.input.as_deref().unwrap_or("<inline>"));
        Status::detail("target", &entry.target);
        let origin = if entry.injected { "injected" } else { "configured" };
        Status::detail(
            "mutator",
            &format!(
                "{} ({}, {origin})",
                entry.mutator.path(),
                entry.mutator.name().unwrap_or("default export")
            ),
        );
    }

    println!();
    Status::success("Configuration is valid");
    Ok(())
}
