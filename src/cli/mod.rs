//! Command-line interface for Groundwork.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`dispatch`] - Command implementations
//!
//! Every command path ends in success at the process level: the bootstrap
//! reports failures through warnings, never through a nonzero exit.

pub mod args;

pub use args::{Cli, Commands, CompletionsArgs, ReportFormat, RunArgs, StatusArgs};

use crate::plan::{BootstrapPlan, Workspace};
use crate::runner::{self, RunOptions};
use crate::secrets::{OutputMasker, SecretStore};
use crate::steps::StepStatus;
use clap::CommandFactory;
use console::style;

/// Dispatch a parsed CLI invocation.
pub fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    let workspace = Workspace::resolve(cli.home.clone(), cli.secrets.clone());

    match &cli.command {
        None => run(cli, workspace, &RunArgs::default()),
        Some(Commands::Run(args)) => run(cli, workspace, args),
        Some(Commands::Status(args)) => status(workspace, args),
        Some(Commands::Completions(args)) => {
            completions(args);
            Ok(())
        }
    }
}

/// Run the bootstrap.
fn run(cli: &Cli, workspace: Workspace, args: &RunArgs) -> anyhow::Result<()> {
    let plan = BootstrapPlan::new(workspace.clone(), args.force);

    if args.dry_run {
        println!("Would bootstrap {}:", workspace.home.display());
        for line in plan.describe() {
            println!("  {}", line);
        }
        return Ok(());
    }

    // A broken secrets file downgrades to "no secrets", not to a failed
    // run; the renderer falls back to env vars and placeholders.
    let secrets = match SecretStore::load_optional(&workspace.secrets_path) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(error = %e, path = %workspace.secrets_path.display(), "could not read secrets file");
            SecretStore::empty()
        }
    };

    let mut masker = OutputMasker::new();
    let steps = plan.steps(&secrets, &mut masker);

    let options = RunOptions {
        show_progress: !cli.quiet && console::user_attended(),
    };
    let report = runner::execute(steps, &masker, &options);

    match args.report {
        ReportFormat::Json => println!("{}", report.to_json()?),
        ReportFormat::Text if cli.quiet => {
            for warning in &report.warnings {
                eprintln!("{} {}", style("warning:").yellow().bold(), warning);
            }
        }
        ReportFormat::Text => print!("{}", report.render_text()),
    }

    Ok(())
}

/// Probe-only status: reports what is present, mutates nothing.
fn status(workspace: Workspace, args: &StatusArgs) -> anyhow::Result<()> {
    let plan = BootstrapPlan::new(workspace.clone(), false);

    let mut entries: Vec<(String, String, bool)> = Vec::new();

    for tool in &plan.tools {
        let capability = tool.probe.detect();
        entries.push((tool.name.clone(), capability.describe(), capability.is_present()));
    }

    for repo in &plan.repos {
        let state = if repo.is_built() {
            format!("built ({})", repo.artifact_path().display())
        } else if repo.is_cloned() {
            "cloned, not built".to_string()
        } else {
            "not cloned".to_string()
        };
        entries.push((repo.name.clone(), state, repo.is_built()));
    }

    for config in ["opendata-mcp.json", "github-mcp.json"] {
        let path = workspace.config_dir().join(config);
        let present = path.exists();
        let state = if present {
            format!("rendered ({})", path.display())
        } else {
            "not rendered".to_string()
        };
        entries.push((config.to_string(), state, present));
    }

    if args.json {
        let value: Vec<serde_json::Value> = entries
            .iter()
            .map(|(name, state, ready)| {
                serde_json::json!({ "name": name, "state": state, "ready": ready })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for (name, state, ready) in &entries {
            let marker = if *ready {
                style(StepStatus::Succeeded.display_char()).green()
            } else {
                style('-').dim()
            };
            println!("{} {:<20} {}", marker, name, state);
        }
    }

    Ok(())
}

/// Generate shell completions on stdout.
fn completions(args: &CompletionsArgs) {
    let mut cmd = Cli::command();
    clap_complete::generate(args.shell, &mut cmd, "groundwork", &mut std::io::stdout());
}
