mod config;
mod export_cmd;
mod merge_cmd;
mod plan_io;
mod replay_cmd;
mod status_cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use config::DentplanConfig;
use plan_io::PlanFormat;

#[derive(Parser)]
#[command(name = "dentplan", about = "Restoration plan configurator for lab order intake")]
struct Cli {
    /// Comma-separated implant fields required before step 2
    /// (overrides DENTPLAN_REQUIRED_IMPLANT_FIELDS env var)
    #[arg(long, global = true)]
    required_fields: Option<String>,

    /// Allow leaving step 1 with incomplete implant data
    #[arg(long, global = true)]
    skip_implant_validation: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a dentplan config file with the defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Check a plan file for internal consistency
    Validate {
        /// Path to the plan (.toml or .json)
        plan: PathBuf,
    },
    /// Show configuration progress of a plan file
    Status {
        /// Path to the plan (.toml or .json)
        plan: PathBuf,
    },
    /// Replay a session script and write the resulting plan
    Replay {
        /// Path to the session script (TOML)
        script: PathBuf,
        /// Plan to seed the session from
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output format: toml or json
        #[arg(long)]
        format: Option<PlanFormat>,
    },
    /// Merge extraction suggestions (JSON) into a plan
    Merge {
        /// Path to the plan (.toml or .json)
        plan: PathBuf,
        /// Path to the suggestions JSON
        suggestions: PathBuf,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output format: toml or json
        #[arg(long)]
        format: Option<PlanFormat>,
    },
    /// Re-serialize a plan as TOML or JSON
    Export {
        /// Path to the plan (.toml or .json)
        plan: PathBuf,
        /// Output format: toml or json
        #[arg(long)]
        format: PlanFormat,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Execute the `dentplan init` command: write config file.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile::default();
    config::save_config(&cfg)?;

    let fields: Vec<String> = cfg
        .wizard
        .required_implant_fields
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("Config written to {}", path.display());
    println!("  wizard.required_implant_fields = {}", fields.join(", "));
    println!("  wizard.skip_implant_validation = {}", cfg.wizard.skip_implant_validation);
    println!("  export.format = {}", cfg.export.format);

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Init { force } = cli.command {
        return cmd_init(force);
    }

    let resolved = DentplanConfig::resolve(
        cli.required_fields.as_deref(),
        cli.skip_implant_validation,
    )?;

    match cli.command {
        Commands::Init { .. } => {}
        Commands::Validate { plan } => {
            status_cmd::run_validate(&plan)?;
        }
        Commands::Status { plan } => {
            status_cmd::run_status(&plan, resolved.engine)?;
        }
        Commands::Replay {
            script,
            plan,
            output,
            format,
        } => {
            let format =
                plan_io::choose_format(format, output.as_deref(), resolved.default_format);
            replay_cmd::run_replay(
                &script,
                plan.as_deref(),
                output.as_deref(),
                format,
                resolved.engine,
            )?;
        }
        Commands::Merge {
            plan,
            suggestions,
            output,
            format,
        } => {
            let format =
                plan_io::choose_format(format, output.as_deref(), resolved.default_format);
            merge_cmd::run_merge(
                &plan,
                &suggestions,
                output.as_deref(),
                format,
                resolved.engine,
            )?;
        }
        Commands::Export {
            plan,
            format,
            output,
        } => {
            export_cmd::run_export(&plan, format, output.as_deref())?;
        }
    }

    Ok(())
}
