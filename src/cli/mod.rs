use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pgdbsync::api::{self, Endpoint, SyncOptions};
use pgdbsync::config::SyncConfig;
use pgdbsync::report::render_run;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pgdbsync")]
#[command(about = "Bring slave PostgreSQL schemas in line with a master", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the DDL each slave needs
    Diff(TargetArgs),

    /// Print the objects each slave would have changed
    Summary(TargetArgs),

    /// Apply the DDL to every slave, continuing past failed statements
    Run(TargetArgs),

    /// Print statements and summaries as JSON
    Raw(TargetArgs),
}

#[derive(Args)]
struct TargetArgs {
    /// Schema to compare
    #[arg(long, env = "PGDBSYNC_SCHEMA")]
    schema: Option<String>,

    /// Master database URL
    #[arg(long, env = "PGDBSYNC_MASTER", conflicts_with = "config")]
    master: Option<String>,

    /// Slave database URL; repeat for several slaves
    #[arg(long = "slave", conflicts_with = "config")]
    slaves: Vec<String>,

    /// JSON file listing master and slaves
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grant and revoke roles on objects present on both sides
    #[arg(long)]
    manage_grants: bool,

    /// Reassign owners of objects present on both sides
    #[arg(long)]
    manage_ownership: bool,
}

impl TargetArgs {
    fn into_options(self) -> Result<SyncOptions> {
        let mut options = match (self.config, self.master) {
            (Some(path), _) => {
                let config = SyncConfig::load(&path)?;
                SyncOptions::from_config(config, self.schema)
            }
            (None, Some(master)) => {
                if self.slaves.is_empty() {
                    bail!("at least one --slave is required");
                }
                SyncOptions::new(
                    master,
                    self.slaves.into_iter().map(Endpoint::Url).collect(),
                    self.schema.unwrap_or_default(),
                )
            }
            (None, None) => bail!("either --config or --master with --slave is required"),
        };

        if options.schema.trim().is_empty() {
            bail!("no schema given; pass --schema or set it in the config file");
        }
        if self.manage_grants {
            options = options.manage_grants();
        }
        if self.manage_ownership {
            options = options.manage_ownership();
        }
        Ok(options)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Diff(args) => {
            let text = api::diff(args.into_options()?).await?;
            print!("{text}");
        }
        Commands::Summary(args) => {
            let text = api::summary(args.into_options()?).await?;
            print!("{text}");
        }
        Commands::Raw(args) => {
            let diffs = api::raw(args.into_options()?).await?;
            let json = serde_json::to_string_pretty(&diffs).context("serializing diff")?;
            println!("{json}");
        }
        Commands::Run(args) => {
            let report = api::run(args.into_options()?).await?;
            print!("{}", render_run(&report));
            let failed: usize = report.iter().map(|run| run.failures.len()).sum();
            if failed > 0 {
                bail!("{failed} statement(s) failed");
            }
        }
    }

    Ok(())
}
