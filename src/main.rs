//! qscore CLI entry point

use clap::{ArgGroup, Parser};
use qscore_core::ScoreConfig;
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "qscore")]
#[command(about = "Package modularity (Q) scores for Java projects", long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["project", "dataset", "collect"])
))]
struct Cli {
    /// Score a single project
    #[arg(long, value_name = "PATH")]
    project: Option<PathBuf>,

    /// Score every <dataType>/<project> under a dataset root
    #[arg(long, value_name = "PATH")]
    dataset: Option<PathBuf>,

    /// Gather the score files under --output_dir into q_values.json
    #[arg(long)]
    collect: bool,

    /// Where score files are written
    #[arg(long = "output_dir", value_name = "PATH", default_value = "./output")]
    output_dir: PathBuf,

    /// Where the batch log is written (dataset mode)
    #[arg(long = "log_dir", value_name = "PATH", default_value = "./logs")]
    log_dir: PathBuf,

    /// Projects scored at the same time (dataset mode)
    #[arg(long = "num_workers", value_name = "N", default_value_t = 1)]
    num_workers: usize,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.project.is_some() {
        logging::init_child(cli.verbose);
    } else if cli.dataset.is_some() {
        if let Err(e) = logging::init_batch(&cli.log_dir, cli.verbose) {
            logging::init_console(cli.verbose);
            tracing::error!("Cannot open log in {}: {}", cli.log_dir.display(), e);
        }
    } else {
        logging::init_console(cli.verbose);
    }

    let config = match ScoreConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return Ok(());
        }
    };

    if let Some(project) = cli.project {
        commands::project(project, cli.output_dir, config).await
    } else if let Some(dataset) = cli.dataset {
        tracing::info!("qscore v{}", env!("CARGO_PKG_VERSION"));
        let options = commands::DatasetOptions {
            output_dir: cli.output_dir,
            num_workers: cli.num_workers,
            config_path: cli.config,
            verbose: cli.verbose,
        };
        commands::dataset(dataset, options, config).await
    } else {
        commands::collect(cli.output_dir, &config)
    }
}
