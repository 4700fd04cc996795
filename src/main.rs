//! treelink CLI - refresh a writable workspace from a snapshot mount

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use filetime::FileTime;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use treelink::{checkout_with, CheckoutOptions, Config, IoResultExt, CONFIG_FILE};

#[derive(Parser)]
#[command(name = "treelink")]
#[command(about = "materialize a read-only workspace snapshot as a symlink forest")]
#[command(version)]
struct Cli {
    /// workspace under the read-only snapshot mount to materialize
    #[arg(long)]
    ro: Option<PathBuf>,

    /// config file (default: <DIR>/.treelink.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// target writable directory
    #[arg(default_value = ".")]
    dir: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> treelink::Result<()> {
    let config_path = cli
        .config
        .unwrap_or_else(|| cli.dir.join(CONFIG_FILE));
    let config = Config::load_or_default(&config_path)?;

    let ro = cli
        .ro
        .or(config.ro)
        .ok_or(treelink::Error::NoReadOnlyRoot)?;
    let options = CheckoutOptions {
        skip_root_dirs: config.skip_dirs,
    };

    let changed = checkout_with(&ro, &cli.dir, &options)?;

    let now = FileTime::now();
    for path in &changed {
        filetime::set_file_mtime(path, now).with_path(path)?;
    }
    info!(count = changed.len(), "touched changed files");

    Ok(())
}
