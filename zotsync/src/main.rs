use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zotsync::config::{Cli, SyncConfig};
use zotsync::session::sync_library;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = SyncConfig::from_cli(cli)?;
    info!(
        library = %config.library.id,
        remote_root = %config.remote_root,
        staging = %config.staging_root.display(),
        "beginning sync"
    );
    let report = sync_library(&config).await?;
    info!(
        collections = report.directories_visited,
        created = report.directories_created,
        uploaded = report.files_uploaded,
        skipped = report.files_skipped,
        warnings = report.warnings,
        "sync complete"
    );
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info,zotsync=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
