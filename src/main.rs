use color_eyre::Result;
use homekeyd::config::RuntimeConfig;
use homekeyd::service::ServiceHandle;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    info!("Starting home key translation daemon");
    let config = RuntimeConfig::load().await;

    let (service, report) = ServiceHandle::spawn(config).await;
    if !report.fully_operational() {
        warn!("Service running degraded ({})", report);
    }

    wait_for_signal().await?;

    service.shutdown().await;
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

async fn wait_for_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received ctrl-c, shutting down"),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
    }

    Ok(())
}
