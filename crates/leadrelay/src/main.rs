use std::process::ExitCode;

use log::{error, info};
use tokio::sync::watch;

use leadrelay::{
    init_logging, open_store, Config, HubSpotClient, ImapClient, IngestionLoop, LeadRelayError,
    LogFormat, MailboxSession, MessageTracker,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from the environment too; fall back to text.
            let _ = init_logging(LogFormat::default());
            error!("{}", LeadRelayError::from(e));
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(config.log_format) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> leadrelay::Result<()> {
    info!("Starting leadrelay v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config.processed_store_path)?;
    let tracker = MessageTracker::open(store)?;

    let folder = config.mailbox.folder.clone();
    let session = MailboxSession::new(ImapClient::new(config.mailbox), folder)
        .with_reconnect_delay(config.reconnect_delay);

    let sink = HubSpotClient::new(config.crm)?;

    let mut ingest = IngestionLoop::new(session, tracker, sink, config.target_sender)
        .with_poll_interval(config.poll_interval);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown requested, finishing current cycle");
        let _ = shutdown_tx.send(true);
    });

    ingest.run(shutdown_rx).await;

    let stats = ingest.tracker().stats();
    info!(
        "Processed ids known: {} (stored in {})",
        stats.known, stats.location
    );
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            error!("Failed to listen for SIGTERM: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
