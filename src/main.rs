//! Session server binary: reads command lines on stdin, writes
//! notifications to stdout.

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chessbot_arena::{
    ChannelNotifier, Cli, ClockConfig, ClockService, CommandDispatcher, ControllerConfig,
    GameStore, NullEngine, SessionController, StrategyEngine, UciEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(db_path = %cli.db_path, engine = %cli.engine, "Starting session server");

    let store = GameStore::new(cli.db_path.clone())?;
    store.run_migrations()?;

    let strategy: Arc<dyn StrategyEngine> = if cli.no_engine {
        info!("Running without a strategy engine");
        Arc::new(NullEngine)
    } else {
        Arc::new(UciEngine::spawn(&cli.engine).await)
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let notifier = Arc::new(ChannelNotifier::new(tx));

    // Outbound writer: drains notification lines to stdout.
    tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
                || stdout.flush().await.is_err()
            {
                warn!("Stdout closed, stopping outbound writer");
                return;
            }
        }
    });

    let config = ControllerConfig {
        think_delay_ms: (cli.think_delay_min_ms, cli.think_delay_max_ms),
    };
    let controller = SessionController::new(strategy, store, notifier, config);

    let clock = ClockService::new(
        controller.clone(),
        ClockConfig {
            pause_while_thinking: cli.pause_clock_while_thinking,
        },
    );
    tokio::spawn(clock.run());

    let dispatcher = CommandDispatcher::new(controller);

    info!("Ready, reading commands from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        dispatcher.dispatch(&line).await;
    }

    info!("Input channel closed, shutting down");
    Ok(())
}
