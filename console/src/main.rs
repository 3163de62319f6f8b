// MDM console binary entry point

mod command;
mod view;

use anyhow::Result;
use chrono::Utc;
use command::{parse, CommandError, ConsoleCommand, HELP};
use common::bootstrap::{init_backend, init_timezone};
use common::config::Settings;
use common::notify::ChannelNotifier;
use common::orchestrator::Orchestrator;
use common::telemetry::init_logging;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    init_logging(
        &settings.observability.log_level,
        settings.observability.log_format,
    )?;

    info!(
        base_url = %settings.backend.base_url,
        timezone = %settings.schedule.timezone,
        "Starting MDM console"
    );

    let backend = init_backend(&settings).map_err(|e| {
        error!(error = %e, "Failed to initialize backend");
        e
    })?;
    let timezone = init_timezone(&settings)?;

    let (notification_tx, mut notification_rx) = unbounded_channel();
    let notifier = Arc::new(ChannelNotifier::new(notification_tx));
    let mut orchestrator = Orchestrator::new(backend, notifier);
    orchestrator.initial_load();

    println!("MDM configuration console. Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => {
                        debug!("stdin closed");
                        break;
                    }
                };
                match parse(&line) {
                    Ok(ConsoleCommand::Event(event)) => orchestrator.handle_event(event),
                    Ok(ConsoleCommand::Objects) => {
                        println!("{}", view::render_objects(orchestrator.state().available_objects()));
                    }
                    Ok(ConsoleCommand::Show) => {
                        println!("{}", view::render_state(orchestrator.state(), timezone, Utc::now()));
                    }
                    Ok(ConsoleCommand::Help) => println!("{}", HELP),
                    Ok(ConsoleCommand::Quit) => break,
                    Err(CommandError::Empty) => {}
                    Err(e) => println!("{}", e),
                }
            }
            Some(completion) = orchestrator.next_completion() => {
                orchestrator.handle_completion(completion);
            }
            Some(notification) = notification_rx.recv() => {
                println!("{}", view::render_notification(&notification));
            }
        }
    }

    if !orchestrator.is_idle() {
        info!(in_flight = orchestrator.in_flight(), "Waiting for outstanding calls");
        orchestrator.run_until_idle().await;
    }
    while let Ok(notification) = notification_rx.try_recv() {
        println!("{}", view::render_notification(&notification));
    }

    info!("MDM console stopped");
    Ok(())
}
