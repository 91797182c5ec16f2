//! Monitor a worker's PyON status stream from the command line.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

use std::time::Duration;

use clap::Parser;
use pyon_client::Client;
use pyon_client::messages::{Heartbeat, Info, Options, Slot, SlotCollection, Unit, UnitCollection};
use pyon_connection::{ConnectionConfig, ConnectionEvent};
use pyon_transport_tcp::TcpTransport;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Typed client error
    #[error(transparent)]
    Client(#[from] pyon_client::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Worker host
    #[arg(long, default_value = "127.0.0.1", env = "PYON_HOST")]
    host: String,

    /// Worker command port
    #[arg(long, default_value_t = 36330, env = "PYON_PORT")]
    port: u16,

    /// Password sent with `auth` after connecting
    #[arg(long, env = "PYON_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Connect timeout in milliseconds
    #[arg(long, default_value_t = 5000, env = "PYON_CONNECT_TIMEOUT_MS")]
    connect_timeout_ms: u64,

    /// Receive loop interval in milliseconds
    #[arg(long, default_value_t = 10, env = "PYON_RECEIVE_INTERVAL_MS")]
    receive_interval_ms: u64,

    /// Extra command to send after connecting (repeatable)
    #[arg(long = "command")]
    commands: Vec<String>,

    /// Do not subscribe to the standard update streams
    #[arg(long)]
    no_updates: bool,

    /// Print a summary of each updated message
    #[arg(long)]
    print_values: bool,
}

impl Args {
    fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::default()
            .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .with_receive_interval(Duration::from_millis(self.receive_interval_ms))
    }
}

/// One-line summary of the typed message behind `type_name`
fn describe(client: &Client, type_name: &str) -> Result<Option<String>, Error> {
    let summary = match type_name {
        "Heartbeat" => client
            .get_message::<Heartbeat>()?
            .map(|heartbeat| format!("heartbeat {}", heartbeat.value)),
        "Info" => client.get_message::<Info>()?.map(|info| {
            let os = info.get("System", "OS").unwrap_or("unknown OS");
            format!("{} info sections, {os}", info.sections.len())
        }),
        "Options" => client
            .get_message::<Options>()?
            .map(|options| format!("{} options", options.values.len())),
        "SlotCollection" => client
            .get_message_collection::<SlotCollection, Slot>()?
            .map(|slots| {
                slots
                    .slots
                    .iter()
                    .map(|slot| format!("{} {} {}", slot.id, slot.status, slot.description))
                    .collect::<Vec<_>>()
                    .join("; ")
            }),
        "UnitCollection" => client
            .get_message_collection::<UnitCollection, Unit>()?
            .map(|units| {
                units
                    .units
                    .iter()
                    .map(|unit| {
                        format!(
                            "{} p{} r{} c{} g{} {} {}",
                            unit.id,
                            unit.project,
                            unit.run,
                            unit.clone,
                            unit.generation,
                            unit.state,
                            unit.percent_done
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("; ")
            }),
        _ => None,
    };

    Ok(summary)
}

async fn monitor(
    client: &Client,
    events: &mut broadcast::Receiver<ConnectionEvent>,
    shutdown_token: &CancellationToken,
    print_values: bool,
) {
    loop {
        let event = tokio::select! {
            () = shutdown_token.cancelled() => break,
            event = events.recv() => event,
        };

        match event {
            Ok(ConnectionEvent::MessageUpdated { key, type_name }) => {
                info!("Message '{}' updated", key);
                if !print_values {
                    continue;
                }

                let summary = match type_name {
                    Some(type_name) => describe(client, type_name),
                    None => Ok(None),
                };
                match summary {
                    Ok(Some(summary)) => println!("{key}: {summary}"),
                    Ok(None) => {
                        if let Some(message) = client.connection().get_message(&key) {
                            println!("{key}: {}", message.value());
                        }
                    }
                    Err(e) => warn!("Failed to read '{}': {}", key, e),
                }
            }
            Ok(ConnectionEvent::ConnectedChanged(false)) => {
                warn!("Disconnected from worker");
                break;
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!("Monitor fell behind, {} events dropped", missed);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let client = Client::new(TcpTransport::new(), args.connection_config());
    let mut events = client.subscribe();

    client
        .connect(&args.host, args.port, args.password.as_deref())
        .await?;

    if !args.no_updates {
        client.request_standard_updates().await?;
    }
    for command in &args.commands {
        client.send_command(command).await?;
    }

    let shutdown_token = CancellationToken::new();

    let signal_shutdown_token = shutdown_token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for interrupt: {}", e);
            return;
        }
        info!("Received interrupt signal");
        signal_shutdown_token.cancel();
    });

    monitor(&client, &mut events, &shutdown_token, args.print_values).await;

    info!("Shutting down");
    client.close().await;

    Ok(())
}
