//! # warema-bridged — WMS to MQTT bridge daemon
//!
//! Composition root that wires the stick, the broker connection and the
//! bridge core together and runs the event loop.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialise logging
//! - Open the stick and wait for it to finish initialising
//! - Connect to the broker
//! - Feed stick events, broker messages and timer ticks to the router
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! When the stick has not joined a network yet (PAN id `FFFF`) the daemon
//! runs network discovery instead: no broker connection, stick events are
//! logged until the process is stopped.
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no bridge logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use warema_bridge_adapter_mqtt::MqttConnection;
use warema_bridge_adapter_virtual::VirtualStick;
use warema_bridge_app::ports::StickPort;
use warema_bridge_app::reconciliation::ReconciliationController;
use warema_bridge_app::router::{Dispatch, EventRouter};
use warema_bridge_app::supervisor::{Supervisor, Tick};
use warema_bridge_domain::event::{StickMessage, wire};
use warema_bridge_domain::time;

use crate::config::Config;

/// Delay between a wake-up wave and the position request that follows it.
const FOLLOW_UP_DELAY: Duration = Duration::from_secs(1);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let filter = EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {:?}: {err}", config.logging.filter);
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        serial_port = %config.stick.serial_port,
        channel = config.stick.channel,
        pan_id = %config.stick.pan_id,
        "opening stick"
    );
    let (stick, stick_rx) = VirtualStick::new(&config.network);
    let stick = Arc::new(stick);
    stick.init()?;

    if config.stick.is_discovery_mode() {
        run_discovery(&stick, stick_rx).await;
        stick.teardown();
    } else {
        run_bridge(&config, &stick, stick_rx).await?;
    }

    tracing::info!("bye");
    Ok(())
}

/// Log whatever the stick finds until the process is stopped.
async fn run_discovery(stick: &VirtualStick, mut stick_rx: mpsc::UnboundedReceiver<StickMessage>) {
    tracing::warn!("no network configured, running network discovery");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(message) = stick_rx.recv() => {
                tracing::info!(event = %message.topic, payload = %message.payload, "discovery");
                if message.topic == wire::INIT_COMPLETION
                    && let Err(err) = stick.scan(ReconciliationController::SCAN)
                {
                    tracing::error!(%err, "failed to request scan");
                }
            }
            reason = &mut shutdown => {
                tracing::info!(reason, "stopping discovery");
                break;
            }
        }
    }
}

async fn run_bridge(
    config: &Config,
    stick: &Arc<VirtualStick>,
    mut stick_rx: mpsc::UnboundedReceiver<StickMessage>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mqtt, mut mqtt_rx) = MqttConnection::start(&config.mqtt)?;
    let mut router = EventRouter::new(config.bridge.clone(), Arc::clone(stick), mqtt.publisher());
    let (mut supervisor, mut tick_rx) = Supervisor::new();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(message) = stick_rx.recv() => {
                if router.handle_stick_message(&message, time::now()) == Dispatch::Initialized {
                    supervisor.start(config.bridge.schedule());
                }
            }
            Some(received) = mqtt_rx.recv() => {
                router.handle_mqtt_message(&received.topic, &received.payload, time::now());
            }
            Some(tick) = tick_rx.recv() => match tick {
                Tick::AvailabilityCheck => {
                    router.on_availability_tick(time::now());
                }
                Tick::WakeUp => {
                    let probed = router.on_wake_up_tick();
                    supervisor.schedule_position_probe(probed, FOLLOW_UP_DELAY);
                }
                Tick::Rescan => {
                    router.on_rescan_tick();
                }
                Tick::PositionProbe(probed) => router.on_position_probe(&probed),
            },
            reason = &mut shutdown => {
                tracing::info!(reason, "shutting down");
                break;
            }
        }
    }

    supervisor.shutdown();
    stick.teardown();
    mqtt.shutdown().await;
    Ok(())
}

/// Resolves with the name of the signal that asked us to stop.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    }
}
