//! # warema-bridge-adapter-mqtt
//!
//! MQTT adapter — connects the bridge to a broker via `rumqttc`.
//!
//! ## Responsibilities
//! - Connect with an `offline` last will on `warema/bridge/state`
//! - On every (re)connect: subscribe to the command topics and announce
//!   `online`
//! - Implement [`MessagePublisher`] for the application core
//! - Forward inbound publishes to the bridge loop
//! - Publish `offline` and disconnect on shutdown
//!
//! Publishing never blocks the caller and never drops a message: the core
//! hands messages to an unbounded outbox, and a forwarding task feeds them
//! into the client's bounded request queue at the pace the connection drains
//! it. Reconnection is left to the `rumqttc` event loop: errors are logged
//! and polling resumes after a short pause.
//!
//! ## Dependency rule
//! Same as other adapters: depends on `warema-bridge-app` and
//! `warema-bridge-domain`.

pub mod config;
pub mod error;

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Outgoing, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use warema_bridge_app::ports::MessagePublisher;
use warema_bridge_domain::error::BridgeError;
use warema_bridge_domain::topic;

pub use config::MqttConfig;
pub use error::MqttError;

/// Pause before polling again after a connection error.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// How long shutdown waits for queued messages and the disconnect to go out.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A message received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub topic: String,
    pub payload: String,
}

/// Work for the forwarding task, in order.
#[derive(Debug)]
enum Request {
    Publish {
        topic: String,
        payload: String,
        retain: bool,
    },
    Disconnect,
}

/// Publishes on behalf of the application core.
///
/// Publishing only enqueues the message; the forwarding task delivers it.
#[derive(Debug, Clone)]
pub struct MqttPublisher {
    outbox: mpsc::UnboundedSender<Request>,
}

impl MqttPublisher {
    fn enqueue(&self, request: Request) -> Result<(), MqttError> {
        self.outbox.send(request).map_err(|_| MqttError::Closed)
    }
}

impl MessagePublisher for MqttPublisher {
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), BridgeError> {
        if topic.is_empty() || topic.contains(['+', '#']) {
            return Err(MqttError::InvalidTopic(topic.to_string()).into_domain());
        }
        self.enqueue(Request::Publish {
            topic: topic.to_string(),
            payload: payload.to_string(),
            retain,
        })
        .map_err(MqttError::into_domain)
    }
}

/// A running broker connection.
pub struct MqttConnection {
    publisher: MqttPublisher,
    forwarder: JoinHandle<()>,
    task: JoinHandle<()>,
}

impl MqttConnection {
    /// Start the connection and forwarding tasks.
    ///
    /// Returns the connection and the receiver inbound messages arrive on.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidServer`] when the server URL is invalid.
    pub fn start(config: &MqttConfig) -> Result<(Self, mpsc::UnboundedReceiver<Received>), MqttError> {
        let options = config.options()?;
        let (host, port) = options.broker_address();
        let (client, eventloop) = AsyncClient::new(options, config.queue_capacity);
        let (tx, rx) = mpsc::unbounded_channel();
        let (outbox, requests) = mpsc::unbounded_channel();

        tracing::info!(%host, port, "connecting to MQTT broker");
        let task = tokio::spawn(run(client.clone(), eventloop, tx));
        let forwarder = tokio::spawn(forward(client, requests));

        let connection = Self {
            publisher: MqttPublisher { outbox },
            forwarder,
            task,
        };
        Ok((connection, rx))
    }

    /// The publisher handle for the application core.
    #[must_use]
    pub fn publisher(&self) -> MqttPublisher {
        self.publisher.clone()
    }

    /// Announce `offline` after everything already queued, disconnect and
    /// stop both tasks.
    pub async fn shutdown(mut self) {
        let queued = self
            .publisher
            .enqueue(Request::Publish {
                topic: topic::BRIDGE_STATE.to_string(),
                payload: topic::OFFLINE.to_string(),
                retain: true,
            })
            .and_then(|()| self.publisher.enqueue(Request::Disconnect));
        if let Err(err) = queued {
            tracing::warn!(%err, "failed to announce offline");
        }

        let (forwarder, task) = (&mut self.forwarder, &mut self.task);
        // Both tasks only end on their own once the disconnect went out.
        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async move {
            let _ = forwarder.await;
            let _ = task.await;
        })
        .await;
        if drained.is_err() {
            tracing::warn!("MQTT connection did not close in time");
            self.forwarder.abort();
            self.task.abort();
        }
    }
}

/// Feed queued requests into the client, waiting for room in its bounded
/// request queue.
async fn forward(client: AsyncClient, mut requests: mpsc::UnboundedReceiver<Request>) {
    while let Some(request) = requests.recv().await {
        match request {
            Request::Publish {
                topic,
                payload,
                retain,
            } => {
                if let Err(err) = client
                    .publish(&topic, QoS::AtLeastOnce, retain, payload.into_bytes())
                    .await
                {
                    tracing::warn!(%err, topic, "failed to publish");
                }
            }
            Request::Disconnect => {
                if let Err(err) = client.disconnect().await {
                    tracing::warn!(%err, "failed to request disconnect");
                }
                break;
            }
        }
    }
}

async fn run(client: AsyncClient, mut eventloop: EventLoop, tx: mpsc::UnboundedSender<Received>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("connected to MQTT broker");
                on_connected(&client);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let received = Received {
                    topic: publish.topic,
                    payload: String::from_utf8_lossy(&publish.payload).into_owned(),
                };
                tracing::debug!(topic = %received.topic, payload = %received.payload, "received message");
                if tx.send(received).is_err() {
                    tracing::debug!("bridge loop gone, closing MQTT connection");
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::warn!("disconnected by MQTT broker");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::info!("disconnected from MQTT broker");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!(%err, "MQTT connection error");
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

/// Subscribe and announce `online`. The broker may have dropped the session,
/// so this runs on every ConnAck.
fn on_connected(client: &AsyncClient) {
    for filter in topic::SUBSCRIPTIONS {
        if let Err(err) = client.try_subscribe(filter, QoS::AtLeastOnce) {
            tracing::error!(%err, filter, "failed to subscribe");
        }
    }
    if let Err(err) = client.try_publish(
        topic::BRIDGE_STATE,
        QoS::AtLeastOnce,
        true,
        topic::ONLINE.as_bytes().to_vec(),
    ) {
        tracing::warn!(%err, "failed to announce online");
    }
}
