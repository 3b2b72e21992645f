//! Publishing helpers shared by the core components.
//!
//! Transport failures are logged and swallowed here: nothing the core
//! publishes is worth stopping the bridge for.

use warema_bridge_domain::id::SerialNumber;
use warema_bridge_domain::topic;

use crate::ports::MessagePublisher;

pub(crate) fn emit(publisher: &impl MessagePublisher, topic: &str, payload: &str, retain: bool) {
    if let Err(err) = publisher.publish(topic, payload, retain) {
        tracing::warn!(%err, topic, "failed to publish");
    }
}

pub(crate) fn availability(publisher: &impl MessagePublisher, snr: &SerialNumber, online: bool) {
    let payload = if online { topic::ONLINE } else { topic::OFFLINE };
    emit(publisher, &topic::availability(snr), payload, true);
}
