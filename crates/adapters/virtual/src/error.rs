//! Virtual stick error types.

use warema_bridge_domain::error::BridgeError;

/// Errors specific to the virtual stick.
#[derive(Debug, thiserror::Error)]
pub enum VirtualStickError {
    /// The stick was torn down and accepts no more requests.
    #[error("virtual stick is closed")]
    Closed,

    /// Nobody listens to stick events anymore.
    #[error("stick event receiver dropped")]
    ReceiverDropped,
}

impl VirtualStickError {
    /// Convert into a [`BridgeError::Stick`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> BridgeError {
        BridgeError::Stick(Box::new(self))
    }
}

impl From<VirtualStickError> for BridgeError {
    fn from(err: VirtualStickError) -> Self {
        err.into_domain()
    }
}
