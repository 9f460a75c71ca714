pub mod memory;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::types::BoardAttribute;

/// A validation failure reported by the host for content it rejected or dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub node_type: String,
    pub message: String,
}

/// Notifications the host delivers to a board instance.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The attribute has a new value, whatever its origin (own write echo,
    /// history replay, another code path).
    AttributeChanged(Option<Value>),
    ValidationFailure(ValidationFailure),
}

/// The host document owning the board node's attribute.
///
/// Implementations: `MemoryHost` (in-process), editor bridges in embedding apps.
pub trait HostDocument {
    /// Current stored value, possibly absent or malformed.
    fn get_attribute(&self) -> Option<Value>;

    /// Replace the stored value. The host records the change in its own history.
    fn set_attribute(&mut self, value: BoardAttribute);

    /// Subscribe to attribute changes and validation failures.
    fn subscribe(&self) -> broadcast::Receiver<HostEvent>;
}
