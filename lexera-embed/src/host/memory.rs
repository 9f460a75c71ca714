/// In-process host document.
///
/// Holds the attribute as opaque JSON with:
/// - a bounded undo/redo history of replacements (the host's own history, not the board's)
/// - a broadcast of every change, including the board's own writes
/// - injected validation failures for recovery testing
///
/// Clones share the same document.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::broadcast;

use super::{HostDocument, HostEvent, ValidationFailure};
use crate::types::BoardAttribute;

pub(crate) const EVENT_CAPACITY: usize = 256;
/// Undo steps kept; older ones are forgotten.
pub const HISTORY_LIMIT: usize = 100;
/// Recent `set_attribute` values kept for inspection.
pub const WRITE_LOG_LIMIT: usize = 64;

#[derive(Debug, Default)]
struct Document {
    value: Option<Value>,
    undo: VecDeque<Option<Value>>,
    redo: Vec<Option<Value>>,
    /// Most recent values written through `set_attribute`, oldest first.
    writes: VecDeque<Value>,
    write_count: usize,
    /// Monotonic counter, incremented on every change.
    version: u64,
}

impl Document {
    fn push_undo(&mut self, value: Option<Value>) {
        if self.undo.len() == HISTORY_LIMIT {
            self.undo.pop_front();
        }
        self.undo.push_back(value);
    }

    fn record_write(&mut self, value: Value) {
        if self.writes.len() == WRITE_LOG_LIMIT {
            self.writes.pop_front();
        }
        self.writes.push_back(value);
        self.write_count += 1;
    }
}

#[derive(Clone)]
pub struct MemoryHost {
    doc: Arc<Mutex<Document>>,
    event_tx: broadcast::Sender<HostEvent>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            doc: Arc::new(Mutex::new(Document::default())),
            event_tx,
        }
    }

    /// A host whose node already carries `value` (e.g. a reopened document).
    pub fn with_value(value: Value) -> Self {
        let host = Self::new();
        host.lock().value = Some(value);
        host
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        self.doc.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: HostEvent) {
        if self.event_tx.send(event).is_err() {
            log::debug!("[lexera.embed.host] No subscribers for host event");
        }
    }

    fn replace(&self, value: Option<Value>) {
        {
            let mut doc = self.lock();
            let previous = std::mem::replace(&mut doc.value, value.clone());
            doc.push_undo(previous);
            doc.redo.clear();
            doc.version += 1;
        }
        self.emit(HostEvent::AttributeChanged(value));
    }

    /// Another code path (collaborator, paste, migration) replaces the value.
    pub fn replace_external(&self, value: Option<Value>) {
        self.replace(value);
    }

    /// Step back in the host history. Returns false when there is nothing to undo.
    pub fn undo(&self) -> bool {
        let value = {
            let mut doc = self.lock();
            let Some(previous) = doc.undo.pop_back() else {
                return false;
            };
            let current = std::mem::replace(&mut doc.value, previous.clone());
            doc.redo.push(current);
            doc.version += 1;
            previous
        };
        self.emit(HostEvent::AttributeChanged(value));
        true
    }

    pub fn redo(&self) -> bool {
        let value = {
            let mut doc = self.lock();
            let Some(next) = doc.redo.pop() else {
                return false;
            };
            let current = std::mem::replace(&mut doc.value, next.clone());
            doc.push_undo(current);
            doc.version += 1;
            next
        };
        self.emit(HostEvent::AttributeChanged(value));
        true
    }

    /// Report that the host rejected content of `node_type`.
    pub fn report_validation_failure(&self, node_type: &str, message: &str) {
        self.emit(HostEvent::ValidationFailure(ValidationFailure {
            node_type: node_type.to_string(),
            message: message.to_string(),
        }));
    }

    /// The most recent writes, oldest first (at most `WRITE_LOG_LIMIT`).
    pub fn writes(&self) -> Vec<Value> {
        self.lock().writes.iter().cloned().collect()
    }

    /// Total number of `set_attribute` calls.
    pub fn write_count(&self) -> usize {
        self.lock().write_count
    }

    pub fn last_write(&self) -> Option<Value> {
        self.lock().writes.back().cloned()
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }
}

impl HostDocument for MemoryHost {
    fn get_attribute(&self) -> Option<Value> {
        self.lock().value.clone()
    }

    fn set_attribute(&mut self, value: BoardAttribute) {
        let value = value.to_value();
        self.lock().record_write(value.clone());
        self.replace(Some(value));
    }

    fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.event_tx.subscribe()
    }
}
