//! Embedded kanban board: a board stored as one attribute of a host document
//! node, kept in sync with that attribute.
//!
//! Edits go through [`BoardController`], which persists structural changes
//! immediately and text edits after a quiet period, adopts external changes
//! (undo/redo, other writers) and re-asserts the board when the host rejects
//! it. [`run_session`] drives one controller on a tokio task.

pub mod compare;
pub mod config;
pub mod controller;
pub mod deadline_bus;
pub mod host;
pub mod interaction;
pub mod model;
pub mod persist;
pub mod reconcile;
pub mod recovery;
pub mod session;
pub mod types;

pub use config::{ConfigError, SyncConfig};
pub use controller::BoardController;
pub use deadline_bus::{DeadlineBus, DeadlineSubscription, DeadlineUpdate};
pub use host::memory::MemoryHost;
pub use host::{HostDocument, HostEvent, ValidationFailure};
pub use interaction::{Mutation, TextCommit, TextTarget};
pub use model::{BoardOp, CardField};
pub use persist::CommitKind;
pub use session::{run_session, SessionCommand};
pub use types::{Board, BoardAttribute, Card, Column, Priority};
