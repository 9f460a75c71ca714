//! Board entity model: seed data, pure mutations, statistics and the
//! validating parse of stored attribute values.

pub mod identity;
pub mod ops;
pub mod seed;
pub mod shape;
pub mod stats;

pub use ops::{check_invariants, BoardOp, CardField, InvariantViolation};
pub use seed::seed_board;
pub use shape::{load_board, LoadSource, LoadedBoard, ShapeError};
pub use stats::BoardStats;
