//! Pure, deterministic orchestration logic. No I/O, fully testable in
//! isolation; process spawning lives in [`crate::io`].

pub mod args;
pub mod context;
pub mod outcome;
pub mod registry;
pub mod requirements;
pub mod step;
