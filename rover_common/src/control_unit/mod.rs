//! Control-side shared types.
//!
//! Robot configuration sections, controller state enums and the per-tick
//! log record. Shared between the control unit and the replay backend,
//! which reads the records back.

pub mod config;
pub mod record;
pub mod state;
