//! Replay backend.
//!
//! Reads a recorded run back and serves its readings tick by tick.

mod port;
mod recording;

pub use port::ReplayPort;
pub use recording::Recording;
