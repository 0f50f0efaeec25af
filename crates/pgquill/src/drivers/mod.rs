//! Bundled driver implementations.

mod postgres;
mod recording;

pub use postgres::PgDriver;
pub use recording::{RecordedCall, RecordingDriver};
