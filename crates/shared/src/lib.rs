pub mod config;
pub mod telemetry;
pub mod tracing;

pub use config::*;
pub use self::tracing::init_tracing;
