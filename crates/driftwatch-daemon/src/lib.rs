pub mod daemon;
pub mod error;
pub mod metrics;
pub mod reconciler;
pub mod server;

pub use daemon::Daemon;
pub use error::DaemonError;
