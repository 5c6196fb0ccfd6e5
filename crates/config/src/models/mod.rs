pub mod app_config;
pub mod dispatcher_worker;
pub mod imaging_observability;

pub use app_config::AppConfig;
pub use dispatcher_worker::{DispatcherConfig, WorkerConfig};
pub use imaging_observability::{ImagingConfig, LogFormat, ObservabilityConfig};
