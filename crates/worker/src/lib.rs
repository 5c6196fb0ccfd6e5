//! Worker 循环、图像任务执行器与 HTTP 协调器客户端

pub mod components;
pub mod executors;
pub mod service;

pub use components::HttpDispatcherClient;
pub use executors::{BlurFilterExecutor, LightFilterExecutor};
pub use service::{WorkerService, WorkerServiceBuilder, WorkerState};
