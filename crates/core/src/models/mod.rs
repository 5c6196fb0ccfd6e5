//! # 数据模型
//!
//! 协调器与 worker 之间共享的数据结构：任务、worker 标识、统计三元组、
//! 分发协议消息以及最终报告。所有模型都实现了序列化，既用于进程内通道
//! 也用于 HTTP 传输。

pub mod message;
pub mod progress;
pub mod report;
pub mod statistics;
pub mod task;

pub use message::*;
pub use progress::*;
pub use report::*;
pub use statistics::*;
pub use task::*;
