pub mod dispatcher_channel;
pub mod task_executor;

pub use dispatcher_channel::*;
pub use task_executor::*;
