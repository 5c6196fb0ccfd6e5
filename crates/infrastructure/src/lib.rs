pub mod in_memory_channel;

pub use in_memory_channel::{coordinator_channel, InMemoryDispatcherChannel, DEFAULT_CHANNEL_CAPACITY};
