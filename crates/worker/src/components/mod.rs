pub mod dispatcher_client;

pub use dispatcher_client::HttpDispatcherClient;
