pub mod builder;
pub mod handler;
pub mod listener;
pub mod metrics;

pub use builder::ServerBuilder;
pub use handler::RequestHandler;
pub use metrics::MetricsHandler;
