mod auth_extractor;
mod extract;
mod tracing_layer;
mod metrics_layer;

pub use auth_extractor::*;
pub use extract::*;
pub use tracing_layer::*;
pub use metrics_layer::*;
