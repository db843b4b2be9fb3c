pub mod handler;

pub use handler::{HealthResponse, create_health_router};
