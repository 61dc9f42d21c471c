pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::SchedulingError;
pub use models::*;
pub use services::*;
pub use router::booking_routes;
