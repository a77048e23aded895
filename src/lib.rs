pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod types;

pub use config::Config;
pub use error::{DataError, FieldcheckError};
pub use router::{FieldcheckState, fieldcheck_router};
