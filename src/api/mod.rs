//! HTTP API module for the VR engine.
//!
//! This module exposes the benefit run over REST: the client posts the
//! month's tables as JSON and receives the computed run.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{CalculationRequest, TableRequest};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
