// HTTP API routes
//
// This module contains all HTTP route handlers for the public API.
// Login lives in `auth`; article publishing and reads live here.

pub mod articles;
pub mod common;

// Re-export common types
pub use common::{ErrorResponse, OperationError, OperationResponse};
