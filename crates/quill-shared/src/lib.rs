//! # Quill Shared
//!
//! JSON request and response bodies used by both the API server and the
//! editor client.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
