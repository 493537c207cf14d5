//! # Quill Client
//!
//! - [`Session`] carries the API base URL and the author's bearer credential.
//! - [`PostsClient`] wraps every API endpoint.
//! - [`autosave`] persists in-progress edits without duplicating drafts.

pub mod autosave;
mod client;
mod error;
mod session;

pub use client::PostsClient;
pub use error::ClientError;
pub use session::Session;
