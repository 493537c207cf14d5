//! # Quill Core
//!
//! The domain layer of the Quill blogging platform.
//! This crate contains the post lifecycle rules and the ports that
//! infrastructure must implement. It has no infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use error::DomainError;
pub use service::PostService;
