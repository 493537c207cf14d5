//! Application services built on the domain entities and ports.

mod posts;

pub use posts::PostService;
