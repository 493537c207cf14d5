//! Domain entities - the core business objects.

mod post;
mod tags;
mod user;

pub use post::{
    MAX_TITLE_LENGTH, Post, PostChanges, PostDraft, PostFields, PostStatus, WORDS_PER_MINUTE,
    read_time, validate_content, validate_title,
};
pub use tags::{TagInput, normalize_tags};
pub use user::{User, normalize_email};
