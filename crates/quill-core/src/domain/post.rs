use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tags::TagInput;
use crate::error::DomainError;

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Reading speed used for `read_time`.
pub const WORDS_PER_MINUTE: usize = 200;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// Post entity - represents a blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// First publication time. Kept when the post goes back to draft.
    pub published_at: Option<DateTime<Utc>>,
    /// Estimated reading time in minutes.
    pub read_time: u32,
}

impl Post {
    /// Create a new post owned by `owner_id`.
    pub fn new(
        owner_id: Uuid,
        title: String,
        content: String,
        tags: Vec<String>,
        status: PostStatus,
        now: DateTime<Utc>,
    ) -> Self {
        let read_time = read_time(&content);
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title,
            content,
            tags,
            status,
            created_at: now,
            updated_at: now,
            published_at: (status == PostStatus::Published).then_some(now),
            read_time,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Whether `viewer` may read this post. Drafts are private to the owner.
    pub fn is_visible_to(&self, viewer: Option<Uuid>) -> bool {
        self.is_published() || viewer.is_some_and(|id| self.is_owned_by(id))
    }

    /// Apply a partial mutation. Every store implementation goes through
    /// here so the timestamp and read-time rules stay in one place.
    pub fn apply_changes(&mut self, changes: PostChanges, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(content) = changes.content {
            self.read_time = read_time(&content);
            self.content = content;
        }
        if let Some(tags) = changes.tags {
            self.tags = tags;
        }
        if let Some(status) = changes.status {
            self.status = status;
            if status == PostStatus::Published && self.published_at.is_none() {
                self.published_at = Some(now);
            }
        }
        self.updated_at = now;
    }
}

/// Minutes needed to read `content`, rounded up.
pub fn read_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

/// Validated, normalized field updates handed to the post store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
}

impl PostChanges {
    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Full set of fields required to create a post.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub tags: TagInput,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>, tags: TagInput) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags,
        }
    }

    /// Validate and normalize into store-ready changes (title, content and tags all set).
    pub fn validate(self) -> Result<PostChanges, DomainError> {
        Ok(PostChanges {
            title: Some(validate_title(&self.title)?),
            content: Some(validate_content(self.content)?),
            tags: Some(self.tags.normalize()),
            status: None,
        })
    }
}

/// Partial field update; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PostFields {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<TagInput>,
}

impl PostFields {
    pub fn validate(self) -> Result<PostChanges, DomainError> {
        Ok(PostChanges {
            title: self.title.as_deref().map(validate_title).transpose()?,
            content: self.content.map(validate_content).transpose()?,
            tags: self.tags.map(|tags| tags.normalize()),
            status: None,
        })
    }
}

impl From<PostDraft> for PostFields {
    fn from(draft: PostDraft) -> Self {
        Self {
            title: Some(draft.title),
            content: Some(draft.content),
            tags: Some(draft.tags),
        }
    }
}

/// Returns the trimmed title.
pub fn validate_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("Title is required"));
    }
    let length = title.chars().count();
    if length > MAX_TITLE_LENGTH {
        return Err(DomainError::validation(format!(
            "Title cannot be more than {MAX_TITLE_LENGTH} characters ({length} given)"
        )));
    }
    Ok(title.to_string())
}

/// Content must contain something other than whitespace; it is stored as given.
pub fn validate_content(content: String) -> Result<String, DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::validation("Content is required"));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use rstest::rstest;

    fn draft_post(now: DateTime<Utc>) -> Post {
        Post::new(
            Uuid::new_v4(),
            "Hello".to_string(),
            "World".to_string(),
            vec!["tech".to_string()],
            PostStatus::Draft,
            now,
        )
    }

    #[rstest]
    #[case("World", 1)]
    #[case("", 0)]
    #[case("   ", 0)]
    fn read_time_rounds_up(#[case] content: &str, #[case] expected: u32) {
        assert_eq!(read_time(content), expected);
    }

    #[rstest]
    fn read_time_counts_words_per_two_hundred() {
        let exactly = vec!["word"; 200].join(" ");
        let over = vec!["word"; 201].join("\n");

        assert_eq!(read_time(&exactly), 1);
        assert_eq!(read_time(&over), 2);
    }

    #[rstest]
    #[case("draft", PostStatus::Draft)]
    #[case(" Published ", PostStatus::Published)]
    #[case("PUBLISHED", PostStatus::Published)]
    fn status_parses_case_insensitively(#[case] raw: &str, #[case] expected: PostStatus) {
        assert_eq!(raw.parse::<PostStatus>().unwrap(), expected);
    }

    #[rstest]
    #[case("archived")]
    #[case("")]
    fn unknown_status_is_rejected(#[case] raw: &str) {
        assert!(matches!(
            raw.parse::<PostStatus>(),
            Err(DomainError::InvalidStatus(_))
        ));
    }

    #[rstest]
    fn new_published_post_sets_published_at() {
        let now = Utc::now();
        let post = Post::new(
            Uuid::new_v4(),
            "t".to_string(),
            "c".to_string(),
            vec![],
            PostStatus::Published,
            now,
        );

        assert_eq!(post.published_at, Some(now));
        assert_eq!(draft_post(now).published_at, None);
    }

    #[rstest]
    fn apply_changes_keeps_first_publication_time() {
        let t0 = Utc::now();
        let mut post = draft_post(t0);

        let t1 = t0 + TimeDelta::seconds(10);
        post.apply_changes(PostChanges::default().with_status(PostStatus::Published), t1);
        assert_eq!(post.published_at, Some(t1));

        let t2 = t1 + TimeDelta::seconds(10);
        post.apply_changes(PostChanges::default().with_status(PostStatus::Draft), t2);
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.published_at, Some(t1));

        let t3 = t2 + TimeDelta::seconds(10);
        post.apply_changes(PostChanges::default().with_status(PostStatus::Published), t3);
        assert_eq!(post.published_at, Some(t1));
        assert_eq!(post.updated_at, t3);
    }

    #[rstest]
    fn apply_changes_recomputes_read_time() {
        let now = Utc::now();
        let mut post = draft_post(now);
        let long = vec!["word"; 450].join(" ");

        post.apply_changes(
            PostChanges {
                content: Some(long),
                ..Default::default()
            },
            now,
        );

        assert_eq!(post.read_time, 3);
        assert_eq!(post.title, "Hello");
    }

    #[rstest]
    fn drafts_are_only_visible_to_their_owner() {
        let post = draft_post(Utc::now());

        assert!(post.is_visible_to(Some(post.owner_id)));
        assert!(!post.is_visible_to(Some(Uuid::new_v4())));
        assert!(!post.is_visible_to(None));
    }

    #[rstest]
    #[case("", "content")]
    #[case("   ", "content")]
    #[case("title", "")]
    #[case("title", " \n ")]
    fn draft_requires_title_and_content(#[case] title: &str, #[case] content: &str) {
        let draft = PostDraft::new(title, content, TagInput::default());
        assert!(matches!(draft.validate(), Err(DomainError::Validation(_))));
    }

    #[rstest]
    fn draft_validation_trims_title_and_normalizes_tags() {
        let changes = PostDraft::new("  Hello  ", "World", TagInput::from("a, ,b"))
            .validate()
            .unwrap();

        assert_eq!(changes.title.as_deref(), Some("Hello"));
        assert_eq!(changes.content.as_deref(), Some("World"));
        assert_eq!(changes.tags, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[rstest]
    fn overlong_title_is_rejected() {
        let title = "x".repeat(MAX_TITLE_LENGTH + 1);
        assert!(validate_title(&title).is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LENGTH)).is_ok());
    }

    #[rstest]
    fn partial_fields_only_validate_present_values() {
        let changes = PostFields {
            tags: Some(TagInput::from("x")),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(changes.title, None);
        assert_eq!(changes.content, None);
        assert_eq!(changes.tags, Some(vec!["x".to_string()]));

        let empty_title = PostFields {
            title: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(empty_title.validate().is_err());
    }
}
