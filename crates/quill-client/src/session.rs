/// Where the API lives and who is calling it.
///
/// Passed explicitly to [`crate::PostsClient`]; nothing is read from global state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub base_url: String,
    pub token: Option<String>,
}

impl Session {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn sign_out(&mut self) {
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Absolute URL of an API path such as `/posts/tags`.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/api/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
