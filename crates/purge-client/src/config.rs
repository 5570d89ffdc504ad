/// Base URL of the platform API.
pub const DEFAULT_ENDPOINT: &str = "https://discord.com/api/v9";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base; resource paths are appended as segments.
    pub endpoint: String,
    /// Overrides the HTTP client's default `User-Agent`.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: None,
        }
    }
}

impl ClientConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
