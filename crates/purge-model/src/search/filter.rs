use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Cursor, ModelError, Snowflake, is_snowflake};

/// Whether the search runs over one channel (DMs included) or a whole guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterScope {
    Channel,
    Guild,
}

impl FilterScope {
    /// Path segment used by the search endpoint.
    pub fn path_segment(&self) -> &'static str {
        match self {
            FilterScope::Channel => "channels",
            FilterScope::Guild => "guilds",
        }
    }
}

impl FromStr for FilterScope {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "channel" | "dm" => Ok(FilterScope::Channel),
            "guild" => Ok(FilterScope::Guild),
            _ => Err(ModelError::InvalidFilter(format!(
                "unknown scope {s:?} (expected: channel|guild)"
            ))),
        }
    }
}

/// Attachment/content kind accepted by the `has` search parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HasFilter {
    Link,
    Embed,
    File,
    Video,
    Image,
    Sound,
}

impl HasFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            HasFilter::Link => "link",
            HasFilter::Embed => "embed",
            HasFilter::File => "file",
            HasFilter::Video => "video",
            HasFilter::Image => "image",
            HasFilter::Sound => "sound",
        }
    }
}

impl FromStr for HasFilter {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "link" => Ok(HasFilter::Link),
            "embed" => Ok(HasFilter::Embed),
            "file" => Ok(HasFilter::File),
            "video" => Ok(HasFilter::Video),
            "image" => Ok(HasFilter::Image),
            "sound" => Ok(HasFilter::Sound),
            _ => Err(ModelError::InvalidFilter(format!(
                "unknown has filter {s:?} (expected: link|embed|file|video|image|sound)"
            ))),
        }
    }
}

/// Traversal direction of the search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl FromStr for SortOrder {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" | "desc" => Ok(SortOrder::Newest),
            "oldest" | "asc" => Ok(SortOrder::Oldest),
            _ => Err(ModelError::InvalidFilter(format!(
                "unknown sort order {s:?} (expected: newest|oldest)"
            ))),
        }
    }
}

/// Search constraints of a task.
///
/// `scope` and `target_id` are required; every optional field narrows the match set further
/// (all constraints are AND-combined by the server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    pub scope: FilterScope,
    pub target_id: Snowflake,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has: Option<HasFilter>,
    /// Restrict a guild search to one channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_id: Option<Snowflake>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl SearchFilter {
    pub fn new(scope: FilterScope, target_id: impl Into<Snowflake>) -> Self {
        Self {
            scope,
            target_id: target_id.into(),
            author_id: None,
            content: None,
            has: None,
            channel_id: None,
            mentions: None,
            min_id: None,
            max_id: None,
            sort: SortOrder::default(),
        }
    }

    pub fn with_author(mut self, author_id: impl Into<Snowflake>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_has(mut self, has: HasFilter) -> Self {
        self.has = Some(has);
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<Snowflake>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn with_mentions(mut self, user_id: impl Into<Snowflake>) -> Self {
        self.mentions = Some(user_id.into());
        self
    }

    pub fn with_min_id(mut self, id: impl Into<Snowflake>) -> Self {
        self.min_id = Some(id.into());
        self
    }

    pub fn with_max_id(mut self, id: impl Into<Snowflake>) -> Self {
        self.max_id = Some(id.into());
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Check the filter can be turned into a well-formed search request.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !is_snowflake(&self.target_id) {
            return Err(ModelError::InvalidFilter(format!(
                "target id {:?} is not a snowflake",
                self.target_id
            )));
        }

        let ids = [
            ("author_id", &self.author_id),
            ("channel_id", &self.channel_id),
            ("mentions", &self.mentions),
            ("min_id", &self.min_id),
            ("max_id", &self.max_id),
        ];
        for (name, value) in ids {
            if let Some(id) = value
                && !is_snowflake(id)
            {
                return Err(ModelError::InvalidFilter(format!(
                    "{name} {id:?} is not a snowflake"
                )));
            }
        }

        if let Some(content) = &self.content
            && content.trim().is_empty()
        {
            return Err(ModelError::InvalidFilter("content is blank".to_string()));
        }

        Ok(())
    }

    /// Effective filter for the next page.
    ///
    /// The cursor is the lower bound (`min_id`) when walking oldest-first and the upper
    /// bound (`max_id`) otherwise. An unset cursor leaves the filter's own bounds untouched.
    pub fn with_cursor(&self, cursor: &Cursor) -> SearchFilter {
        let mut effective = self.clone();
        if let Some(id) = cursor.get() {
            match self.sort {
                SortOrder::Oldest => effective.min_id = Some(id.to_string()),
                SortOrder::Newest => effective.max_id = Some(id.to_string()),
            }
        }
        effective
    }
}
