use serde::{Deserialize, Serialize};

use crate::{ModelError, Snowflake};

/// One record inside a match group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHit {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub hit: bool,
}

/// Cluster of records the server returns for one underlying message.
///
/// Besides the matching record the server may include surrounding context records;
/// exactly one of them carries `hit: true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchGroup(pub Vec<MessageHit>);

impl MatchGroup {
    /// The record that actually matched.
    ///
    /// A group without any hit record violates the search contract and is reported as an error
    /// instead of guessing.
    pub fn hit(&self) -> Result<&MessageHit, ModelError> {
        let first = self.0.first().ok_or(ModelError::EmptyGroup)?;
        self.0
            .iter()
            .rev()
            .find(|record| record.hit)
            .ok_or_else(|| ModelError::MissingHit {
                first_id: first.id.clone(),
            })
    }
}

/// Body of a search response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Matches still present on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_results: Option<u64>,
    /// Only present while the index is catching up.
    #[serde(
        default,
        alias = "document_indexed",
        skip_serializing_if = "Option::is_none"
    )]
    pub documents_indexed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<MatchGroup>>,
}

impl SearchPage {
    /// The index has not processed any document for this query yet.
    pub fn is_indexing(&self) -> bool {
        self.documents_indexed == Some(0)
    }

    /// Server-side count of remaining matches, absent counts as zero.
    pub fn total_remaining(&self) -> u64 {
        self.total_results.unwrap_or(0)
    }

    pub fn groups(&self) -> &[MatchGroup] {
        self.messages.as_deref().unwrap_or(&[])
    }

    /// Nothing left to delete for this query.
    pub fn is_exhausted(&self) -> bool {
        self.total_remaining() == 0 || self.groups().is_empty()
    }

    /// Reduce every match group to its hit record, preserving server order.
    pub fn hits(&self) -> Result<Vec<MessageHit>, ModelError> {
        self.groups()
            .iter()
            .map(|group| group.hit().cloned())
            .collect()
    }
}
