use crate::{Credential, ModelError, SearchFilter, TaskId};

/// One bulk-deletion job with a fixed filter.
///
/// A task is immutable once built: the queue owns its mutable progress separately,
/// so the filter can never change after enqueue.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    account: String,
    description: String,
    credential: Credential,
    filter: SearchFilter,
}

impl Task {
    /// Build a task, validating the credential and the filter.
    pub fn new(
        account: impl Into<String>,
        credential: Credential,
        filter: SearchFilter,
    ) -> Result<Self, ModelError> {
        if credential.is_empty() {
            return Err(ModelError::InvalidTask("credential is empty".to_string()));
        }
        if !credential.is_header_safe() {
            return Err(ModelError::InvalidTask(
                "credential contains characters not allowed in a request header".to_string(),
            ));
        }
        filter.validate()?;

        Ok(Self {
            id: TaskId::generate(),
            account: account.into(),
            description: String::new(),
            credential,
            filter,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }
}
