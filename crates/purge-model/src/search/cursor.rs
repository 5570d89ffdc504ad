use crate::Snowflake;

/// Pagination boundary: the id of the last message successfully processed.
///
/// Which query bound it feeds (`min_id` or `max_id`) depends on the sort order and is
/// decided by [`SearchFilter::with_cursor`](crate::SearchFilter::with_cursor).
/// The cursor starts unset, meaning "start from the extreme of the sort direction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    last: Option<Snowflake>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&str> {
        self.last.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.last.is_some()
    }

    pub fn advance(&mut self, id: impl Into<Snowflake>) {
        self.last = Some(id.into());
    }
}
