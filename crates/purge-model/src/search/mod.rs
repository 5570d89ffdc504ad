mod cursor;
pub use cursor::Cursor;

mod filter;
pub use filter::{FilterScope, HasFilter, SearchFilter, SortOrder};

mod page;
pub use page::{MatchGroup, MessageHit, SearchPage};
