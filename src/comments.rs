//! Comment threads.

use crate::error::{Error, Result};
use crate::model::Comment;
use crate::store::Record;

/// Comment texts in store order. Entries without string text are dropped;
/// the store's ordering is never changed.
pub fn project_comments(raw: &[Record]) -> Vec<String> {
    raw.iter()
        .filter_map(Comment::from_record)
        .map(|comment| comment.text)
        .collect()
}

/// Validate a comment before posting; blank text is rejected.
pub fn validate_comment(text: &str) -> Result<&str> {
    if text.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "comment text cannot be empty".to_string(),
        ));
    }
    Ok(text)
}
