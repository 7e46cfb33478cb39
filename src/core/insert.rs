use serde::Serialize;

/// Result of an insert-or-get against a unique key.
///
/// `Existing` is a successful outcome: either the key was already present
/// before the insert, or a concurrent writer won the race and the row was
/// re-fetched after rolling back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "record", rename_all = "lowercase")]
pub enum InsertOutcome<T> {
    Created(T),
    Existing(T),
}

impl<T> InsertOutcome<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }

    /// True when nothing was written because the key already existed
    pub fn is_replay(&self) -> bool {
        matches!(self, InsertOutcome::Existing(_))
    }

    pub fn as_ref(&self) -> &T {
        match self {
            InsertOutcome::Created(value) | InsertOutcome::Existing(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            InsertOutcome::Created(value) | InsertOutcome::Existing(value) => value,
        }
    }
}
