use thiserror::Error;

/// Failures that abort a whole page.
///
/// Missing fields and absent features never show up here; they degrade to
/// `None` or an empty list inside the record instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("document has no body content")]
    MissingRoot,

    #[error("host {0:?} cannot form an absolute base url")]
    InvalidHost(String),
}
