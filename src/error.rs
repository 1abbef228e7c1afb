use thiserror::Error;

/// Rejections raised at the boundary before a request reaches the deck manager
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown tier \"{0}\" (expected easy, normal, hard or expert)")]
    UnknownTier(String),

    #[error("unknown language \"{0}\" (expected fr or en)")]
    UnknownLanguage(String),

    #[error("level {0} out of range (1-100)")]
    LevelOutOfRange(i64),

    #[error("count {0} out of range (1-50)")]
    CountOutOfRange(i64),
}

/// Failure of a candidate source query
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("word store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("failed to prepare word store: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the high-score board
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("score store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("failed to prepare score store: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid stored date: {0}")]
    Date(#[from] chrono::ParseError),
}
