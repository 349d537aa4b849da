use thiserror::Error;

/// Errors surfaced to the reader. None of these are fatal; every variant is
/// recovered locally and shown to the user as text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    #[error("Invalid page number: {input:?} (pages 1-{total})")]
    InvalidPageNumber { input: String, total: usize },

    #[error("Narration unavailable: {0}")]
    NarrationUnavailable(NarrationUnavailableReason),

    #[error("Narration failed: {0}")]
    NarrationPlaybackError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrationUnavailableReason {
    #[error("no speech engine is configured")]
    EngineAbsent,

    #[error("voice {0:?} is not installed")]
    VoiceMissing(String),

    #[error("narration was disabled after an earlier failure")]
    Disabled,
}

/// Problems with the book data itself, detected once at load time.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("book has no pages")]
    Empty,

    #[error("plain text has {plain} pages but annotated text has {annotated}")]
    LengthMismatch { plain: usize, annotated: usize },

    #[error("page {page}: plain page is a {plain} but annotated page is a {annotated}")]
    KindMismatch {
        page: usize,
        plain: &'static str,
        annotated: &'static str,
    },

    #[error("page {page}: field `{field}` differs between plain and annotated pages")]
    FieldMismatch { page: usize, field: &'static str },

    #[error("failed to read book file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse book file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("failed to replace storage file: {0}")]
    Persist(#[from] tempfile::PersistError),
}
