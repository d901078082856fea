//! Error types for the mutation engine.
//!
//! Every public operation reports failure through [`Error`]; a failed call
//! never yields partially-mutated output and never touches the caller's
//! input buffer.

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds reported by the mutation engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input bytes could not be parsed as a PDF document.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A page selector resolved to no page.
    #[error("page {requested} not found (document has {page_count} pages)")]
    PageNotFound {
        /// 1-based requested page index (0 for an empty selector set)
        requested: u32,
        /// Number of pages in the document
        page_count: u32,
    },

    /// A placement would put content outside the page media box.
    #[error("placement {rect:?} exits media box {media_box:?}")]
    OutOfBounds {
        /// Resolved rectangle as [x, y, width, height]
        rect: [f32; 4],
        /// Media box as [x, y, width, height]
        media_box: [f32; 4],
    },

    /// `sign_document` was called with no unconsumed placeholder.
    #[error("no unconsumed signature placeholder exists")]
    PlaceholderNotFound,

    /// A placeholder reservation already exists and has not been consumed.
    #[error("a signature placeholder is already reserved")]
    PlaceholderAlreadyReserved,

    /// A placeholder reservation was requested with a length of zero.
    #[error("signature placeholder length must be at least one byte")]
    EmptyPlaceholder,

    /// Signature bytes exceed the reserved placeholder length.
    #[error("signature of {len} bytes exceeds reserved {reserved} bytes")]
    SignatureTooLarge {
        /// Length of the supplied signature in bytes
        len: usize,
        /// Reserved placeholder length in bytes
        reserved: usize,
    },

    /// Image bytes are not in a supported format (PNG or JPEG).
    #[error("unsupported image format")]
    UnsupportedImageFormat,

    /// IO error from an underlying reader/writer.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short stable name of the error kind, used in emitted events.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::MalformedDocument(_) => "MalformedDocument",
            Error::PageNotFound { .. } => "PageNotFound",
            Error::OutOfBounds { .. } => "OutOfBounds",
            Error::PlaceholderNotFound => "PlaceholderNotFound",
            Error::PlaceholderAlreadyReserved => "PlaceholderAlreadyReserved",
            Error::EmptyPlaceholder => "EmptyPlaceholder",
            Error::SignatureTooLarge { .. } => "SignatureTooLarge",
            Error::UnsupportedImageFormat => "UnsupportedImageFormat",
            Error::Io(_) => "Io",
        }
    }
}
