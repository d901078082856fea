// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::match_like_matches_macro)]

//! # pdf_signet
//!
//! A PDF mutation engine for signing workflows: digital-signature
//! placeholders with reserved byte ranges, in-place signing, wet-ink
//! signature stamps, "sign here" markers, and text watermarks. Every
//! mutation is an incremental update, so the caller's original bytes are
//! preserved verbatim as a prefix of the output.
//!
//! ## Quick start
//!
//! ```ignore
//! use pdf_signet::{Anchor, Document, PageSelector, PlacementRequest};
//!
//! # fn main() -> pdf_signet::Result<()> {
//! let mut doc = Document::parse(&std::fs::read("contract.pdf")?)?;
//!
//! // Reserve a 4 KiB signature window on the last page
//! let location = PlacementRequest {
//!     selector: PageSelector::Last,
//!     anchor: Anchor::BottomRight,
//! };
//! doc.add_signature_placeholder(location, 4096, (180.0, 60.0), None, &[])?;
//!
//! // Hash the covered ranges out of band, then patch the signature in
//! let range = doc.signature_byte_range().unwrap();
//! let signature = my_signer(&pdf_signet::signed_bytes(doc.bytes(), &range)?);
//! let signed = doc.sign_document(&signature)?;
//! std::fs::write("contract-signed.pdf", signed)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - Incremental only: the input is a byte-for-byte prefix of every output.
//! - Deterministic: identical input and request produce identical bytes.
//! - All-or-nothing: a failed operation returns an error and no output.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core PDF parsing
pub mod document;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod xref;

// Stream decoders
pub mod decoders;

// Geometry and placement
pub mod geometry;
pub mod placement;

// Serialization
pub mod writer;

// Mutation engines
pub mod annotation;
pub mod image;
pub mod signature;
pub mod watermark;

// Host-facing seams
pub mod capability;
pub mod events;

// Re-exports
pub use capability::{Action, ActionGate, AllowAll};
pub use document::{Document, PageSelector, DEFAULT_MEDIA_BOX};
pub use error::{Error, Result};
pub use events::{EventSink, LogSink, MutationEvent, Outcome};
pub use geometry::{Point, Rect};
pub use image::SigImage;
pub use placement::{Anchor, PlacementRequest, ANCHOR_INSET};
pub use signature::signed_bytes;

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
