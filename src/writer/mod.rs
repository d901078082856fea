//! Serialization of objects and incremental revisions.

pub mod incremental;
pub mod serializer;

pub use incremental::{IncrementalWriter, UpdateOutput};
pub use serializer::ObjectSerializer;
