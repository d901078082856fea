//! Incremental update serialization.
//!
//! An incremental update appends to the original file rather than rewriting
//! it: the original bytes are copied verbatim, staged objects are appended,
//! and a new xref section with a /Prev pointer back to the previous section
//! closes the revision. Byte offsets of everything already written never
//! change, which is what keeps signed byte ranges valid across later
//! mutations.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use crate::error::Result;
use crate::object::{Object, ObjectRef};
use crate::writer::serializer::ObjectSerializer;
use crate::xref::find_startxref;

/// Result of appending one revision.
#[derive(Debug)]
pub struct UpdateOutput {
    /// The full file, original bytes plus the new revision
    pub bytes: Vec<u8>,
    /// Byte offset of each appended object, keyed by object number
    pub object_offsets: HashMap<u32, u64>,
    /// Offset of the new xref section
    pub xref_offset: u64,
}

/// Writer for a single incremental revision.
#[derive(Debug)]
pub struct IncrementalWriter<'a> {
    original: &'a [u8],
    /// Highest object number plus one, written as trailer /Size
    size: u32,
    root: ObjectRef,
    info: Option<ObjectRef>,
}

impl<'a> IncrementalWriter<'a> {
    /// Create a writer over the current file bytes.
    pub fn new(original: &'a [u8], size: u32, root: ObjectRef, info: Option<ObjectRef>) -> Self {
        Self {
            original,
            size,
            root,
            info,
        }
    }

    /// Append `staged` objects and a closing xref section.
    ///
    /// Objects are written in ascending object-number order, so identical
    /// staged sets always produce identical bytes.
    pub fn write(&self, staged: &BTreeMap<u32, Object>) -> Result<UpdateOutput> {
        let prev_offset = find_startxref(self.original)?;
        let serializer = ObjectSerializer::new();

        let mut out = self.original.to_vec();
        if out.last() != Some(&b'\n') {
            out.push(b'\n');
        }

        let mut object_offsets = HashMap::new();
        for (&id, obj) in staged {
            let offset = out.len() as u64;
            object_offsets.insert(id, offset);
            out.extend_from_slice(&serializer.serialize_indirect(ObjectRef::new(id, 0), obj));
        }

        let xref_offset = out.len() as u64;
        let _ = write!(out, "xref\n");
        // One subsection per entry keeps subsection bookkeeping trivial
        for &id in staged.keys() {
            let _ = write!(out, "{} 1\n{:010} {:05} n \n", id, object_offsets[&id], 0);
        }

        let _ = write!(out, "trailer\n<<\n");
        if let Some(info) = self.info {
            let _ = write!(out, "  /Info {} {} R\n", info.id, info.gen);
        }
        let _ = write!(out, "  /Prev {}\n", prev_offset);
        let _ = write!(out, "  /Root {} {} R\n", self.root.id, self.root.gen);
        let _ = write!(out, "  /Size {}\n", self.size);
        let _ = write!(out, ">>\nstartxref\n{}\n%%EOF\n", xref_offset);

        Ok(UpdateOutput {
            bytes: out,
            object_offsets,
            xref_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_original() -> Vec<u8> {
        b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\nxref\n0 2\n0000000000 65535 f \n0000000009 00000 n \ntrailer\n<< /Root 1 0 R /Size 2 >>\nstartxref\n45\n%%EOF\n"
            .to_vec()
    }

    #[test]
    fn test_original_bytes_are_preserved_verbatim() {
        let original = minimal_original();
        let writer = IncrementalWriter::new(&original, 3, ObjectRef::new(1, 0), None);
        let mut staged = BTreeMap::new();
        staged.insert(2, Object::Integer(42));

        let output = writer.write(&staged).unwrap();
        assert_eq!(&output.bytes[..original.len()], &original[..]);
        assert!(output.bytes.len() > original.len());
    }

    #[test]
    fn test_update_records_offsets_and_chains_prev() {
        let original = minimal_original();
        let writer = IncrementalWriter::new(&original, 4, ObjectRef::new(1, 0), None);
        let mut staged = BTreeMap::new();
        staged.insert(2, Object::Integer(7));
        staged.insert(3, Object::Name("Later".to_string()));

        let output = writer.write(&staged).unwrap();

        let off2 = output.object_offsets[&2] as usize;
        assert!(output.bytes[off2..].starts_with(b"2 0 obj"));
        let off3 = output.object_offsets[&3] as usize;
        assert!(output.bytes[off3..].starts_with(b"3 0 obj"));

        let text = String::from_utf8_lossy(&output.bytes);
        assert!(text.contains("/Prev 45"));
        assert!(text.contains("/Root 1 0 R"));
        assert!(text.contains("/Size 4"));
        assert!(text.ends_with("%%EOF\n"));

        // The closing startxref points at the new section
        let tail_offset = crate::xref::find_startxref(&output.bytes).unwrap();
        assert_eq!(tail_offset, output.xref_offset);
        assert!(output.bytes[tail_offset as usize..].starts_with(b"xref\n"));
    }

    #[test]
    fn test_identical_staging_is_deterministic() {
        let original = minimal_original();
        let writer = IncrementalWriter::new(&original, 3, ObjectRef::new(1, 0), None);
        let mut staged = BTreeMap::new();
        staged.insert(
            2,
            ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Annot")),
                ("Subtype", ObjectSerializer::name("Stamp")),
            ]),
        );

        let a = writer.write(&staged).unwrap();
        let b = writer.write(&staged).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn test_new_revision_parses_back() {
        let original = minimal_original();
        let writer = IncrementalWriter::new(&original, 3, ObjectRef::new(1, 0), None);
        let mut staged = BTreeMap::new();
        staged.insert(2, Object::Integer(42));

        let output = writer.write(&staged).unwrap();
        let start = crate::xref::find_startxref(&output.bytes).unwrap();
        let xref = crate::xref::parse_xref(&output.bytes, start).unwrap();
        assert!(xref.get(2).is_some());
        assert!(xref.get(1).is_some());
        assert_eq!(
            xref.trailer().unwrap().get("Size").unwrap().as_integer(),
            Some(3)
        );
    }
}
