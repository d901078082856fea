//! Document model and mutation session.
//!
//! A [`Document`] owns a parsed copy of the input bytes plus a staging area
//! for new and changed objects. Each mutation stages objects, appends an
//! incremental revision through [`commit`](Document::commit), and re-parses
//! the result so the next mutation sees the updated file. The caller's
//! input buffer is never touched.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use crate::capability::Action;
use crate::error::{Error, Result};
use crate::events::{EventSink, LogSink, MutationEvent, Outcome};
use crate::geometry::Rect;
use crate::object::{Object, ObjectRef};
use crate::parser::parse_indirect_object;
use crate::signature::SignaturePlaceholder;
use crate::writer::IncrementalWriter;
use crate::xref::{find_startxref, parse_xref, CrossRefTable, XRefEntry};

/// Which page a mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelector {
    /// The first page
    First,
    /// The last page
    Last,
    /// A 1-based page index
    Index(u32),
}

/// US Letter, the fallback when no /MediaBox is inherited.
pub const DEFAULT_MEDIA_BOX: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 612.0,
    height: 792.0,
};

/// A parsed document and its pending mutations.
pub struct Document {
    bytes: Vec<u8>,
    xref: CrossRefTable,
    root: ObjectRef,
    info: Option<ObjectRef>,
    pages: Vec<ObjectRef>,
    pub(crate) staged: BTreeMap<u32, Object>,
    next_id: u32,
    pub(crate) placeholder: Option<SignaturePlaceholder>,
    pub(crate) events: Arc<dyn EventSink + Send + Sync>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("bytes", &self.bytes.len())
            .field("pages", &self.pages.len())
            .field("staged", &self.staged.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Document {
    /// Parse a PDF from bytes.
    ///
    /// The input is copied; the caller's buffer is never mutated. Any
    /// structural failure maps to [`Error::MalformedDocument`].
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.to_vec();
        if !bytes.starts_with(b"%PDF-") {
            return Err(Error::MalformedDocument("missing %PDF header".to_string()));
        }

        let startxref = find_startxref(&bytes)?;
        let xref = parse_xref(&bytes, startxref)?;

        let trailer = xref
            .trailer()
            .ok_or_else(|| Error::MalformedDocument("no trailer dictionary".to_string()))?;
        let root = trailer
            .get("Root")
            .and_then(|o| o.as_reference())
            .ok_or_else(|| Error::MalformedDocument("trailer has no /Root".to_string()))?;
        let info = trailer.get("Info").and_then(|o| o.as_reference());

        let size = trailer
            .get("Size")
            .and_then(|o| o.as_integer())
            .unwrap_or(0) as u32;
        let max_id = xref.object_numbers().max().unwrap_or(0);
        let next_id = size.max(max_id + 1);

        let mut doc = Self {
            bytes,
            xref,
            root,
            info,
            pages: Vec::new(),
            staged: BTreeMap::new(),
            next_id,
            placeholder: None,
            events: Arc::new(LogSink),
        };
        doc.pages = doc.collect_page_refs()?;
        log::debug!("parsed document: {} pages, next id {}", doc.pages.len(), doc.next_id);
        Ok(doc)
    }

    /// The current file bytes, including every committed revision.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Catalog reference from the trailer.
    pub fn root(&self) -> ObjectRef {
        self.root
    }

    /// Replace the sink that receives mutation events.
    pub fn set_event_sink(&mut self, sink: Arc<dyn EventSink + Send + Sync>) {
        self.events = sink;
    }

    /// Resolve a page selector to the page object reference.
    pub fn locate_page(&self, selector: PageSelector) -> Result<ObjectRef> {
        let count = self.page_count();
        let index = match selector {
            PageSelector::First => 1,
            PageSelector::Last => count,
            PageSelector::Index(i) => i,
        };
        if index == 0 || index > count {
            return Err(Error::PageNotFound {
                requested: index,
                page_count: count,
            });
        }
        Ok(self.pages[(index - 1) as usize])
    }

    /// Page references in document order.
    pub fn page_refs(&self) -> &[ObjectRef] {
        &self.pages
    }

    /// Load an object by reference. Staged objects shadow the file.
    pub fn load_object(&self, obj_ref: ObjectRef) -> Result<Object> {
        if let Some(staged) = self.staged.get(&obj_ref.id) {
            return Ok(staged.clone());
        }
        match self.xref.get(obj_ref.id) {
            Some(XRefEntry::Uncompressed { offset, .. }) => {
                let offset = *offset as usize;
                if offset >= self.bytes.len() {
                    return Err(Error::MalformedDocument(format!(
                        "object {} offset {} beyond end of file",
                        obj_ref, offset
                    )));
                }
                let (_, (found_ref, obj)) = parse_indirect_object(&self.bytes[offset..])
                    .map_err(|_| {
                        Error::MalformedDocument(format!("unparseable object at offset {}", offset))
                    })?;
                if found_ref.id != obj_ref.id {
                    return Err(Error::MalformedDocument(format!(
                        "xref points {} at object {}",
                        obj_ref, found_ref
                    )));
                }
                Ok(obj)
            },
            Some(XRefEntry::Compressed { stream_id, .. }) => Err(Error::MalformedDocument(format!(
                "object {} lives in object stream {} (object streams not supported)",
                obj_ref, stream_id
            ))),
            Some(XRefEntry::Free { .. }) | None => Err(Error::MalformedDocument(format!(
                "object {} not present",
                obj_ref
            ))),
        }
    }

    /// Follow a reference chain until a direct object is reached.
    pub fn resolve(&self, obj: &Object) -> Result<Object> {
        let mut current = obj.clone();
        // References to references are rare but legal
        for _ in 0..32 {
            match current {
                Object::Reference(r) => current = self.load_object(r)?,
                other => return Ok(other),
            }
        }
        Err(Error::MalformedDocument("reference chain too deep".to_string()))
    }

    /// Allocate a fresh object number.
    pub fn allocate_object_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Stage a new or replacement object body for the next revision.
    pub fn stage(&mut self, id: u32, obj: Object) {
        self.staged.insert(id, obj);
    }

    /// Media box for a page, walking /Parent for inherited values.
    pub fn media_box(&self, page: ObjectRef) -> Result<Rect> {
        let mut current = page;
        for _ in 0..64 {
            let obj = self.load_object(current)?;
            let dict = obj.as_dict().ok_or_else(|| {
                Error::MalformedDocument(format!("page node {} is not a dictionary", current))
            })?;

            if let Some(mb) = dict.get("MediaBox") {
                let resolved = self.resolve(mb)?;
                if let Some(rect) = media_box_from_array(&resolved) {
                    return Ok(rect);
                }
                return Err(Error::MalformedDocument(format!(
                    "invalid /MediaBox on {}",
                    current
                )));
            }

            match dict.get("Parent").and_then(|o| o.as_reference()) {
                Some(parent) => current = parent,
                None => return Ok(DEFAULT_MEDIA_BOX),
            }
        }
        Err(Error::MalformedDocument("page /Parent chain too deep".to_string()))
    }

    /// Append the staged objects as one incremental revision and re-parse.
    ///
    /// Returns the full updated bytes. On success the staging area is empty
    /// and the document reflects the new revision.
    pub fn commit(&mut self) -> Result<Vec<u8>> {
        if self.staged.is_empty() {
            return Ok(self.bytes.clone());
        }
        let writer = IncrementalWriter::new(&self.bytes, self.next_id, self.root, self.info);
        let output = writer.write(&self.staged)?;
        self.adopt(output.bytes.clone())?;
        Ok(output.bytes)
    }

    /// Like [`commit`](Self::commit) but also reports where each staged
    /// object landed, for callers that patch bytes in place afterwards.
    pub(crate) fn commit_with_offsets(&mut self) -> Result<(Vec<u8>, HashMap<u32, u64>)> {
        let writer = IncrementalWriter::new(&self.bytes, self.next_id, self.root, self.info);
        let output = writer.write(&self.staged)?;
        self.adopt(output.bytes.clone())?;
        Ok((output.bytes, output.object_offsets))
    }

    /// Report one finished operation to the event sink.
    pub(crate) fn emit(&self, action: Action, started: Instant, result: &Result<Vec<u8>>) {
        let event = MutationEvent {
            action,
            outcome: match result {
                Ok(_) => Outcome::Ok,
                Err(e) => Outcome::Failed(e.kind_name()),
            },
            duration: started.elapsed(),
            bytes_out: result.as_ref().ok().map(|b| b.len()),
        };
        self.events.record(&event);
    }

    /// Replace the document state with freshly parsed bytes, keeping the
    /// session state (placeholder, event sink, allocated ids) alive.
    pub(crate) fn adopt(&mut self, bytes: Vec<u8>) -> Result<()> {
        let reparsed = Document::parse(&bytes)?;
        self.bytes = reparsed.bytes;
        self.xref = reparsed.xref;
        self.root = reparsed.root;
        self.info = reparsed.info;
        self.pages = reparsed.pages;
        self.next_id = self.next_id.max(reparsed.next_id);
        self.staged.clear();
        Ok(())
    }

    /// Flatten the page tree into document order.
    fn collect_page_refs(&self) -> Result<Vec<ObjectRef>> {
        let catalog = self.load_object(self.root)?;
        let pages_ref = catalog
            .as_dict()
            .and_then(|d| d.get("Pages"))
            .and_then(|o| o.as_reference())
            .ok_or_else(|| Error::MalformedDocument("catalog has no /Pages".to_string()))?;

        let mut refs = Vec::new();
        self.walk_page_tree(pages_ref, &mut refs, 0)?;
        Ok(refs)
    }

    fn walk_page_tree(&self, node: ObjectRef, out: &mut Vec<ObjectRef>, depth: u32) -> Result<()> {
        if depth > 64 {
            return Err(Error::MalformedDocument("page tree too deep".to_string()));
        }
        let obj = self.load_object(node)?;
        let dict = obj.as_dict().ok_or_else(|| {
            Error::MalformedDocument(format!("page tree node {} is not a dictionary", node))
        })?;

        match dict.get("Type").and_then(|o| o.as_name()) {
            Some("Pages") => {
                let kids = dict
                    .get("Kids")
                    .map(|k| self.resolve(k))
                    .transpose()?
                    .and_then(|k| k.as_array().cloned())
                    .ok_or_else(|| {
                        Error::MalformedDocument(format!("/Pages node {} has no /Kids", node))
                    })?;
                for kid in kids {
                    let kid_ref = kid.as_reference().ok_or_else(|| {
                        Error::MalformedDocument("/Kids entry is not a reference".to_string())
                    })?;
                    self.walk_page_tree(kid_ref, out, depth + 1)?;
                }
                Ok(())
            },
            Some("Page") => {
                out.push(node);
                Ok(())
            },
            other => Err(Error::MalformedDocument(format!(
                "page tree node {} has type {:?}",
                node, other
            ))),
        }
    }
}

fn media_box_from_array(obj: &Object) -> Option<Rect> {
    let arr = obj.as_array()?;
    if arr.len() != 4 {
        return None;
    }
    let mut vals = [0f32; 4];
    for (slot, item) in vals.iter_mut().zip(arr) {
        *slot = item.as_number()? as f32;
    }
    Some(Rect::from_corners(vals[0], vals[1], vals[2], vals[3]))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Offsets are computed while assembling so the xref is exact.
    fn build_pdf(page_count: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::new();

        out.extend_from_slice(b"%PDF-1.4\n");

        let page_ids: Vec<usize> = (3..3 + page_count).collect();
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");

        offsets.push(out.len());
        out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} /MediaBox [0 0 612 792] >>\nendobj\n",
                kids, page_count
            )
            .as_bytes(),
        );
        for id in &page_ids {
            offsets.push(out.len());
            out.extend_from_slice(
                format!("{} 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n", id).as_bytes(),
            );
        }

        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for off in &offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                offsets.len() + 1,
                xref_offset
            )
            .as_bytes(),
        );
        out
    }

    #[test]
    fn test_parse_counts_pages() {
        let doc = Document::parse(&build_pdf(3)).unwrap();
        assert_eq!(doc.page_count(), 3);
    }

    #[test]
    fn test_parse_rejects_non_pdf() {
        assert!(matches!(
            Document::parse(b"not a pdf at all"),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_locate_page_selectors() {
        let doc = Document::parse(&build_pdf(3)).unwrap();
        let first = doc.locate_page(PageSelector::First).unwrap();
        let last = doc.locate_page(PageSelector::Last).unwrap();
        assert_eq!(first, doc.locate_page(PageSelector::Index(1)).unwrap());
        assert_eq!(last, doc.locate_page(PageSelector::Index(3)).unwrap());
        assert_ne!(first, last);
    }

    #[test]
    fn test_locate_page_out_of_range() {
        let doc = Document::parse(&build_pdf(2)).unwrap();
        assert!(matches!(
            doc.locate_page(PageSelector::Index(0)),
            Err(Error::PageNotFound {
                requested: 0,
                page_count: 2
            })
        ));
        assert!(matches!(
            doc.locate_page(PageSelector::Index(3)),
            Err(Error::PageNotFound {
                requested: 3,
                page_count: 2
            })
        ));
    }

    #[test]
    fn test_media_box_inherited_from_pages_node() {
        let doc = Document::parse(&build_pdf(1)).unwrap();
        let page = doc.locate_page(PageSelector::First).unwrap();
        let mb = doc.media_box(page).unwrap();
        assert_eq!(mb, Rect::new(0.0, 0.0, 612.0, 792.0));
    }

    #[test]
    fn test_commit_appends_and_reparses() {
        let original = build_pdf(1);
        let mut doc = Document::parse(&original).unwrap();
        let id = doc.allocate_object_id();
        doc.stage(id, Object::Integer(99));

        let bytes = doc.commit().unwrap();
        assert!(bytes.starts_with(&original));
        assert!(doc.staged.is_empty());
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.load_object(ObjectRef::new(id, 0)).unwrap().as_integer(), Some(99));
    }

    #[test]
    fn test_commit_without_staging_is_identity() {
        let original = build_pdf(1);
        let mut doc = Document::parse(&original).unwrap();
        assert_eq!(doc.commit().unwrap(), original);
    }

    #[test]
    fn test_staged_objects_shadow_file() {
        let mut doc = Document::parse(&build_pdf(1)).unwrap();
        let page = doc.locate_page(PageSelector::First).unwrap();
        doc.stage(page.id, Object::Integer(1));
        assert_eq!(doc.load_object(page).unwrap().as_integer(), Some(1));
    }

    #[test]
    fn test_allocate_ids_are_unique() {
        let mut doc = Document::parse(&build_pdf(1)).unwrap();
        let a = doc.allocate_object_id();
        let b = doc.allocate_object_id();
        assert_ne!(a, b);
        assert!(a >= 4);
    }
}
