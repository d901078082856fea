//! Digital signature placeholders and in-place signing.
//!
//! Signing is a two-step protocol. `add_signature_placeholder` reserves a
//! zero-filled `/Contents` hex window of a fixed size and records its byte
//! offsets; the caller hashes the covered ranges and produces a PKCS#7
//! detached signature out of band; `sign_document` then writes the hex-encoded
//! signature into the reserved window without moving a single byte, so the
//! `/ByteRange` stays valid.

use std::collections::HashMap;
use std::time::Instant;

use bytes::Bytes;

use crate::capability::Action;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::image::SigImage;
use crate::object::{Object, ObjectRef};
use crate::placement::{self, PlacementRequest};

/// Digits reserved per `/ByteRange` entry before patching.
const BYTE_RANGE_DIGITS: i64 = 9_999_999_999;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// A reserved, not yet consumed signature window.
#[derive(Debug, Clone)]
pub(crate) struct SignaturePlaceholder {
    /// Offset of the `<` opening the `/Contents` hex string
    pub contents_offset: usize,
    /// Reserved signature size in bytes (half the hex digit count)
    pub reserved_len: usize,
    /// The signature dictionary object
    pub sig_ref: ObjectRef,
    /// `[0, l1, o2, l2]` as written into the file
    pub byte_range: [i64; 4],
}

impl Document {
    /// Reserve a digital-signature placeholder.
    ///
    /// Builds a `/Type /Sig` dictionary with a zero-filled `/Contents` window
    /// of `placeholder_len` bytes, a widget annotation at the resolved
    /// location (with an optional image appearance), and an `/AcroForm` entry
    /// on the catalog. `additional_info` pairs are carried in order inside a
    /// `/SigPropPairs` array; duplicates are kept.
    ///
    /// Fails with [`Error::PlaceholderAlreadyReserved`] while an earlier
    /// reservation has not been consumed by [`sign_document`](Self::sign_document),
    /// and with [`Error::EmptyPlaceholder`] for a zero-length window.
    pub fn add_signature_placeholder(
        &mut self,
        location: PlacementRequest,
        placeholder_len: usize,
        box_size: (f32, f32),
        image: Option<&SigImage>,
        additional_info: &[(String, String)],
    ) -> Result<Vec<u8>> {
        let started = Instant::now();
        let result =
            self.reserve_placeholder(location, placeholder_len, box_size, image, additional_info);
        if result.is_err() {
            self.staged.clear();
        }
        self.emit(Action::AddSignaturePlaceholder, started, &result);
        result
    }

    /// Write a detached signature into the reserved window.
    ///
    /// The window is patched in the current file bytes, so mutations
    /// committed after the reservation are preserved; incremental updates
    /// never move the window. The output differs from the input only inside
    /// the hex window; shorter signatures stay zero-padded on the right.
    /// The reservation is consumed exactly once.
    ///
    /// Note that the `/ByteRange` covers the file as of the reservation:
    /// revisions appended in between lie outside the signed ranges.
    pub fn sign_document(&mut self, signature: &[u8]) -> Result<Vec<u8>> {
        let started = Instant::now();
        let result = self.apply_signature(signature);
        if result.is_err() {
            self.staged.clear();
        }
        self.emit(Action::SignDocument, started, &result);
        result
    }

    /// `/ByteRange` of the current reservation, if one is pending.
    pub fn signature_byte_range(&self) -> Option<[i64; 4]> {
        self.placeholder.as_ref().map(|p| p.byte_range)
    }

    /// Signature dictionary reference of the current reservation.
    pub fn signature_ref(&self) -> Option<ObjectRef> {
        self.placeholder.as_ref().map(|p| p.sig_ref)
    }

    fn reserve_placeholder(
        &mut self,
        location: PlacementRequest,
        placeholder_len: usize,
        box_size: (f32, f32),
        image: Option<&SigImage>,
        additional_info: &[(String, String)],
    ) -> Result<Vec<u8>> {
        if self.placeholder.is_some() {
            return Err(Error::PlaceholderAlreadyReserved);
        }
        if placeholder_len == 0 {
            return Err(Error::EmptyPlaceholder);
        }

        let page_ref = self.locate_page(location.selector)?;
        let media_box = self.media_box(page_ref)?;
        let rect = placement::resolve(location.anchor, media_box, box_size)?;

        let sig_id = self.allocate_object_id();
        let widget_id = self.allocate_object_id();

        let mut sig_dict = HashMap::new();
        sig_dict.insert("Type".to_string(), Object::Name("Sig".to_string()));
        sig_dict.insert("Filter".to_string(), Object::Name("Adobe.PPKLite".to_string()));
        sig_dict.insert(
            "SubFilter".to_string(),
            Object::Name("adbe.pkcs7.detached".to_string()),
        );
        sig_dict.insert(
            "Contents".to_string(),
            Object::String(vec![0u8; placeholder_len]),
        );
        // Patched in place after serialization; entries are sized to hold
        // any offset this writer can produce
        sig_dict.insert(
            "ByteRange".to_string(),
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(BYTE_RANGE_DIGITS),
                Object::Integer(BYTE_RANGE_DIGITS),
                Object::Integer(BYTE_RANGE_DIGITS),
            ]),
        );
        if !additional_info.is_empty() {
            let pairs = additional_info
                .iter()
                .flat_map(|(k, v)| {
                    [
                        Object::String(k.as_bytes().to_vec()),
                        Object::String(v.as_bytes().to_vec()),
                    ]
                })
                .collect();
            sig_dict.insert("SigPropPairs".to_string(), Object::Array(pairs));
        }
        self.stage(sig_id, Object::Dictionary(sig_dict));

        let mut widget = HashMap::new();
        widget.insert("Type".to_string(), Object::Name("Annot".to_string()));
        widget.insert("Subtype".to_string(), Object::Name("Widget".to_string()));
        widget.insert(
            "Rect".to_string(),
            crate::writer::ObjectSerializer::rect(&rect),
        );
        widget.insert("FT".to_string(), Object::Name("Sig".to_string()));
        widget.insert(
            "T".to_string(),
            Object::String(format!("Signature{}", sig_id).into_bytes()),
        );
        widget.insert("V".to_string(), Object::Reference(ObjectRef::new(sig_id, 0)));
        widget.insert("P".to_string(), Object::Reference(page_ref));
        // Bit 3: print
        widget.insert("F".to_string(), Object::Integer(4));

        if let Some(img) = image {
            let appearance = self.stage_image_appearance(img, rect.width, rect.height);
            let mut ap = HashMap::new();
            ap.insert("N".to_string(), Object::Reference(appearance));
            widget.insert("AP".to_string(), Object::Dictionary(ap));
        }

        self.stage(widget_id, Object::Dictionary(widget));
        self.register_acroform_field(ObjectRef::new(widget_id, 0))?;
        self.append_page_annotation(page_ref, ObjectRef::new(widget_id, 0))?;

        let (bytes, offsets) = self.commit_with_offsets()?;
        let sig_offset = offsets.get(&sig_id).copied().ok_or_else(|| {
            Error::MalformedDocument("signature object missing from update".to_string())
        })? as usize;

        let (bytes, contents_offset, byte_range) =
            patch_byte_range(bytes, sig_offset, placeholder_len)?;
        self.adopt(bytes.clone())?;

        self.placeholder = Some(SignaturePlaceholder {
            contents_offset,
            reserved_len: placeholder_len,
            sig_ref: ObjectRef::new(sig_id, 0),
            byte_range,
        });
        log::debug!(
            "reserved {} signature bytes at offset {} (object {})",
            placeholder_len,
            contents_offset,
            sig_id
        );
        Ok(bytes)
    }

    fn apply_signature(&mut self, signature: &[u8]) -> Result<Vec<u8>> {
        let (contents_offset, reserved_len) = match &self.placeholder {
            Some(p) => (p.contents_offset, p.reserved_len),
            None => return Err(Error::PlaceholderNotFound),
        };
        if signature.len() > reserved_len {
            return Err(Error::SignatureTooLarge {
                len: signature.len(),
                reserved: reserved_len,
            });
        }

        let mut bytes = self.bytes().to_vec();
        if bytes.get(contents_offset) != Some(&b'<') {
            return Err(Error::MalformedDocument(
                "signature window missing from current revision".to_string(),
            ));
        }
        let hex_start = contents_offset + 1;
        for (i, &byte) in signature.iter().enumerate() {
            bytes[hex_start + 2 * i] = HEX_DIGITS[(byte >> 4) as usize];
            bytes[hex_start + 2 * i + 1] = HEX_DIGITS[(byte & 0x0F) as usize];
        }
        // The reservation wrote zeros, so the tail is already zero-padded

        self.placeholder = None;
        self.adopt(bytes.clone())?;
        Ok(bytes)
    }

    /// Stage an image XObject plus a form XObject that draws it, returning
    /// the form reference for use as an appearance stream.
    pub(crate) fn stage_image_appearance(
        &mut self,
        image: &SigImage,
        width: f32,
        height: f32,
    ) -> ObjectRef {
        let image_id = self.allocate_object_id();
        self.stage(
            image_id,
            Object::Stream {
                dict: image.xobject_dict(),
                data: Bytes::from(image.data.clone()),
            },
        );

        let mut xobjects = HashMap::new();
        xobjects.insert("Im0".to_string(), Object::Reference(ObjectRef::new(image_id, 0)));
        let mut resources = HashMap::new();
        resources.insert("XObject".to_string(), Object::Dictionary(xobjects));

        let mut form_dict = HashMap::new();
        form_dict.insert("Type".to_string(), Object::Name("XObject".to_string()));
        form_dict.insert("Subtype".to_string(), Object::Name("Form".to_string()));
        form_dict.insert(
            "BBox".to_string(),
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f64),
                Object::Real(height as f64),
            ]),
        );
        form_dict.insert("Resources".to_string(), Object::Dictionary(resources));

        let content = format!("q {} 0 0 {} 0 0 cm /Im0 Do Q", width, height);
        let form_id = self.allocate_object_id();
        self.stage(
            form_id,
            Object::Stream {
                dict: form_dict,
                data: Bytes::from(content.into_bytes()),
            },
        );
        ObjectRef::new(form_id, 0)
    }

    /// Add a field to the catalog's `/AcroForm`, creating it when absent,
    /// and set `/SigFlags 3` (signatures exist, append-only).
    fn register_acroform_field(&mut self, field: ObjectRef) -> Result<()> {
        let catalog = self.load_object(self.root())?;
        let mut catalog_dict = catalog
            .as_dict()
            .cloned()
            .ok_or_else(|| Error::MalformedDocument("catalog is not a dictionary".to_string()))?;

        let acroform_ref = catalog_dict.get("AcroForm").and_then(|o| o.as_reference());
        let mut form = match catalog_dict.get("AcroForm") {
            Some(obj) => self
                .resolve(obj)?
                .as_dict()
                .cloned()
                .ok_or_else(|| {
                    Error::MalformedDocument("/AcroForm is not a dictionary".to_string())
                })?,
            None => HashMap::new(),
        };

        let mut fields = match form.get("Fields") {
            Some(obj) => self
                .resolve(obj)?
                .as_array()
                .cloned()
                .ok_or_else(|| {
                    Error::MalformedDocument("/AcroForm /Fields is not an array".to_string())
                })?,
            None => Vec::new(),
        };
        fields.push(Object::Reference(field));
        form.insert("Fields".to_string(), Object::Array(fields));
        form.insert("SigFlags".to_string(), Object::Integer(3));

        match acroform_ref {
            Some(r) => self.stage(r.id, Object::Dictionary(form)),
            None => {
                catalog_dict.insert("AcroForm".to_string(), Object::Dictionary(form));
                self.stage(self.root().id, Object::Dictionary(catalog_dict));
            },
        }
        Ok(())
    }
}

/// Extract the bytes covered by a `/ByteRange`, the exact input to the
/// out-of-band hash.
pub fn signed_bytes(bytes: &[u8], byte_range: &[i64; 4]) -> Result<Vec<u8>> {
    let [start, len1, off2, len2] = *byte_range;
    let first = range_slice(bytes, start, len1)?;
    let second = range_slice(bytes, off2, len2)?;
    let mut out = Vec::with_capacity(first.len() + second.len());
    out.extend_from_slice(first);
    out.extend_from_slice(second);
    Ok(out)
}

fn range_slice(bytes: &[u8], start: i64, len: i64) -> Result<&[u8]> {
    if start < 0 || len < 0 {
        return Err(Error::MalformedDocument("negative /ByteRange entry".to_string()));
    }
    let (start, len) = (start as usize, len as usize);
    let end = start.checked_add(len).filter(|&e| e <= bytes.len()).ok_or_else(|| {
        Error::MalformedDocument("/ByteRange exceeds file size".to_string())
    })?;
    Ok(&bytes[start..end])
}

/// Locate the `/Contents` hex window inside the serialized signature object
/// and overwrite the `/ByteRange` entries with the real offsets, space-padded
/// to the reserved width so no byte moves.
fn patch_byte_range(
    mut bytes: Vec<u8>,
    sig_offset: usize,
    placeholder_len: usize,
) -> Result<(Vec<u8>, usize, [i64; 4])> {
    let window_end = find_from(&bytes, sig_offset, b"endobj").ok_or_else(|| {
        Error::MalformedDocument("unterminated signature object".to_string())
    })?;

    let contents_key = find_from(&bytes[..window_end], sig_offset, b"/Contents").ok_or_else(
        || Error::MalformedDocument("signature object has no /Contents".to_string()),
    )?;
    let contents_offset = find_from(&bytes[..window_end], contents_key, b"<").ok_or_else(|| {
        Error::MalformedDocument("signature /Contents is not a hex string".to_string())
    })?;
    let hex_window = 2 * placeholder_len + 2;

    let range_key = find_from(&bytes[..window_end], sig_offset, b"/ByteRange").ok_or_else(
        || Error::MalformedDocument("signature object has no /ByteRange".to_string()),
    )?;
    let open = find_from(&bytes[..window_end], range_key, b"[").ok_or_else(|| {
        Error::MalformedDocument("signature /ByteRange is not an array".to_string())
    })?;
    let close = find_from(&bytes[..window_end], open, b"]").ok_or_else(|| {
        Error::MalformedDocument("signature /ByteRange is not an array".to_string())
    })?;

    let l1 = contents_offset as i64;
    let o2 = (contents_offset + hex_window) as i64;
    let l2 = bytes.len() as i64 - o2;
    let byte_range = [0, l1, o2, l2];

    let interior_len = close - open - 1;
    let formatted = format!("0 {} {} {}", l1, o2, l2);
    if formatted.len() > interior_len {
        return Err(Error::MalformedDocument(
            "/ByteRange entries exceed reserved width".to_string(),
        ));
    }
    let padded = format!("{:<width$}", formatted, width = interior_len);
    bytes[open + 1..close].copy_from_slice(padded.as_bytes());

    Ok((bytes, contents_offset, byte_range))
}

fn find_from(haystack: &[u8], start: usize, needle: &[u8]) -> Option<usize> {
    if start > haystack.len() {
        return None;
    }
    haystack[start..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageSelector;
    use crate::placement::Anchor;

    fn sample_pdf() -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");

        offsets.push(out.len());
        out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        offsets.push(out.len());
        out.extend_from_slice(
            b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>\nendobj\n",
        );
        offsets.push(out.len());
        out.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n");

        let xref_offset = out.len();
        out.extend_from_slice(b"xref\n0 4\n0000000000 65535 f \n");
        for off in &offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size 4 /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                xref_offset
            )
            .as_bytes(),
        );
        out
    }

    fn request() -> PlacementRequest {
        PlacementRequest {
            selector: PageSelector::First,
            anchor: Anchor::BottomRight,
        }
    }

    #[test]
    fn test_reserve_writes_consistent_byte_range() {
        let mut doc = Document::parse(&sample_pdf()).unwrap();
        let bytes = doc
            .add_signature_placeholder(request(), 16, (150.0, 50.0), None, &[])
            .unwrap();

        let [zero, l1, o2, l2] = doc.signature_byte_range().unwrap();
        assert_eq!(zero, 0);
        assert_eq!(bytes[l1 as usize], b'<');
        assert_eq!(bytes[o2 as usize - 1], b'>');
        assert_eq!(o2 - l1, 2 * 16 + 2);
        assert_eq!((o2 + l2) as usize, bytes.len());

        // The window is all zero digits at reservation time
        assert!(bytes[l1 as usize + 1..o2 as usize - 1].iter().all(|&b| b == b'0'));
    }

    #[test]
    fn test_reserve_output_reparses_with_acroform() {
        let mut doc = Document::parse(&sample_pdf()).unwrap();
        let bytes = doc
            .add_signature_placeholder(request(), 8, (150.0, 50.0), None, &[])
            .unwrap();

        let reparsed = Document::parse(&bytes).unwrap();
        assert_eq!(reparsed.page_count(), 1);
        let catalog = reparsed.load_object(reparsed.root()).unwrap();
        let form = catalog.as_dict().unwrap().get("AcroForm").cloned().unwrap();
        let form = reparsed.resolve(&form).unwrap();
        assert_eq!(
            form.as_dict().unwrap().get("SigFlags").unwrap().as_integer(),
            Some(3)
        );
    }

    #[test]
    fn test_additional_info_pairs_kept_in_order() {
        let mut doc = Document::parse(&sample_pdf()).unwrap();
        let info = vec![
            ("Reason".to_string(), "Approval".to_string()),
            ("Reason".to_string(), "Second pass".to_string()),
        ];
        let bytes = doc
            .add_signature_placeholder(request(), 8, (150.0, 50.0), None, &info)
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);
        let first = text.find("(Approval)").unwrap();
        let second = text.find("(Second pass)").unwrap();
        assert!(first < second);
    }

    // Catalog whose /AcroForm is not a dictionary.
    fn pdf_with_broken_acroform() -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");

        offsets.push(out.len());
        out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R /AcroForm 7 >>\nendobj\n");
        offsets.push(out.len());
        out.extend_from_slice(
            b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>\nendobj\n",
        );
        offsets.push(out.len());
        out.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n");

        let xref_offset = out.len();
        out.extend_from_slice(b"xref\n0 4\n0000000000 65535 f \n");
        for off in &offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size 4 /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                xref_offset
            )
            .as_bytes(),
        );
        out
    }

    #[test]
    fn test_zero_length_reservation_rejected() {
        let mut doc = Document::parse(&sample_pdf()).unwrap();
        assert!(matches!(
            doc.add_signature_placeholder(request(), 0, (150.0, 50.0), None, &[]),
            Err(Error::EmptyPlaceholder)
        ));
        assert!(doc.signature_byte_range().is_none());
        // A valid reservation still goes through afterwards
        assert!(doc
            .add_signature_placeholder(request(), 8, (150.0, 50.0), None, &[])
            .is_ok());
    }

    #[test]
    fn test_failed_reserve_stages_no_orphan_objects() {
        let mut doc = Document::parse(&pdf_with_broken_acroform()).unwrap();
        assert!(matches!(
            doc.add_signature_placeholder(request(), 8, (150.0, 50.0), None, &[]),
            Err(Error::MalformedDocument(_))
        ));
        assert!(doc.signature_byte_range().is_none());

        // The next successful call must not embed the failed call's objects
        let bytes = doc
            .add_sign_annotation(PlacementRequest {
                selector: PageSelector::First,
                anchor: Anchor::TopLeft,
            })
            .unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("/Type /Sig"));
        assert!(!text.contains("/Subtype /Widget"));
        assert!(text.contains("/Subtype /FreeText"));
    }

    #[test]
    fn test_double_reserve_fails() {
        let mut doc = Document::parse(&sample_pdf()).unwrap();
        doc.add_signature_placeholder(request(), 8, (150.0, 50.0), None, &[])
            .unwrap();
        assert!(matches!(
            doc.add_signature_placeholder(request(), 8, (150.0, 50.0), None, &[]),
            Err(Error::PlaceholderAlreadyReserved)
        ));
    }

    #[test]
    fn test_sign_changes_only_the_hex_window() {
        let mut doc = Document::parse(&sample_pdf()).unwrap();
        let placed = doc
            .add_signature_placeholder(request(), 8, (150.0, 50.0), None, &[])
            .unwrap();
        let [_, l1, o2, _] = doc.signature_byte_range().unwrap();

        let signed = doc.sign_document(&[0xAB; 8]).unwrap();
        assert_eq!(placed.len(), signed.len());
        for (i, (a, b)) in placed.iter().zip(&signed).enumerate() {
            let inside = i > l1 as usize && i < o2 as usize - 1;
            if inside {
                continue;
            }
            assert_eq!(a, b, "byte {} outside the hex window changed", i);
        }
        assert_eq!(
            &signed[l1 as usize + 1..l1 as usize + 17],
            b"ABABABABABABABAB"
        );
    }

    #[test]
    fn test_sign_size_boundary() {
        let mut doc = Document::parse(&sample_pdf()).unwrap();
        doc.add_signature_placeholder(request(), 8, (150.0, 50.0), None, &[])
            .unwrap();
        assert!(matches!(
            doc.sign_document(&[0u8; 9]),
            Err(Error::SignatureTooLarge {
                len: 9,
                reserved: 8
            })
        ));
        // The failed attempt must not consume the reservation
        assert!(doc.sign_document(&[0u8; 8]).is_ok());
    }

    #[test]
    fn test_short_signature_is_zero_padded() {
        let mut doc = Document::parse(&sample_pdf()).unwrap();
        doc.add_signature_placeholder(request(), 8, (150.0, 50.0), None, &[])
            .unwrap();
        let [_, l1, o2, _] = doc.signature_byte_range().unwrap();

        let signed = doc.sign_document(&[0xFF; 4]).unwrap();
        let window = &signed[l1 as usize + 1..o2 as usize - 1];
        assert_eq!(&window[..8], b"FFFFFFFF");
        assert!(window[8..].iter().all(|&b| b == b'0'));
    }

    #[test]
    fn test_sign_without_reservation_fails() {
        let mut doc = Document::parse(&sample_pdf()).unwrap();
        assert!(matches!(
            doc.sign_document(&[1, 2, 3]),
            Err(Error::PlaceholderNotFound)
        ));
    }

    #[test]
    fn test_reservation_consumed_exactly_once() {
        let mut doc = Document::parse(&sample_pdf()).unwrap();
        doc.add_signature_placeholder(request(), 8, (150.0, 50.0), None, &[])
            .unwrap();
        doc.sign_document(&[0xCD; 8]).unwrap();
        assert!(matches!(
            doc.sign_document(&[0xCD; 8]),
            Err(Error::PlaceholderNotFound)
        ));
    }

    #[test]
    fn test_signed_bytes_skips_the_window() {
        let mut doc = Document::parse(&sample_pdf()).unwrap();
        let bytes = doc
            .add_signature_placeholder(request(), 8, (150.0, 50.0), None, &[])
            .unwrap();
        let range = doc.signature_byte_range().unwrap();

        let covered = signed_bytes(&bytes, &range).unwrap();
        assert_eq!(covered.len(), bytes.len() - (2 * 8 + 2));
        assert!(!covered.windows(4).any(|w| w == b"<000"));
    }

    #[test]
    fn test_signed_bytes_rejects_bad_range() {
        assert!(signed_bytes(b"short", &[0, 2, 4, 100]).is_err());
        assert!(signed_bytes(b"short", &[0, -1, 2, 1]).is_err());
    }
}
