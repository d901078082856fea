//! Wet-signature stamps and "sign here" markers.
//!
//! Both operations add one annotation to a page's `/Annots` and serialize as
//! an incremental revision. A wet signature embeds the image as an XObject
//! drawn by the annotation's appearance stream; the marker is a plain
//! `/FreeText` annotation with no payload.

use std::collections::HashMap;
use std::time::Instant;

use crate::capability::Action;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::image::SigImage;
use crate::object::{Object, ObjectRef};
use crate::placement::{self, PlacementRequest};
use crate::writer::ObjectSerializer;

/// Box size of the "sign here" marker, in points.
pub const SIGN_HERE_SIZE: (f32, f32) = (120.0, 40.0);

/// Annotation flag bit 3: print with the page.
const FLAG_PRINT: i64 = 4;

impl Document {
    /// Stamp a wet-ink signature image onto a page.
    ///
    /// The image is scaled to fit `box_size` with its aspect ratio kept, so
    /// the stamped rect may be smaller than the requested box along one axis.
    pub fn add_wet_signature(
        &mut self,
        location: PlacementRequest,
        image: &SigImage,
        box_size: (f32, f32),
    ) -> Result<Vec<u8>> {
        let started = Instant::now();
        let result = self.stamp_wet_signature(location, image, box_size);
        if result.is_err() {
            self.staged.clear();
        }
        self.emit(Action::AddWetSignature, started, &result);
        result
    }

    /// Place a "Sign here" marker annotation with no cryptographic payload.
    pub fn add_sign_annotation(&mut self, location: PlacementRequest) -> Result<Vec<u8>> {
        let started = Instant::now();
        let result = self.place_sign_marker(location);
        if result.is_err() {
            self.staged.clear();
        }
        self.emit(Action::AddSignAnnotation, started, &result);
        result
    }

    fn stamp_wet_signature(
        &mut self,
        location: PlacementRequest,
        image: &SigImage,
        box_size: (f32, f32),
    ) -> Result<Vec<u8>> {
        let page_ref = self.locate_page(location.selector)?;
        let media_box = self.media_box(page_ref)?;
        let fitted = image.fit_to_box(box_size.0, box_size.1);
        let rect = placement::resolve(location.anchor, media_box, fitted)?;

        let appearance = self.stage_image_appearance(image, rect.width, rect.height);

        let mut annot = HashMap::new();
        annot.insert("Type".to_string(), Object::Name("Annot".to_string()));
        annot.insert("Subtype".to_string(), Object::Name("Stamp".to_string()));
        annot.insert("Rect".to_string(), ObjectSerializer::rect(&rect));
        annot.insert("F".to_string(), Object::Integer(FLAG_PRINT));
        annot.insert("P".to_string(), Object::Reference(page_ref));
        let mut ap = HashMap::new();
        ap.insert("N".to_string(), Object::Reference(appearance));
        annot.insert("AP".to_string(), Object::Dictionary(ap));

        let annot_id = self.allocate_object_id();
        self.stage(annot_id, Object::Dictionary(annot));
        self.append_page_annotation(page_ref, ObjectRef::new(annot_id, 0))?;

        log::debug!(
            "stamped {}x{} image on page object {}",
            image.width,
            image.height,
            page_ref
        );
        self.commit()
    }

    fn place_sign_marker(&mut self, location: PlacementRequest) -> Result<Vec<u8>> {
        let page_ref = self.locate_page(location.selector)?;
        let media_box = self.media_box(page_ref)?;
        let rect = placement::resolve(location.anchor, media_box, SIGN_HERE_SIZE)?;

        let mut annot = HashMap::new();
        annot.insert("Type".to_string(), Object::Name("Annot".to_string()));
        annot.insert("Subtype".to_string(), Object::Name("FreeText".to_string()));
        annot.insert("Rect".to_string(), ObjectSerializer::rect(&rect));
        annot.insert(
            "Contents".to_string(),
            Object::String(b"Sign here".to_vec()),
        );
        annot.insert(
            "DA".to_string(),
            Object::String(b"/Helv 12 Tf 0 0 0 rg".to_vec()),
        );
        annot.insert("F".to_string(), Object::Integer(FLAG_PRINT));
        annot.insert("P".to_string(), Object::Reference(page_ref));

        let annot_id = self.allocate_object_id();
        self.stage(annot_id, Object::Dictionary(annot));
        self.append_page_annotation(page_ref, ObjectRef::new(annot_id, 0))?;
        self.commit()
    }

    /// Append a reference to a page's `/Annots`, array-ifying as needed.
    /// An indirect `/Annots` array is restaged in place; otherwise the page
    /// object itself is restaged.
    pub(crate) fn append_page_annotation(
        &mut self,
        page_ref: ObjectRef,
        annot_ref: ObjectRef,
    ) -> Result<()> {
        let page = self.load_object(page_ref)?;
        let mut page_dict = page.as_dict().cloned().ok_or_else(|| {
            Error::MalformedDocument(format!("page {} is not a dictionary", page_ref))
        })?;

        match page_dict.get("Annots") {
            Some(Object::Reference(r)) => {
                let r = *r;
                let mut annots = self.resolve(&Object::Reference(r))?.as_array().cloned().ok_or_else(
                    || Error::MalformedDocument(format!("/Annots of {} is not an array", page_ref)),
                )?;
                annots.push(Object::Reference(annot_ref));
                self.stage(r.id, Object::Array(annots));
            },
            Some(Object::Array(existing)) => {
                let mut annots = existing.clone();
                annots.push(Object::Reference(annot_ref));
                page_dict.insert("Annots".to_string(), Object::Array(annots));
                self.stage(page_ref.id, Object::Dictionary(page_dict));
            },
            Some(_) => {
                return Err(Error::MalformedDocument(format!(
                    "/Annots of {} is not an array",
                    page_ref
                )));
            },
            None => {
                page_dict.insert(
                    "Annots".to_string(),
                    Object::Array(vec![Object::Reference(annot_ref)]),
                );
                self.stage(page_ref.id, Object::Dictionary(page_dict));
            },
        }
        Ok(())
    }

    /// Number of annotations on a page. Used by hosts to verify placements.
    pub fn annotation_count(&self, page_ref: ObjectRef) -> Result<usize> {
        let page = self.load_object(page_ref)?;
        let dict = page.as_dict().ok_or_else(|| {
            Error::MalformedDocument(format!("page {} is not a dictionary", page_ref))
        })?;
        match dict.get("Annots") {
            Some(obj) => {
                let annots = self.resolve(obj)?;
                annots.as_array().map(|a| a.len()).ok_or_else(|| {
                    Error::MalformedDocument(format!("/Annots of {} is not an array", page_ref))
                })
            },
            None => Ok(0),
        }
    }
}
