//! Diagonal text watermarks.
//!
//! A watermark is an extra content stream appended to the page's `/Contents`
//! array, so existing page content is never touched and repeated calls stack
//! one layer each. The text runs along the page diagonal, centered.

use std::collections::HashMap;
use std::time::Instant;

use bytes::Bytes;

use crate::capability::Action;
use crate::document::{Document, PageSelector};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::object::{Object, ObjectRef};

/// Resource name the watermark font is registered under.
const FONT_KEY: &str = "WMFont";

impl Document {
    /// Draw `text` diagonally across the requested pages.
    ///
    /// `pages` holds 1-based indices. Indices without a page are skipped with
    /// a warning; the call fails with [`Error::PageNotFound`] only when none
    /// of the requested pages exist.
    pub fn add_watermark(
        &mut self,
        text: &str,
        pages: &[u32],
        font_size: f32,
        color: (f32, f32, f32),
    ) -> Result<Vec<u8>> {
        let started = Instant::now();
        let result = self.paint_watermark(text, pages, font_size, color);
        if result.is_err() {
            self.staged.clear();
        }
        self.emit(Action::AddWatermark, started, &result);
        result
    }

    fn paint_watermark(
        &mut self,
        text: &str,
        pages: &[u32],
        font_size: f32,
        color: (f32, f32, f32),
    ) -> Result<Vec<u8>> {
        let count = self.page_count();
        let valid: Vec<u32> = pages
            .iter()
            .copied()
            .filter(|&index| index >= 1 && index <= count)
            .collect();
        for &index in pages {
            if !(1..=count).contains(&index) {
                log::warn!(
                    "watermark skipped page {} (document has {} pages)",
                    index,
                    count
                );
            }
        }
        if valid.is_empty() {
            return Err(Error::PageNotFound {
                requested: pages.first().copied().unwrap_or(0),
                page_count: count,
            });
        }

        let font_id = self.allocate_object_id();
        let mut font = HashMap::new();
        font.insert("Type".to_string(), Object::Name("Font".to_string()));
        font.insert("Subtype".to_string(), Object::Name("Type1".to_string()));
        font.insert("BaseFont".to_string(), Object::Name("Helvetica".to_string()));
        self.stage(font_id, Object::Dictionary(font));

        for index in valid {
            let page_ref = self.locate_page(PageSelector::Index(index))?;
            let media_box = self.media_box(page_ref)?;

            let stream_id = self.allocate_object_id();
            let content = watermark_content(text, font_size, color, media_box);
            self.stage(
                stream_id,
                Object::Stream {
                    dict: HashMap::new(),
                    data: Bytes::from(content.into_bytes()),
                },
            );
            self.attach_layer(page_ref, ObjectRef::new(stream_id, 0), ObjectRef::new(font_id, 0))?;
        }
        self.commit()
    }

    /// Append the layer stream to `/Contents` and register the font under
    /// `/Resources /Font`, restaging indirect containers in place.
    fn attach_layer(
        &mut self,
        page_ref: ObjectRef,
        layer: ObjectRef,
        font: ObjectRef,
    ) -> Result<()> {
        let page = self.load_object(page_ref)?;
        let mut page_dict = page.as_dict().cloned().ok_or_else(|| {
            Error::MalformedDocument(format!("page {} is not a dictionary", page_ref))
        })?;

        match page_dict.get("Contents") {
            None => {
                page_dict.insert(
                    "Contents".to_string(),
                    Object::Array(vec![Object::Reference(layer)]),
                );
            },
            Some(Object::Array(existing)) => {
                let mut contents = existing.clone();
                contents.push(Object::Reference(layer));
                page_dict.insert("Contents".to_string(), Object::Array(contents));
            },
            Some(Object::Reference(r)) => {
                let r = *r;
                match self.load_object(r)? {
                    Object::Array(mut contents) => {
                        contents.push(Object::Reference(layer));
                        self.stage(r.id, Object::Array(contents));
                    },
                    Object::Stream { .. } => {
                        page_dict.insert(
                            "Contents".to_string(),
                            Object::Array(vec![
                                Object::Reference(r),
                                Object::Reference(layer),
                            ]),
                        );
                    },
                    _ => {
                        return Err(Error::MalformedDocument(format!(
                            "/Contents of {} is neither stream nor array",
                            page_ref
                        )));
                    },
                }
            },
            Some(_) => {
                return Err(Error::MalformedDocument(format!(
                    "/Contents of {} is neither stream nor array",
                    page_ref
                )));
            },
        }

        let resources_ref = page_dict.get("Resources").and_then(|o| o.as_reference());
        let mut resources = match page_dict.get("Resources") {
            Some(obj) => self.resolve(obj)?.as_dict().cloned().ok_or_else(|| {
                Error::MalformedDocument(format!("/Resources of {} is not a dictionary", page_ref))
            })?,
            None => HashMap::new(),
        };
        let mut fonts = match resources.get("Font") {
            Some(obj) => self.resolve(obj)?.as_dict().cloned().ok_or_else(|| {
                Error::MalformedDocument(format!("/Font of {} is not a dictionary", page_ref))
            })?,
            None => HashMap::new(),
        };
        fonts.insert(FONT_KEY.to_string(), Object::Reference(font));
        resources.insert("Font".to_string(), Object::Dictionary(fonts));

        match resources_ref {
            Some(r) => self.stage(r.id, Object::Dictionary(resources)),
            None => {
                page_dict.insert("Resources".to_string(), Object::Dictionary(resources));
            },
        }

        self.stage(page_ref.id, Object::Dictionary(page_dict));
        Ok(())
    }
}

/// Build the layer's content stream: text rotated along the page diagonal,
/// centered on the page.
fn watermark_content(text: &str, font_size: f32, color: (f32, f32, f32), media_box: Rect) -> String {
    let angle = (media_box.height / media_box.width.max(1.0)).atan();
    let (sin, cos) = angle.sin_cos();

    // Helvetica averages about half an em per glyph
    let text_width = text.len() as f32 * font_size * 0.5;
    let center = media_box.center();
    let tx = center.x - 0.5 * text_width * cos;
    let ty = center.y - 0.5 * text_width * sin;

    format!(
        "q\n{r:.3} {g:.3} {b:.3} rg\nBT\n/{font} {size} Tf\n{cos:.4} {sin:.4} {nsin:.4} {cos:.4} {tx:.2} {ty:.2} Tm\n({text}) Tj\nET\nQ\n",
        r = color.0,
        g = color.1,
        b = color.2,
        font = FONT_KEY,
        size = font_size,
        cos = cos,
        sin = sin,
        nsin = -sin,
        tx = tx,
        ty = ty,
        text = escape_text(text),
    )
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}
