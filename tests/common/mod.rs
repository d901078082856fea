//! Shared fixtures for integration tests.

#![allow(dead_code)]

use pdf_signet::{Anchor, PageSelector, PlacementRequest};

/// Build a classic-xref PDF with `page_count` pages. Offsets are computed
/// while assembling so the xref is exact.
pub fn sample_pdf(page_count: usize) -> Vec<u8> {
    sample_pdf_sized(page_count, 612.0, 792.0)
}

/// Like [`sample_pdf`] with an explicit media box.
pub fn sample_pdf_sized(page_count: usize, width: f32, height: f32) -> Vec<u8> {
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
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} /MediaBox [0 0 {} {}] >>\nendobj\n",
            kids, page_count, width, height
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

/// A placement on the first page.
pub fn first_page(anchor: Anchor) -> PlacementRequest {
    PlacementRequest {
        selector: PageSelector::First,
        anchor,
    }
}

/// A 2x2 grayscale PNG.
pub fn tiny_png() -> Vec<u8> {
    let img = image::GrayImage::from_raw(2, 2, vec![0u8, 255, 255, 0]).expect("static dimensions");
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("png encode");
    out.into_inner()
}

/// Count occurrences of `needle`.
pub fn occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}
