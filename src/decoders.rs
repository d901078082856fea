//! Stream filter decoding.
//!
//! Only the filters the mutation engine actually encounters are decoded:
//! FlateDecode (with optional TIFF/PNG predictors), as used by cross-reference
//! streams and compressed content streams. Image filters such as DCTDecode are
//! never decoded here; image data passes through untouched.

use std::io::Read;

use crate::error::{Error, Result};

/// Cap on decompressed output, to bound memory on hostile input.
const MAX_DECOMPRESSED_SIZE: usize = 100 * 1024 * 1024;

/// Predictor parameters from a stream's /DecodeParms entry.
#[derive(Debug, Clone)]
pub struct DecodeParams {
    /// Predictor algorithm (1 = none, 2 = TIFF, 10-15 = PNG)
    pub predictor: i64,
    /// Number of columns (width in samples)
    pub columns: usize,
    /// Number of color components per sample (default 1)
    pub colors: usize,
    /// Bits per component (default 8)
    pub bits_per_component: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            columns: 1,
            colors: 1,
            bits_per_component: 8,
        }
    }
}

impl DecodeParams {
    /// Bytes per encoded row, including the PNG predictor tag byte when present.
    pub fn bytes_per_row(&self) -> usize {
        let pixel_bytes = (self.columns * self.colors * self.bits_per_component + 7) / 8;
        if self.predictor >= 10 {
            pixel_bytes + 1
        } else {
            pixel_bytes
        }
    }

    /// Bytes of pixel data per row, without the predictor tag.
    pub fn pixel_bytes_per_row(&self) -> usize {
        (self.columns * self.colors * self.bits_per_component + 7) / 8
    }
}

/// Decode stream data through a filter chain.
///
/// Filters are applied in order. Unsupported filters are reported as
/// [`Error::MalformedDocument`] rather than passed through silently.
pub fn decode_stream(
    data: &[u8],
    filters: &[String],
    params: Option<&DecodeParams>,
) -> Result<Vec<u8>> {
    let mut current = data.to_vec();
    for filter_name in filters {
        current = match filter_name.as_str() {
            "FlateDecode" | "Fl" => {
                let inflated = inflate(&current)?;
                match params {
                    Some(p) => decode_predictor(&inflated, p)?,
                    None => inflated,
                }
            },
            other => {
                return Err(Error::MalformedDocument(format!(
                    "unsupported stream filter: {}",
                    other
                )));
            },
        };
    }
    Ok(current)
}

/// Inflate zlib-wrapped data, falling back to raw deflate for streams
/// written without the zlib header.
fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    match decoder
        .by_ref()
        .take(MAX_DECOMPRESSED_SIZE as u64 + 1)
        .read_to_end(&mut output)
    {
        Ok(_) => {},
        Err(_) => {
            output.clear();
            let mut raw = flate2::read::DeflateDecoder::new(data);
            raw.by_ref()
                .take(MAX_DECOMPRESSED_SIZE as u64 + 1)
                .read_to_end(&mut output)
                .map_err(|e| Error::MalformedDocument(format!("flate decode failed: {}", e)))?;
        },
    }
    if output.len() > MAX_DECOMPRESSED_SIZE {
        return Err(Error::MalformedDocument(
            "decompressed stream exceeds size limit".to_string(),
        ));
    }
    Ok(output)
}

/// Compress data with zlib, the encoding used for streams this crate writes.
pub fn deflate(data: &[u8]) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // Writing to a Vec cannot fail
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

/// Reverse predictor encoding on inflated data.
pub fn decode_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => decode_tiff_predictor(data, params),
        10..=15 => decode_png_predictor(data, params),
        _ => Err(Error::MalformedDocument(format!(
            "unsupported predictor: {}",
            params.predictor
        ))),
    }
}

fn decode_tiff_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    let bytes_per_row = params.pixel_bytes_per_row();
    let colors = params.colors;

    if bytes_per_row == 0 || data.len() % bytes_per_row != 0 {
        return Err(Error::MalformedDocument(format!(
            "predictor data length {} is not a multiple of row size {}",
            data.len(),
            bytes_per_row
        )));
    }

    let mut output = Vec::with_capacity(data.len());

    for row_data in data.chunks(bytes_per_row) {
        for i in 0..colors.min(row_data.len()) {
            output.push(row_data[i]);
        }
        for i in colors..row_data.len() {
            let left = output[output.len() - colors];
            output.push(row_data[i].wrapping_add(left));
        }
    }

    Ok(output)
}

/// PNG predictors carry a per-row tag byte selecting the filter for that row.
fn decode_png_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    let bytes_per_row = params.bytes_per_row();
    let pixel_bytes = params.pixel_bytes_per_row();

    if bytes_per_row == 0 || data.len() % bytes_per_row != 0 {
        return Err(Error::MalformedDocument(format!(
            "predictor data length {} is not a multiple of row size {}",
            data.len(),
            bytes_per_row
        )));
    }

    let row_count = data.len() / bytes_per_row;
    let mut output = Vec::with_capacity(row_count * pixel_bytes);
    let bpp = (params.colors * params.bits_per_component + 7) / 8;

    for row_idx in 0..row_count {
        let row_start = row_idx * bytes_per_row;
        let row_data = &data[row_start..row_start + bytes_per_row];
        let tag = row_data[0];
        let encoded = &row_data[1..];

        match tag {
            0 => output.extend_from_slice(encoded),
            1 => decode_png_sub(encoded, &mut output, bpp),
            2 => decode_png_up(encoded, &mut output, row_idx, pixel_bytes),
            3 => decode_png_average(encoded, &mut output, row_idx, pixel_bytes, bpp),
            4 => decode_png_paeth(encoded, &mut output, row_idx, pixel_bytes, bpp),
            _ => {
                return Err(Error::MalformedDocument(format!(
                    "invalid PNG predictor tag: {}",
                    tag
                )));
            },
        }
    }

    Ok(output)
}

fn decode_png_sub(encoded: &[u8], output: &mut Vec<u8>, bpp: usize) {
    let start = output.len();
    for (i, &byte) in encoded.iter().enumerate() {
        let left = if i >= bpp { output[start + i - bpp] } else { 0 };
        output.push(byte.wrapping_add(left));
    }
}

fn decode_png_up(encoded: &[u8], output: &mut Vec<u8>, row_idx: usize, pixel_bytes: usize) {
    for (i, &byte) in encoded.iter().enumerate() {
        let up = if row_idx > 0 {
            output[(row_idx - 1) * pixel_bytes + i]
        } else {
            0
        };
        output.push(byte.wrapping_add(up));
    }
}

fn decode_png_average(
    encoded: &[u8],
    output: &mut Vec<u8>,
    row_idx: usize,
    pixel_bytes: usize,
    bpp: usize,
) {
    let start = output.len();
    for (i, &byte) in encoded.iter().enumerate() {
        let left = if i >= bpp {
            output[start + i - bpp] as u16
        } else {
            0
        };
        let up = if row_idx > 0 {
            output[(row_idx - 1) * pixel_bytes + i] as u16
        } else {
            0
        };
        output.push(byte.wrapping_add(((left + up) / 2) as u8));
    }
}

fn decode_png_paeth(
    encoded: &[u8],
    output: &mut Vec<u8>,
    row_idx: usize,
    pixel_bytes: usize,
    bpp: usize,
) {
    let start = output.len();
    for (i, &byte) in encoded.iter().enumerate() {
        let left = if i >= bpp {
            output[start + i - bpp] as i16
        } else {
            0
        };
        let up = if row_idx > 0 {
            output[(row_idx - 1) * pixel_bytes + i] as i16
        } else {
            0
        };
        let up_left = if row_idx > 0 && i >= bpp {
            output[(row_idx - 1) * pixel_bytes + i - bpp] as i16
        } else {
            0
        };
        output.push(byte.wrapping_add(paeth_predictor(left, up, up_left) as u8));
    }
}

fn paeth_predictor(a: i16, b: i16, c: i16) -> i16 {
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
