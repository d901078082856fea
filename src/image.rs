//! Wet-signature image containers.
//!
//! Images become Image XObjects per PDF section 8.9. JPEG data passes
//! through untouched under DCTDecode; PNG pixels are decoded with the
//! `image` crate and re-compressed with flate.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::object::Object;

/// Encoding of the embedded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// JPEG pass-through (DCTDecode filter)
    Jpeg,
    /// Flate-compressed raw pixels (FlateDecode filter)
    Flate,
}

/// Color space of the pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Grayscale, 1 component per pixel
    DeviceGray,
    /// RGB, 3 components per pixel
    DeviceRGB,
    /// CMYK, 4 components per pixel
    DeviceCMYK,
}

impl ColorSpace {
    /// PDF name for the color space.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
        }
    }
}

/// A decoded wet-signature image ready for embedding.
#[derive(Debug, Clone)]
pub struct SigImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Color space of the payload
    pub color_space: ColorSpace,
    /// Payload encoding
    pub encoding: ImageEncoding,
    /// Encoded payload written into the XObject stream
    pub data: Vec<u8>,
}

impl SigImage {
    /// Load an image, detecting the format from magic bytes.
    ///
    /// PNG and JPEG are accepted; anything else is
    /// [`Error::UnsupportedImageFormat`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
            return Self::from_jpeg(data.to_vec());
        }
        if data.len() >= 8 && &data[..8] == b"\x89PNG\r\n\x1a\n" {
            return Self::from_png(data);
        }
        Err(Error::UnsupportedImageFormat)
    }

    /// Wrap JPEG data for pass-through embedding.
    pub fn from_jpeg(data: Vec<u8>) -> Result<Self> {
        let (width, height, color_space) = parse_jpeg_header(&data)?;
        Ok(Self {
            width,
            height,
            color_space,
            encoding: ImageEncoding::Jpeg,
            data,
        })
    }

    /// Decode PNG data and re-compress the pixels with flate.
    pub fn from_png(data: &[u8]) -> Result<Self> {
        use image::GenericImageView;

        let img = image::load_from_memory_with_format(data, image::ImageFormat::Png)
            .map_err(|_| Error::UnsupportedImageFormat)?;
        let (width, height) = img.dimensions();

        let (color_space, pixels) = match img.color() {
            image::ColorType::L8 | image::ColorType::L16 | image::ColorType::La8
            | image::ColorType::La16 => {
                (ColorSpace::DeviceGray, img.to_luma8().into_raw())
            },
            _ => (ColorSpace::DeviceRGB, img.to_rgb8().into_raw()),
        };

        Ok(Self {
            width,
            height,
            color_space,
            encoding: ImageEncoding::Flate,
            data: crate::decoders::deflate(&pixels),
        })
    }

    /// The Image XObject dictionary for this payload.
    pub fn xobject_dict(&self) -> HashMap<String, Object> {
        let mut dict = HashMap::new();
        dict.insert("Type".to_string(), Object::Name("XObject".to_string()));
        dict.insert("Subtype".to_string(), Object::Name("Image".to_string()));
        dict.insert("Width".to_string(), Object::Integer(self.width as i64));
        dict.insert("Height".to_string(), Object::Integer(self.height as i64));
        dict.insert(
            "ColorSpace".to_string(),
            Object::Name(self.color_space.pdf_name().to_string()),
        );
        dict.insert("BitsPerComponent".to_string(), Object::Integer(8));
        let filter = match self.encoding {
            ImageEncoding::Jpeg => "DCTDecode",
            ImageEncoding::Flate => "FlateDecode",
        };
        dict.insert("Filter".to_string(), Object::Name(filter.to_string()));
        dict
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Largest size with this image's aspect ratio that fits the box.
    pub fn fit_to_box(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        let aspect = self.aspect_ratio();
        if aspect > max_width / max_height {
            (max_width, max_width / aspect)
        } else {
            (max_height * aspect, max_height)
        }
    }
}

/// Scan SOF markers for dimensions and component count.
fn parse_jpeg_header(data: &[u8]) -> Result<(u32, u32, ColorSpace)> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(Error::UnsupportedImageFormat);
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        pos += 2;

        if marker == 0xFF || marker == 0x00 {
            continue;
        }

        // SOF0..SOF15, excluding DHT/JPG/DAC
        if matches!(
            marker,
            0xC0 | 0xC1 | 0xC2 | 0xC3 | 0xC5 | 0xC6 | 0xC7 | 0xC9 | 0xCA | 0xCB | 0xCD | 0xCE
                | 0xCF
        ) {
            if pos + 7 >= data.len() {
                return Err(Error::UnsupportedImageFormat);
            }
            let height = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as u32;
            let width = u16::from_be_bytes([data[pos + 5], data[pos + 6]]) as u32;
            let color_space = match data[pos + 7] {
                1 => ColorSpace::DeviceGray,
                4 => ColorSpace::DeviceCMYK,
                _ => ColorSpace::DeviceRGB,
            };
            if width == 0 || height == 0 {
                return Err(Error::UnsupportedImageFormat);
            }
            return Ok((width, height, color_space));
        }

        if pos + 2 > data.len() {
            break;
        }
        let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        if length < 2 {
            return Err(Error::UnsupportedImageFormat);
        }
        pos += length;
    }

    Err(Error::UnsupportedImageFormat)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_rejects_unknown_format() {
        assert!(matches!(
            SigImage::from_bytes(b"GIF89a...."),
            Err(Error::UnsupportedImageFormat)
        ));
        assert!(matches!(
            SigImage::from_bytes(b""),
            Err(Error::UnsupportedImageFormat)
        ));
    }

    #[test]
    fn test_png_round_trip() {
        let png = testdata::tiny_png();
        let img = SigImage::from_bytes(&png).unwrap();
        assert_eq!(img.width, 2);
        assert_eq!(img.height, 2);
        assert_eq!(img.color_space, ColorSpace::DeviceGray);
        assert_eq!(img.encoding, ImageEncoding::Flate);

        // The payload inflates back to the raw pixels
        let pixels =
            crate::decoders::decode_stream(&img.data, &["FlateDecode".to_string()], None).unwrap();
        assert_eq!(pixels, vec![0u8, 255, 255, 0]);
    }

    #[test]
    fn test_jpeg_header_parsing() {
        let jpeg = testdata::tiny_jpeg_header();
        let img = SigImage::from_bytes(&jpeg).unwrap();
        assert_eq!(img.width, 4);
        assert_eq!(img.height, 3);
        assert_eq!(img.color_space, ColorSpace::DeviceRGB);
        assert_eq!(img.encoding, ImageEncoding::Jpeg);
        // JPEG payload passes through byte for byte
        assert_eq!(img.data, jpeg);
    }

    #[test]
    fn test_truncated_jpeg_is_rejected() {
        assert!(matches!(
            SigImage::from_bytes(&[0xFF, 0xD8, 0xFF]),
            Err(Error::UnsupportedImageFormat)
        ));
    }

    #[test]
    fn test_xobject_dict() {
        let jpeg = testdata::tiny_jpeg_header();
        let img = SigImage::from_bytes(&jpeg).unwrap();
        let dict = img.xobject_dict();
        assert_eq!(dict.get("Subtype"), Some(&Object::Name("Image".to_string())));
        assert_eq!(dict.get("Width"), Some(&Object::Integer(4)));
        assert_eq!(dict.get("Filter"), Some(&Object::Name("DCTDecode".to_string())));
    }

    #[test]
    fn test_fit_to_box_preserves_aspect() {
        let img = SigImage {
            width: 200,
            height: 100,
            color_space: ColorSpace::DeviceRGB,
            encoding: ImageEncoding::Flate,
            data: vec![],
        };
        let (w, h) = img.fit_to_box(100.0, 100.0);
        assert!((w - 100.0).abs() < 0.001);
        assert!((h - 50.0).abs() < 0.001);
    }
}
