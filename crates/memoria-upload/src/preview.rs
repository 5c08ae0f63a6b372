//! Image pre-processing: preview thumbnails and crop
//!
//! Previews are inline PNG thumbnails. A file the decoder cannot read gets no preview;
//! deciding whether the photo is acceptable is left to the local and remote gates.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GenericImageView, ImageFormat};
use memoria_core::constants::{CROPPED_CONTENT_TYPE, CROPPED_FILENAME};
use memoria_core::models::{PhotoFile, Preview};
use memoria_core::UploadError;
use std::io::Cursor;
use std::str::FromStr;

/// Pixel rectangle to keep when cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FromStr for CropRegion {
    type Err = UploadError;

    /// Parse `x,y,width,height`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|_| {
                UploadError::InvalidInput(format!(
                    "Invalid crop region '{}': expected x,y,width,height",
                    s
                ))
            })?;

        match parts.as_slice() {
            [x, y, width, height] if *width > 0 && *height > 0 => Ok(CropRegion {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
            }),
            _ => Err(UploadError::InvalidInput(format!(
                "Invalid crop region '{}': expected four values with non-zero size",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    max_dimension: u32,
}

impl ImagePreprocessor {
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    /// Inline thumbnail for a selected file, or [`Preview::None`] when it cannot be decoded.
    pub fn preview(&self, file: &PhotoFile) -> Preview {
        match self.render_preview(&file.bytes) {
            Ok(data_url) => Preview::DataUrl(data_url),
            Err(e) => {
                tracing::debug!(
                    file = %file.filename,
                    error = %e,
                    "Could not render preview"
                );
                Preview::None
            }
        }
    }

    fn render_preview(&self, data: &[u8]) -> Result<String, anyhow::Error> {
        let img = image::load_from_memory(data)?;
        let thumb = img.thumbnail(self.max_dimension, self.max_dimension);
        let png = encode_png(&thumb)?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }

    /// Wrap the output of an external crop widget.
    pub fn cropped_file(&self, bytes: impl Into<bytes::Bytes>) -> PhotoFile {
        PhotoFile::new(CROPPED_FILENAME, CROPPED_CONTENT_TYPE, bytes)
    }

    /// Crop `file` to `region` and re-encode it as PNG. `None` keeps the whole frame.
    pub fn crop(
        &self,
        file: &PhotoFile,
        region: Option<CropRegion>,
    ) -> Result<PhotoFile, UploadError> {
        let img = image::load_from_memory(&file.bytes).map_err(|e| {
            UploadError::InvalidInput(format!("{}: cannot decode image: {}", file.filename, e))
        })?;

        let (width, height) = img.dimensions();
        let region = region.unwrap_or(CropRegion {
            x: 0,
            y: 0,
            width,
            height,
        });
        let fits = region
            .x
            .checked_add(region.width)
            .is_some_and(|right| right <= width)
            && region
                .y
                .checked_add(region.height)
                .is_some_and(|bottom| bottom <= height);
        if !fits {
            return Err(UploadError::InvalidInput(format!(
                "Crop region {}x{}+{}+{} is outside the {}x{} image",
                region.width, region.height, region.x, region.y, width, height
            )));
        }

        let cropped = img.crop_imm(region.x, region.y, region.width, region.height);
        let png = encode_png(&cropped)
            .map_err(|e| UploadError::InvalidInput(format!("Failed to encode crop: {}", e)))?;

        tracing::debug!(
            file = %file.filename,
            width = region.width,
            height = region.height,
            "Cropped image"
        );

        Ok(self.cropped_file(png))
    }
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Encoded test images.
#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([120, 90, 60]),
    ));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode test png");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crop_region() {
        let region: CropRegion = "10, 20,30,40".parse().unwrap();
        assert_eq!(
            region,
            CropRegion {
                x: 10,
                y: 20,
                width: 30,
                height: 40
            }
        );
        assert!("1,2,3".parse::<CropRegion>().is_err());
        assert!("0,0,0,10".parse::<CropRegion>().is_err());
        assert!("a,b,c,d".parse::<CropRegion>().is_err());
    }

    #[test]
    fn test_preview_is_bounded_png_data_url() {
        let pre = ImagePreprocessor::new(32);
        let file = PhotoFile::new("big.png", "image/png", test_png(200, 100));
        let Preview::DataUrl(url) = pre.preview(&file) else {
            panic!("expected data url preview");
        };
        let encoded = url.strip_prefix("data:image/png;base64,").unwrap();
        let decoded = image::load_from_memory(&STANDARD.decode(encoded).unwrap()).unwrap();
        let (w, h) = decoded.dimensions();
        assert!(w <= 32 && h <= 32);
    }

    #[test]
    fn test_undecodable_file_has_no_preview() {
        let pre = ImagePreprocessor::new(32);
        let file = PhotoFile::new("x.jpg", "image/jpeg", vec![0u8; 64]);
        assert!(pre.preview(&file).is_none());
    }

    #[test]
    fn test_crop_produces_png_of_region() {
        let pre = ImagePreprocessor::new(32);
        let file = PhotoFile::new("p.png", "image/png", test_png(100, 80));
        let region = CropRegion {
            x: 10,
            y: 10,
            width: 50,
            height: 40,
        };
        let out = pre.crop(&file, Some(region)).unwrap();
        assert_eq!(out.filename, CROPPED_FILENAME);
        assert_eq!(out.content_type, CROPPED_CONTENT_TYPE);
        let img = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(img.dimensions(), (50, 40));
    }

    #[test]
    fn test_full_frame_is_reencoded_as_png() {
        let pre = ImagePreprocessor::new(32);
        let file = PhotoFile::new("p.png", "image/png", test_png(30, 20));
        let out = pre.crop(&file, None).unwrap();
        assert_eq!(out.content_type, CROPPED_CONTENT_TYPE);
        let img = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(img.dimensions(), (30, 20));
    }

    #[test]
    fn test_crop_outside_bounds_fails() {
        let pre = ImagePreprocessor::new(32);
        let file = PhotoFile::new("p.png", "image/png", test_png(20, 20));
        let region = CropRegion {
            x: 10,
            y: 10,
            width: 20,
            height: 5,
        };
        assert!(matches!(
            pre.crop(&file, Some(region)),
            Err(UploadError::InvalidInput(_))
        ));
    }
}
