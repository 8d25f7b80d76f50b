use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Original,
    Grayscale,
    Invert,
    Blur,
    Brighten,
    FlipHorizontal,
    FlipVertical,
}

impl FilterKind {
    pub const ALL: [FilterKind; 7] = [
        FilterKind::Original,
        FilterKind::Grayscale,
        FilterKind::Invert,
        FilterKind::Blur,
        FilterKind::Brighten,
        FilterKind::FlipHorizontal,
        FilterKind::FlipVertical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Original => "original",
            FilterKind::Grayscale => "grayscale",
            FilterKind::Invert => "invert",
            FilterKind::Blur => "blur",
            FilterKind::Brighten => "brighten",
            FilterKind::FlipHorizontal => "flip_horizontal",
            FilterKind::FlipVertical => "flip_vertical",
        }
    }
}

impl FromStr for FilterKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKind::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown filter: {}", s)))
    }
}

/// Applies a named filter to an encoded image and returns PNG bytes
pub trait ImageFilter: Send + Sync {
    fn apply(&self, image: &[u8], filter: FilterKind) -> Result<Vec<u8>, AppError>;
}

/// In-process filters backed by the `image` crate
#[derive(Debug, Clone)]
pub struct LocalImageFilter {
    blur_sigma: f32,
    brighten_by: i32,
}

impl LocalImageFilter {
    pub fn new() -> Self {
        Self {
            blur_sigma: 2.0,
            brighten_by: 40,
        }
    }
}

impl Default for LocalImageFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageFilter for LocalImageFilter {
    fn apply(&self, image: &[u8], filter: FilterKind) -> Result<Vec<u8>, AppError> {
        let img = image::load_from_memory(image)
            .map_err(|e| AppError::Upstream(format!("could not decode image: {}", e)))?;

        let filtered: DynamicImage = match filter {
            FilterKind::Original => img,
            FilterKind::Grayscale => img.grayscale(),
            FilterKind::Invert => {
                let mut img = img;
                img.invert();
                img
            }
            FilterKind::Blur => img.blur(self.blur_sigma),
            FilterKind::Brighten => img.brighten(self.brighten_by),
            FilterKind::FlipHorizontal => img.fliph(),
            FilterKind::FlipVertical => img.flipv(),
        };

        let mut out = Cursor::new(Vec::new());
        filtered
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| AppError::Upstream(format!("could not encode image: {}", e)))?;

        tracing::debug!(
            "Filter {} applied ({}x{}, {} bytes)",
            filter.as_str(),
            filtered.width(),
            filtered.height(),
            out.get_ref().len()
        );
        Ok(out.into_inner())
    }
}

#[cfg(test)]
pub(crate) fn sample_png() -> Vec<u8> {
    let img = image::RgbImage::from_fn(2, 1, |x, _| {
        if x == 0 {
            image::Rgb([10, 20, 30])
        } else {
            image::Rgb([200, 100, 0])
        }
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
