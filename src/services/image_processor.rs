// src/services/image_processor.rs
use crate::errors::ResizerError;
use crate::models::{Geometry, OutputFormat, ResizeMethod};
use crate::services::orientation;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs the CPU-bound decode/resize/encode work with bounded concurrency.
pub struct ImageProcessor {
    permits: Arc<Semaphore>,
}

impl ImageProcessor {
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Runs `job` on the blocking pool once a worker slot is free.
    pub async fn execute<T, F>(&self, job: F) -> Result<T, ResizerError>
    where
        F: FnOnce() -> Result<T, ResizerError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ResizerError::ImageProcessing(format!("worker pool closed: {}", e)))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| ResizerError::ImageProcessing(format!("worker panicked: {}", e)))?
    }
}

/// Decodes `data` and bakes its EXIF orientation into the pixels.
pub fn decode(data: &[u8]) -> Result<DynamicImage, ResizerError> {
    let img = image::load_from_memory(data)
        .map_err(|e| ResizerError::ImageProcessing(format!("Invalid image format: {}", e)))?;
    orientation::correct(img, data)
}

/// Resizes `img` to the planned geometry, cropping the centered canvas for cover.
///
/// An axis that truncated to 0 is rendered one pixel wide; `geometry` itself
/// keeps the truncated value since cache keys are derived from it.
pub fn resize(img: DynamicImage, method: ResizeMethod, geometry: &Geometry) -> Result<DynamicImage, ResizerError> {
    let target = Geometry {
        dest_width: geometry.dest_width.max(1),
        dest_height: geometry.dest_height.max(1),
        canvas_width: geometry.canvas_width.clamp(1, geometry.dest_width.max(1)),
        canvas_height: geometry.canvas_height.clamp(1, geometry.dest_height.max(1)),
    };

    let resized = if img.dimensions() == (target.dest_width, target.dest_height) {
        img
    } else {
        img.resize_exact(
            target.dest_width,
            target.dest_height,
            image::imageops::FilterType::Lanczos3,
        )
    };

    match method {
        ResizeMethod::Contain => Ok(resized),
        ResizeMethod::Cover => {
            if (target.canvas_width, target.canvas_height) == resized.dimensions() {
                return Ok(resized);
            }
            let (x, y) = target.crop_offset();
            Ok(resized.crop_imm(x, y, target.canvas_width, target.canvas_height))
        }
    }
}

pub fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>, ResizerError> {
    let mut output = Vec::new();
    let mut cursor = Cursor::new(&mut output);
    let result = match format {
        // JPEG has no alpha channel
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut cursor, ImageOutputFormat::Jpeg(quality)),
        OutputFormat::Png => img.write_to(&mut cursor, ImageOutputFormat::Png),
        OutputFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_to(&mut cursor, ImageOutputFormat::Gif),
    };
    result.map_err(|e| {
        ResizerError::ImageProcessing(format!("Failed to encode resized image: {}", e))
    })?;
    Ok(output)
}
