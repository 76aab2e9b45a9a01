// src/services/geometry.rs
use crate::errors::ResizerError;
use crate::models::{Geometry, RequestSpec, ResizeMethod};

/// Computes the resized pixel size and the output canvas for a source of
/// `source` = (width, height).
///
/// Every float-to-integer conversion truncates toward zero; stored cache
/// records depend on that exact rounding.
pub fn normalize(request: &RequestSpec, source: (u32, u32)) -> Result<Geometry, ResizerError> {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return Err(ResizerError::Geometry(format!(
            "source size must not be zero: {}x{}",
            src_w, src_h
        )));
    }
    if request.width == 0 && request.height == 0 {
        return Err(ResizerError::Geometry(
            "target size must not be zero".to_string(),
        ));
    }

    let sx = src_w as f64;
    let sy = src_h as f64;
    let ratio = sx / sy;

    let mut dx = request.width as f64;
    let mut dy = request.height as f64;
    if request.width == 0 {
        dx = dy * ratio;
    }
    if request.height == 0 {
        dy = dx / ratio;
    }

    // Never upscale.
    if dx >= sx && dy >= sy {
        return Ok(Geometry::uniform(src_w, src_h));
    }

    if request.is_single_axis() {
        return Ok(Geometry::uniform(dx as u32, dy as u32));
    }

    match request.method {
        ResizeMethod::Contain => {
            let target_ratio = dx / dy;
            if target_ratio == ratio {
                Ok(Geometry::uniform(request.width, request.height))
            } else if target_ratio > ratio {
                Ok(Geometry::uniform((dy * ratio) as u32, request.height))
            } else {
                Ok(Geometry::uniform(request.width, (dx / ratio) as u32))
            }
        }
        ResizeMethod::Cover => {
            let rx = (dx / sx).min(1.0);
            let ry = (dy / sy).min(1.0);
            let scale = rx.max(ry);
            let cover_w = sx * scale;
            let cover_h = sy * scale;
            Ok(Geometry {
                dest_width: cover_w as u32,
                dest_height: cover_h as u32,
                canvas_width: dx.min(cover_w) as u32,
                canvas_height: dy.min(cover_h) as u32,
            })
        }
    }
}
