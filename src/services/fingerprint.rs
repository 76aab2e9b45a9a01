// src/services/fingerprint.rs
//! Cache keys for the two lookup tiers.
//!
//! Both keys are the MD5 of a canonical JSON document whose field order is
//! fixed by the struct definitions below, so they are stable across
//! restarts and independent of query-string ordering.
use crate::errors::ResizerError;
use crate::models::{Geometry, OutputFormat, RequestSpec, ResizeMethod};
use serde::Serialize;

#[derive(Serialize)]
struct ValidatedKey<'a> {
    url: &'a str,
    method: ResizeMethod,
    width: u32,
    height: u32,
    format: OutputFormat,
    quality: u8,
}

#[derive(Serialize)]
struct NormalizedKey<'a> {
    url: &'a str,
    method: ResizeMethod,
    dest_width: u32,
    dest_height: u32,
    format: OutputFormat,
    quality: u8,
}

/// Key computable before the source is fetched.
pub fn validated_fingerprint(request: &RequestSpec) -> Result<String, ResizerError> {
    digest(&ValidatedKey {
        url: &request.source_url,
        method: request.method,
        width: request.width,
        height: request.height,
        format: request.format,
        quality: request.quality,
    })
}

/// Key over the final pixel size; different targets may share it.
pub fn normalized_fingerprint(request: &RequestSpec, geometry: &Geometry) -> Result<String, ResizerError> {
    digest(&NormalizedKey {
        url: &request.source_url,
        method: request.method,
        dest_width: geometry.dest_width,
        dest_height: geometry.dest_height,
        format: request.format,
        quality: request.quality,
    })
}

/// Hex MD5 of arbitrary bytes, also used for ETags.
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

fn digest<T: Serialize>(key: &T) -> Result<String, ResizerError> {
    let canonical =
        serde_json::to_vec(key).map_err(|e| ResizerError::Serialization(e.to_string()))?;
    Ok(md5_hex(&canonical))
}
