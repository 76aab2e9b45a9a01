// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the source is fitted into the requested box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMethod {
    /// Fit entirely inside the box, preserving aspect ratio.
    #[default]
    Contain,
    /// Fill the box, then crop the overflow around the center.
    Cover,
}

impl ResizeMethod {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "contain" => Some(ResizeMethod::Contain),
            "cover" => Some(ResizeMethod::Cover),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeMethod::Contain => "contain",
            ResizeMethod::Cover => "cover",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Gif,
}

impl OutputFormat {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "gif" => Some(OutputFormat::Gif),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

/// Raw, untrusted query parameters of a resize request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResizeParams {
    pub url: Option<String>,
    pub method: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub format: Option<String>,
    pub quality: Option<String>,
}

/// A validated resize request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSpec {
    pub source_url: String,
    pub method: ResizeMethod,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: u8,
}

impl RequestSpec {
    /// True when exactly one axis was requested and the other is inferred.
    pub fn is_single_axis(&self) -> bool {
        (self.width == 0) != (self.height == 0)
    }
}

/// Final pixel geometry of a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub dest_width: u32,
    pub dest_height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Geometry {
    pub fn uniform(width: u32, height: u32) -> Self {
        Self {
            dest_width: width,
            dest_height: height,
            canvas_width: width,
            canvas_height: height,
        }
    }

    /// Top-left corner of the canvas inside the resized image.
    pub fn crop_offset(&self) -> (u32, u32) {
        (
            (self.dest_width - self.canvas_width) / 2,
            (self.dest_height - self.canvas_height) / 2,
        )
    }
}

/// The per-request plan, filled in as the pipeline learns more.
#[derive(Debug, Clone)]
pub struct ResizePlan {
    pub request: RequestSpec,
    pub validated_fingerprint: String,
    pub geometry: Option<Geometry>,
    pub normalized_fingerprint: Option<String>,
}

impl ResizePlan {
    pub fn new(request: RequestSpec, validated_fingerprint: String) -> Self {
        Self {
            request,
            validated_fingerprint,
            geometry: None,
            normalized_fingerprint: None,
        }
    }

    pub fn validated_lookup(&self) -> ValidatedLookup {
        ValidatedLookup {
            fingerprint: self.validated_fingerprint.clone(),
            width: self.request.width,
            height: self.request.height,
            method: self.request.method,
            format: self.request.format,
            quality: self.request.quality,
        }
    }

    /// Available once the plan has been normalized.
    pub fn normalized_lookup(&self) -> Option<NormalizedLookup> {
        let geometry = self.geometry?;
        Some(NormalizedLookup {
            fingerprint: self.normalized_fingerprint.clone()?,
            dest_width: geometry.dest_width,
            dest_height: geometry.dest_height,
            method: self.request.method,
            format: self.request.format,
            quality: self.request.quality,
        })
    }
}

/// One memoized resize, stored after a successful encode and upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub id: Uuid,
    pub source_url: String,
    pub validated_fingerprint: String,
    pub normalized_fingerprint: String,
    pub method: ResizeMethod,
    pub format: OutputFormat,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub dest_width: u32,
    pub dest_height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub object_name: String,
    pub content_type: String,
    pub etag: String,
    pub created_at: DateTime<Utc>,
}

/// Exact-match query against the validated tier.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLookup {
    pub fingerprint: String,
    pub width: u32,
    pub height: u32,
    pub method: ResizeMethod,
    pub format: OutputFormat,
    pub quality: u8,
}

impl ValidatedLookup {
    pub fn matches(&self, record: &CacheRecord) -> bool {
        record.validated_fingerprint == self.fingerprint
            && record.width == self.width
            && record.height == self.height
            && record.method == self.method
            && record.format == self.format
            && record.quality == self.quality
    }
}

/// Exact-match query against the normalized tier.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLookup {
    pub fingerprint: String,
    pub dest_width: u32,
    pub dest_height: u32,
    pub method: ResizeMethod,
    pub format: OutputFormat,
    pub quality: u8,
}

impl NormalizedLookup {
    pub fn matches(&self, record: &CacheRecord) -> bool {
        record.normalized_fingerprint == self.fingerprint
            && record.dest_width == self.dest_width
            && record.dest_height == self.dest_height
            && record.method == self.method
            && record.format == self.format
            && record.quality == self.quality
    }
}

/// A freshly encoded image plus the record describing it.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub data: bytes::Bytes,
    pub record: CacheRecord,
}
