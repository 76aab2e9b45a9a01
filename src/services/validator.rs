// src/services/validator.rs
use crate::errors::ResizerError;
use crate::models::{OutputFormat, RequestSpec, ResizeMethod, ResizeParams};
use reqwest::Url;

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];
const QUALITY_MIN: i64 = 0;
const QUALITY_MAX: i64 = 100;
const QUALITY_DEFAULT: u8 = 100;

/// Settings that shape validation but don't come from the request.
#[derive(Debug, Clone, Default)]
pub struct ValidationRules {
    pub allowed_hosts: Vec<String>,
    /// Treat an explicit `quality=0` like an absent quality for JPEG.
    pub quality_zero_is_default: bool,
}

pub fn validate(params: &ResizeParams, rules: &ValidationRules) -> Result<RequestSpec, ResizerError> {
    let source_url = validate_url(params.url.as_deref(), &rules.allowed_hosts)?;

    let width = parse_int("width", params.width.as_deref())?.unwrap_or(0);
    let height = parse_int("height", params.height.as_deref())?.unwrap_or(0);
    if width < 0 || height < 0 || (width == 0 && height == 0) {
        return Err(ResizerError::InvalidSize(width, height));
    }
    let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(ResizerError::InvalidSize(width, height)),
    };

    let method = match non_empty(params.method.as_deref()) {
        None => ResizeMethod::default(),
        Some(token) => ResizeMethod::parse(token)
            .ok_or_else(|| ResizerError::InvalidMethod(token.to_string()))?,
    };

    let format = match non_empty(params.format.as_deref()) {
        None => OutputFormat::default(),
        Some(token) => OutputFormat::parse(token)
            .ok_or_else(|| ResizerError::InvalidFormat(token.to_string()))?,
    };

    let quality = match format {
        OutputFormat::Jpeg => match parse_int("quality", params.quality.as_deref())? {
            None => QUALITY_DEFAULT,
            Some(0) if rules.quality_zero_is_default => QUALITY_DEFAULT,
            Some(q) if !(QUALITY_MIN..=QUALITY_MAX).contains(&q) => {
                return Err(ResizerError::InvalidQuality(q));
            }
            Some(q) => q as u8,
        },
        OutputFormat::Png | OutputFormat::Gif => 0,
    };

    Ok(RequestSpec {
        source_url,
        method,
        width,
        height,
        format,
        quality,
    })
}

fn validate_url(raw: Option<&str>, allowed_hosts: &[String]) -> Result<String, ResizerError> {
    let raw = non_empty(raw).ok_or(ResizerError::EmptyUrl)?;
    let url = Url::parse(raw).map_err(|e| ResizerError::UrlParse(e.to_string()))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(ResizerError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if !host_allowed(&host, allowed_hosts) {
        return Err(ResizerError::InvalidHost(host));
    }

    Ok(raw.to_string())
}

/// Exact match, or a subdomain of an allowed entry. An empty list allows everything.
pub fn host_allowed(host: &str, allowed_hosts: &[String]) -> bool {
    if allowed_hosts.is_empty() {
        return true;
    }
    allowed_hosts.iter().any(|allowed| {
        let allowed = allowed.trim_start_matches('.');
        host == allowed
            || host
                .strip_suffix(allowed)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_int(key: &'static str, value: Option<&str>) -> Result<Option<i64>, ResizerError> {
    match non_empty(value) {
        None => Ok(None),
        Some(v) => v
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ResizerError::InvalidParameter(key, v.to_string())),
    }
}
