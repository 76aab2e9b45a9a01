// src/services/resizer.rs
use crate::errors::ResizerError;
use crate::models::{CacheRecord, Geometry, RenderedImage, ResizeParams, ResizePlan};
use crate::services::fetcher::SourceFetcher;
use crate::services::fingerprint::{md5_hex, normalized_fingerprint, validated_fingerprint};
use crate::services::geometry::normalize;
use crate::services::image_processor::{self, ImageProcessor};
use crate::services::object_store::ObjectStore;
use crate::services::record_store::RecordStore;
use crate::services::validator::{validate, ValidationRules};
use bytes::Bytes;
use image::GenericImageView;
use log::{debug, error, info};
use std::sync::Arc;
use uuid::Uuid;

/// Result of the synchronous part of a request.
#[derive(Debug)]
pub enum Outcome {
    /// An equivalent resize already exists at this URL.
    Redirect(String),
    /// Freshly encoded; the caller should respond, then hand it to [`Resizer::persist`].
    Rendered(RenderedImage),
}

pub struct Resizer {
    rules: ValidationRules,
    records: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
    fetcher: Arc<dyn SourceFetcher>,
    processor: ImageProcessor,
}

impl Resizer {
    pub fn new(
        rules: ValidationRules,
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
        fetcher: Arc<dyn SourceFetcher>,
        processor: ImageProcessor,
    ) -> Self {
        Self {
            rules,
            records,
            objects,
            fetcher,
            processor,
        }
    }

    pub async fn process(&self, params: &ResizeParams) -> Result<Outcome, ResizerError> {
        let request = validate(params, &self.rules)?;
        let fingerprint = validated_fingerprint(&request)?;
        let mut plan = ResizePlan::new(request, fingerprint);

        if let Some(record) = self.records.find_validated(&plan.validated_lookup()).await? {
            info!(
                "validated cache hit: {} -> {}",
                plan.validated_fingerprint, record.object_name
            );
            return Ok(Outcome::Redirect(self.objects.public_url(&record.object_name)));
        }
        info!("validated cache miss: {:?}", plan.request);

        let source: Bytes = self.fetcher.fetch(&plan.request.source_url).await?;
        let img = self
            .processor
            .execute(move || image_processor::decode(&source))
            .await?;

        let geometry = normalize(&plan.request, img.dimensions())?;
        plan.normalized_fingerprint = Some(normalized_fingerprint(&plan.request, &geometry)?);
        plan.geometry = Some(geometry);

        let lookup = plan
            .normalized_lookup()
            .ok_or_else(|| ResizerError::Geometry("plan wasn't normalized".to_string()))?;
        if let Some(record) = self.records.find_normalized(&lookup).await? {
            info!(
                "normalized cache hit: {} -> {}",
                lookup.fingerprint, record.object_name
            );
            return Ok(Outcome::Redirect(self.objects.public_url(&record.object_name)));
        }
        info!("normalized cache miss: {:?}", geometry);

        let (method, format, quality) = (plan.request.method, plan.request.format, plan.request.quality);
        let (data, canvas) = self
            .processor
            .execute(move || {
                let resized = image_processor::resize(img, method, &geometry)?;
                let canvas = resized.dimensions();
                Ok((image_processor::encode(&resized, format, quality)?, canvas))
            })
            .await?;

        let record = Self::record_for(&plan, &lookup.fingerprint, &geometry, &data, canvas);
        debug!(
            "{} resize encoded {} bytes as {} (quality {})",
            method.as_str(),
            data.len(),
            format.as_str(),
            quality
        );

        Ok(Outcome::Rendered(RenderedImage {
            data: Bytes::from(data),
            record,
        }))
    }

    fn record_for(
        plan: &ResizePlan,
        normalized_fingerprint: &str,
        geometry: &Geometry,
        data: &[u8],
        canvas: (u32, u32),
    ) -> CacheRecord {
        let request = &plan.request;
        let id = Uuid::new_v4();
        CacheRecord {
            id,
            source_url: request.source_url.clone(),
            validated_fingerprint: plan.validated_fingerprint.clone(),
            normalized_fingerprint: normalized_fingerprint.to_string(),
            method: request.method,
            format: request.format,
            quality: request.quality,
            width: request.width,
            height: request.height,
            dest_width: geometry.dest_width,
            dest_height: geometry.dest_height,
            canvas_width: canvas.0,
            canvas_height: canvas.1,
            object_name: format!("{}.{}", id, request.format.extension()),
            content_type: request.format.content_type().to_string(),
            etag: md5_hex(data),
            created_at: chrono::Utc::now(),
        }
    }

    /// Uploads the object, then records it. Failures only cost future cache hits.
    pub async fn persist(&self, rendered: RenderedImage) {
        let record = &rendered.record;
        if let Err(e) = self
            .objects
            .upload(&record.object_name, &rendered.data, &record.content_type)
            .await
        {
            error!("fail to upload {}: {}", record.object_name, e);
            return;
        }
        if let Err(e) = self.records.insert(record).await {
            error!("fail to record {}: {}", record.object_name, e);
            return;
        }
        debug!("complete save: {}", record.object_name);
    }
}
