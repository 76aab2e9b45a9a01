// src/services/mod.rs
pub mod fetcher;
pub mod fingerprint;
pub mod geometry;
pub mod image_processor;
pub mod object_store;
pub mod orientation;
pub mod record_store;
pub mod resizer;
pub mod validator;

pub use fetcher::HttpFetcher;
pub use image_processor::ImageProcessor;
pub use object_store::LocalObjectStore;
pub use record_store::RedisRecordStore;
pub use resizer::{Outcome, Resizer};
