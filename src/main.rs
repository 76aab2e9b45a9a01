// src/main.rs
use actix_files::Files;
use actix_web::http::header;
use actix_web::{App, HttpServer, middleware, web};
use anyhow::Context;
use log::info;
use std::sync::Arc;

mod config;
mod errors;
mod handlers;
mod models;
mod services;

use crate::config::Config;
use crate::handlers::{health_check, resize_image};
use crate::services::validator::ValidationRules;
use crate::services::{HttpFetcher, ImageProcessor, LocalObjectStore, RedisRecordStore, Resizer};

/// Six months, for objects that never change once written.
const OBJECT_CACHE_CONTROL: &str = "public, max-age=15552000";

#[derive(Clone)]
pub struct AppState {
    resizer: Arc<Resizer>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting resizer service...");

    let config = Config::from_env().context("invalid configuration")?;
    if config.allowed_hosts.is_empty() {
        info!("ALLOWED_HOSTS is empty, every source host is allowed");
    }

    // Initialize services
    let records = Arc::new(
        RedisRecordStore::new(&config.redis_url)
            .await
            .with_context(|| format!("can't connect to {}", config.redis_url))?,
    );
    let objects = Arc::new(
        LocalObjectStore::new(config.storage_dir.clone(), &config.public_base_url)
            .await
            .context("can't prepare object storage")?,
    );
    let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout).context("can't build HTTP client")?);
    let rules = ValidationRules {
        allowed_hosts: config.allowed_hosts.clone(),
        quality_zero_is_default: config.quality_zero_is_default,
    };
    let resizer = Resizer::new(
        rules,
        records,
        objects,
        fetcher,
        ImageProcessor::new(config.processing_workers),
    );

    let app_state = AppState {
        resizer: Arc::new(resizer),
    };

    info!(
        "Starting HTTP server on {} ({} processing worker(s))",
        config.bind_addr, config.processing_workers
    );

    let storage_dir = config.storage_dir.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .route("/", web::get().to(resize_image))
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/objects")
                    .wrap(
                        middleware::DefaultHeaders::new()
                            .add((header::CACHE_CONTROL, OBJECT_CACHE_CONTROL)),
                    )
                    .service(Files::new("/", &storage_dir)),
            )
    })
    .max_connections(config.max_http_connections)
    .bind(&config.bind_addr)?
    .run()
    .await?;

    Ok(())
}
