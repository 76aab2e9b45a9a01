// src/services/fetcher.rs
use crate::errors::ResizerError;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::TryStreamExt;
use log::{debug, info};
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_3) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/42.0.2311.135 Safari/537.36";

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, ResizerError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ResizerError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ResizerError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }
}

fn fetch_error(url: &str, e: reqwest::Error) -> ResizerError {
    if e.is_timeout() {
        ResizerError::FetchTimeout(url.to_string())
    } else {
        ResizerError::Fetch(format!("fail to GET {}: {}", url, e))
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, ResizerError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            info!("not ok: status={} url={}", status, url);
            return Err(ResizerError::Fetch(format!(
                "can't fetch image {}: status {}",
                url, status
            )));
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.try_next().await.map_err(|e| fetch_error(url, e))? {
            body.extend_from_slice(&chunk);
        }

        debug!("fetched {} bytes from {}", body.len(), url);
        Ok(body.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, HttpServer, web};

    /// Serves a few fixed routes on an ephemeral port and returns its base URL.
    fn spawn_source_server() -> String {
        let server = HttpServer::new(|| {
            App::new()
                .route(
                    "/image.bin",
                    web::get().to(|| async { HttpResponse::Ok().body(vec![7u8; 4096]) }),
                )
                .route("/missing", web::get().to(|| async { HttpResponse::NotFound().finish() }))
                .route(
                    "/slow",
                    web::get().to(|| async {
                        tokio::time::sleep(Duration::from_secs(3)).await;
                        HttpResponse::Ok().finish()
                    }),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{}", addr)
    }

    #[actix_web::test]
    async fn fetches_body() {
        let base = spawn_source_server();
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let body = fetcher.fetch(&format!("{}/image.bin", base)).await.unwrap();
        assert_eq!(body.len(), 4096);
    }

    #[actix_web::test]
    async fn non_success_status_is_a_fetch_error() {
        let base = spawn_source_server();
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch(&format!("{}/missing", base)).await.unwrap_err();
        assert!(matches!(&err, ResizerError::Fetch(msg) if msg.contains("404")));
    }

    #[actix_web::test]
    async fn slow_source_times_out() {
        let base = spawn_source_server();
        let fetcher = HttpFetcher::new(Duration::from_millis(300)).unwrap();
        let err = fetcher.fetch(&format!("{}/slow", base)).await.unwrap_err();
        assert!(matches!(err, ResizerError::FetchTimeout(_)));
    }
}
