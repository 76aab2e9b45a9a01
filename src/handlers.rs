// src/handlers.rs
use crate::{AppState, errors::ResizerError, models::ResizeParams, services::Outcome};
use actix_web::http::header;
use actix_web::{HttpResponse, web};
use log::info;

pub async fn resize_image(
    query: web::Query<ResizeParams>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ResizerError> {
    match data.resizer.process(&query).await? {
        Outcome::Redirect(url) => {
            info!("redirect to {}", url);
            Ok(HttpResponse::SeeOther()
                .insert_header((header::LOCATION, url))
                .finish())
        }
        Outcome::Rendered(rendered) => {
            let response = HttpResponse::Ok()
                .content_type(rendered.record.content_type.as_str())
                .insert_header((header::ETAG, format!("\"{}\"", rendered.record.etag)))
                .body(rendered.data.clone());

            // The client gets its image whether or not saving succeeds.
            let resizer = data.resizer.clone();
            tokio::spawn(async move {
                resizer.persist(rendered).await;
            });

            Ok(response)
        }
    }
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "resizer",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
