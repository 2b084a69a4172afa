//! Instagram Feed API Server
//!
//! Main entry point for the Instagram feed REST API service.

use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use insta_feed::config::Config;
use insta_feed::routes::{configure_routes, default_headers, ApiDoc, AppState};
use insta_feed::scraper::{Scraper, ScraperConfig};

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_address = config.bind_address();

    let scraper = Scraper::with_config(ScraperConfig {
        request_timeout: config.page_timeout,
        ..Default::default()
    })
    .map_err(std::io::Error::other)?;

    let app_state = web::Data::new(AppState::new(config, Arc::new(scraper)));

    info!("Starting Instagram Feed API server on {}", bind_address);

    let openapi = ApiDoc::openapi();

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .route("/health", web::get().to(health_check))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            .wrap(default_headers())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
