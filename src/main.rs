mod config;
mod render;
mod translate;

use axum::{
    Form, Router,
    extract::State,
    response::Html,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::config::Config;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("gemtrans=debug,tower_http=info")
        .init();

    let config = Arc::new(Config::from_env());
    info!("Gemini translation front end starting...");
    info!("Project: {}", config.project_id);
    info!("Location: {}", config.location);
    info!("Model endpoint: {}", config.model_endpoint);

    let app = app(config);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!("Server running at http://localhost:{}", port);
    axum::serve(listener, app).await.unwrap();
}

fn app(config: Arc<Config>) -> Router {
    Router::new()
        .route("/", get(index).post(translate_post))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(config)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

#[derive(Deserialize)]
struct TranslateForm {
    text: String,
}

async fn translate_post(
    State(config): State<Arc<Config>>,
    Form(form): Form<TranslateForm>,
) -> Html<String> {
    let output = match translate::translate_text(&config, &form.text).await {
        Ok(translated) => translated,
        Err(e) => {
            error!("translation call failed: {}", e);
            format!("Error: {}", e)
        }
    };

    Html(render::result_page(&form.text, &output))
}
