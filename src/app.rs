use crate::{
    modules,
    types::{AppEnvironment, Context},
};
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, Response, StatusCode},
    response::IntoResponse,
    Extension, Json, Router,
};
use serde_json::json;
use std::{any::Any, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, cors, set_header::SetResponseHeaderLayer, trace};

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Resource not found" })),
    )
}

/// Panic details are only echoed back outside production.
fn handle_panic(err: Box<dyn Any + Send + 'static>, expose_details: bool) -> Response<Body> {
    let details = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    tracing::error!("Request handler panicked: {}", details);

    let body = match expose_details {
        true => json!({ "error": "Sorry an error occurred", "details": details }),
        false => json!({ "error": "Sorry an error occurred" }),
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

pub fn router(ctx: Arc<Context>) -> Router {
    let expose_details = ctx.app.environment == AppEnvironment::Development;

    Router::new()
        .nest("/api", modules::get_router())
        .fallback(not_found)
        .with_state(ctx.clone())
        .layer(Extension(ctx))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CatchPanicLayer::custom(
            move |err: Box<dyn Any + Send + 'static>| handle_panic(err, expose_details),
        ))
        .layer(trace::TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(
            cors::CorsLayer::new()
                .allow_methods([
                    Method::OPTIONS,
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_origin(cors::Any),
        )
}

pub struct App {
    ctx: Arc<Context>,
    router: Router,
}

impl App {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            router: router(ctx.clone()),
            ctx,
        }
    }

    pub async fn serve(self) -> std::io::Result<()> {
        let address = format!("{}:{}", self.ctx.app.host, self.ctx.app.port);
        let listener = TcpListener::bind(&address).await?;

        tracing::info!("App is running on {}", address);

        axum::serve(listener, self.router).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn panic_details_are_hidden_in_production() {
        let response = handle_panic(Box::new("wallet row missing"), false);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_of(response).await,
            json!({ "error": "Sorry an error occurred" })
        );
    }

    #[tokio::test]
    async fn panic_details_are_shown_in_development() {
        let response = handle_panic(Box::new(String::from("wallet row missing")), true);
        assert_eq!(
            body_of(response).await,
            json!({ "error": "Sorry an error occurred", "details": "wallet row missing" })
        );
    }
}
