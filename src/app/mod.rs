//! 路由与共享状态

pub mod produtos;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use std::{future::Future, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;

use crate::web::{error::ApiError, middleware::request_logging_middleware};
use produtos::{ProductStore, StoreError};

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// 处理器共享的状态，由进程入口构造后注入
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub query_timeout: Duration,
}

impl AppState {
    pub fn new(store: impl ProductStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// 在超时限制内等待一次存储调用，超时视为查询失败
    pub async fn query<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.query_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.query_timeout))?
    }
}

/// 创建完整的应用路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(produtos::routes())
        .fallback(fallback)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// 健康检查：数据库可用返回 200，否则 503
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let timestamp = chrono::Utc::now().to_rfc3339();

    match state.query(state.store.ping()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "database": "connected",
                "timestamp": timestamp
            })),
        ),
        Err(e) => {
            error!(error = %e, "健康检查失败");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "database": "disconnected",
                    "timestamp": timestamp
                })),
            )
        }
    }
}

async fn fallback() -> ApiError {
    ApiError::RouteNotFound
}
