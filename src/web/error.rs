//! HTTP 错误处理

use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::app::produtos::model::InvalidProductId;
use crate::app::produtos::service::StoreError;

/// 返回给客户端的错误，消息固定，不暴露底层细节
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Identificador de produto inválido")]
    InvalidId(#[from] InvalidProductId),
    /// 路径参数无法提取（例如非 UTF-8 的百分号编码）
    #[error("Identificador de produto inválido")]
    BadPath(#[from] PathRejection),
    #[error("Produto não encontrado")]
    NotFound,
    #[error("Rota não encontrada")]
    RouteNotFound,
    #[error("Erro ao buscar produtos")]
    ListFailed(#[source] StoreError),
    #[error("Erro ao buscar produto")]
    FetchFailed(#[source] StoreError),
}

/// 错误响应体：`{"error": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidId(_) | ApiError::BadPath(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::ListFailed(_) | ApiError::FetchFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::ListFailed(source) => error!(error = %source, "Erro ao buscar produtos"),
            ApiError::FetchFailed(source) => error!(error = %source, "Erro ao buscar produto"),
            ApiError::BadPath(rejection) => debug!(error = %rejection, "路径参数无效"),
            _ => {}
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
