//! 产品接口：列表与按主键查询

pub mod handler;
pub mod model;
pub mod service;

use axum::{routing::get, Router};

use super::AppState;

pub use model::{Product, ProductId};
pub use service::{MySqlProductStore, ProductStore, StoreError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/produtos", get(handler::list_products))
        .route("/api/produtos/", get(handler::list_products))
        .route("/api/produtos/:id", get(handler::get_product))
}
