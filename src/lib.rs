//! # produtos-api
//!
//! 只读产品查询服务：
//! - `GET /api/produtos` 返回产品表的全部行
//! - `GET /api/produtos/:id` 按主键返回单行
//! - `GET /health` 检查数据库连接
//!
//! 行结构不做假设，数据库返回的列原样输出为 JSON 对象。

pub mod app;
pub mod config;
pub mod infrastructure;
pub mod web;

pub use app::{router, AppState};
pub use config::Config;
