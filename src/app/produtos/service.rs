//! 产品查询服务

use async_trait::async_trait;
use sqlx::mysql::MySqlPool;
use std::time::Duration;
use thiserror::Error;

use super::model::{Product, ProductId};
use crate::infrastructure::database::{row_to_json, RowDecodeError};

/// 数据访问错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("查询失败: {0}")]
    Query(#[from] sqlx::Error),
    #[error("行解码失败: {0}")]
    Decode(#[from] RowDecodeError),
    #[error("查询超时 ({0:?})")]
    Timeout(Duration),
}

/// 处理器与数据访问之间的接口
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// 按数据库默认顺序返回全部产品
    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    /// 按主键查找；多行匹配时取第一行
    async fn find(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// 检查数据库是否可用
    async fn ping(&self) -> Result<(), StoreError>;
}

/// 基于 MySQL 连接池的实现
#[derive(Clone)]
pub struct MySqlProductStore {
    pool: MySqlPool,
    select_all: String,
    select_by_id: String,
}

impl MySqlProductStore {
    /// `table` 和 `id_column` 必须是已校验过的标识符（见 `Config::validate`）
    pub fn new(pool: MySqlPool, table: &str, id_column: &str) -> Self {
        Self {
            pool,
            select_all: format!("SELECT * FROM `{table}`"),
            select_by_id: format!("SELECT * FROM `{table}` WHERE `{id_column}` = ?"),
        }
    }
}

#[async_trait]
impl ProductStore for MySqlProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&self.select_all)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                row_to_json(row)
                    .map(Product::from)
                    .map_err(StoreError::from)
            })
            .collect()
    }

    async fn find(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&self.select_by_id)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Product::from(row_to_json(&row)?))),
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
