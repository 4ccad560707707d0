//! 产品数据模型

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// 产品表中的一行
///
/// 列名到 JSON 值的映射，按查询返回的列顺序排列。服务不定义也不校验行结构，
/// 数据库返回什么就原样输出什么。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Product(Map<String, Value>);

impl Product {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

}

impl From<Map<String, Value>> for Product {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// 产品主键，查询前从路径参数解析
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(i64);

impl ProductId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProductId {
    type Err = InvalidProductId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| InvalidProductId(s.to_string()))
    }
}

/// 路径参数不是合法的整数主键
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid product id: {0:?}")]
pub struct InvalidProductId(pub String);
