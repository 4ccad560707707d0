//! 数据库基础设施

use serde_json::{Map, Value};
use sqlx::{
    error::BoxDynError,
    mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow},
    types::Json,
    Column, Error, Row, TypeInfo, ValueRef,
};
use std::str::FromStr;
use tracing::info;

use crate::config::DatabaseConfig;

/// 连接池管理器，由进程入口创建并持有
pub struct DatabaseManager {
    pool: MySqlPool,
}

impl DatabaseManager {
    /// 建立连接池并执行一次 `SELECT 1`，数据库不可用时直接返回错误
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, Error> {
        info!("连接数据库: {}", config.display_url());

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(connect_options(config)?)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        info!(
            max_connections = config.max_connections,
            "已连接到 MySQL 数据库"
        );
        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// 关闭连接池，等待已借出的连接归还
    pub async fn close(&self) {
        self.pool.close().await;
        info!("数据库连接池已关闭");
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<MySqlConnectOptions, Error> {
    match &config.url {
        Some(url) => MySqlConnectOptions::from_str(url),
        None => Ok(MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name)),
    }
}

/// 行解码失败
#[derive(Debug, thiserror::Error)]
#[error("failed to decode column `{column}` ({type_name}): {source}")]
pub struct RowDecodeError {
    pub column: String,
    pub type_name: String,
    #[source]
    pub source: Error,
}

/// 列值到 JSON 的映射方式，由驱动报告的类型名决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Signed,
    Unsigned,
    Float,
    Double,
    /// DECIMAL 以字符串输出，避免浮点精度损失
    Decimal,
    Text,
    Date,
    Time,
    DateTime,
    Timestamp,
    Json,
    Binary,
    Other,
}

impl ColumnKind {
    pub fn classify(type_name: &str) -> Self {
        match type_name {
            "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
                Self::Signed
            }
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => Self::Unsigned,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "DECIMAL" => Self::Decimal,
            "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM"
            | "SET" => Self::Text,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "DATETIME" => Self::DateTime,
            "TIMESTAMP" => Self::Timestamp,
            "JSON" => Self::Json,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT" => {
                Self::Binary
            }
            _ => Self::Other,
        }
    }
}

/// 把一行转换成 列名 → JSON 值 的映射，保持列顺序
pub fn row_to_json(row: &MySqlRow) -> Result<Map<String, Value>, RowDecodeError> {
    let mut object = Map::with_capacity(row.len());

    for column in row.columns() {
        let type_name = column.type_info().name();
        let kind = ColumnKind::classify(type_name);
        let value =
            decode_column(row, column.ordinal(), kind).map_err(|source| RowDecodeError {
                column: column.name().to_string(),
                type_name: type_name.to_string(),
                source,
            })?;
        object.insert(column.name().to_string(), value);
    }

    Ok(object)
}

fn decode_column(row: &MySqlRow, index: usize, kind: ColumnKind) -> Result<Value, Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    // 整数、字符串类按原始字节解码，不做类型兼容性检查（ENUM/SET/YEAR 等都能覆盖）
    let value = match kind {
        ColumnKind::Signed => Value::from(row.try_get_unchecked::<i64, _>(index)?),
        ColumnKind::Unsigned => Value::from(row.try_get_unchecked::<u64, _>(index)?),
        ColumnKind::Float => float_value(f64::from(row.try_get::<f32, _>(index)?)),
        ColumnKind::Double => float_value(row.try_get::<f64, _>(index)?),
        ColumnKind::Decimal | ColumnKind::Text => {
            Value::String(row.try_get_unchecked::<String, _>(index)?)
        }
        ColumnKind::Date | ColumnKind::Time | ColumnKind::DateTime | ColumnKind::Timestamp => {
            let raw = row.try_get_unchecked::<&[u8], _>(index)?;
            temporal_value(raw, kind).map_err(Error::Decode)?
        }
        ColumnKind::Json => row.try_get::<Json<Value>, _>(index)?.0,
        ColumnKind::Binary => bytes_value(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        ColumnKind::Other => match row.try_get_unchecked::<String, _>(index) {
            Ok(text) => Value::String(text),
            Err(_) => bytes_value(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        },
    };

    Ok(value)
}

/// 日期/时间列按原始字节解码
///
/// 二进制协议下首字节是长度，其后为各字段；文本协议下是 ASCII 字符串。
/// TIME 可以为负或超过 24 小时，输出 `[-]HH:MM:SS`；全零日期输出 null。
fn temporal_value(raw: &[u8], kind: ColumnKind) -> Result<Value, BoxDynError> {
    if is_text_value(raw) {
        return Ok(text_temporal(std::str::from_utf8(raw)?, kind));
    }

    let Some((&len, payload)) = raw.split_first() else {
        return Err("empty temporal value".into());
    };
    let len = usize::from(len);
    if payload.len() < len {
        return Err(format!("temporal value truncated: expected {len} bytes").into());
    }

    match kind {
        ColumnKind::Time => binary_time(&payload[..len]).map(Value::String),
        _ => binary_date(&payload[..len], kind),
    }
}

fn is_text_value(raw: &[u8]) -> bool {
    !raw.is_empty()
        && raw
            .iter()
            .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b':' | b' ' | b'.'))
}

fn text_temporal(text: &str, kind: ColumnKind) -> Value {
    if kind != ColumnKind::Time && text.starts_with("0000-00-00") {
        return Value::Null;
    }
    match kind {
        ColumnKind::DateTime => Value::String(text.replacen(' ', "T", 1)),
        ColumnKind::Timestamp => Value::String(format!("{}Z", text.replacen(' ', "T", 1))),
        _ => Value::String(text.to_string()),
    }
}

fn binary_date(p: &[u8], kind: ColumnKind) -> Result<Value, BoxDynError> {
    if !matches!(p.len(), 0 | 4 | 7 | 11) {
        return Err(format!("unexpected date length {}", p.len()).into());
    }
    if p.len() < 4 || p[..4].iter().all(|&b| b == 0) {
        return Ok(Value::Null);
    }

    let year = u16::from_le_bytes([p[0], p[1]]);
    let date = format!("{year:04}-{:02}-{:02}", p[2], p[3]);
    let (hour, minute, second) = if p.len() >= 7 {
        (p[4], p[5], p[6])
    } else {
        (0, 0, 0)
    };
    let micros = if p.len() == 11 { le_u32(&p[7..11]) } else { 0 };
    let clock = clock(u64::from(hour), minute, second, micros);

    Ok(Value::String(match kind {
        ColumnKind::Date => date,
        ColumnKind::Timestamp => format!("{date}T{clock}Z"),
        _ => format!("{date}T{clock}"),
    }))
}

fn binary_time(p: &[u8]) -> Result<String, BoxDynError> {
    match p.len() {
        0 => Ok("00:00:00".to_string()),
        8 | 12 => {
            let sign = if p[0] == 1 { "-" } else { "" };
            let hours = u64::from(le_u32(&p[1..5])) * 24 + u64::from(p[5]);
            let micros = if p.len() == 12 { le_u32(&p[8..12]) } else { 0 };
            Ok(format!("{sign}{}", clock(hours, p[6], p[7], micros)))
        }
        other => Err(format!("unexpected time length {other}").into()),
    }
}

fn clock(hours: u64, minutes: u8, seconds: u8, micros: u32) -> String {
    if micros == 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{micros:06}")
    }
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

/// NaN/无穷大没有 JSON 表示，输出 null
fn float_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn bytes_value(bytes: Vec<u8>) -> Value {
    Value::Array(bytes.into_iter().map(Value::from).collect())
}
