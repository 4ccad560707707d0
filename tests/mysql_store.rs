//! MySQL 端到端测试
//!
//! 仅在设置了 TEST_DATABASE_URL 时运行，例如：
//! `TEST_DATABASE_URL=mysql://root@localhost/exemplo_test cargo test --test mysql_store`
//! 未设置时打印提示后跳过。每个测试创建独立的临时表，结束时删除。

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use produtos_api::{
    app::produtos::{MySqlProductStore, ProductId, ProductStore},
    config::DatabaseConfig,
    infrastructure::DatabaseManager,
    router, AppState,
};
use serde_json::{json, Value};
use sqlx::mysql::MySqlPool;
use std::time::Duration;
use tower::ServiceExt;

async fn connect() -> Option<DatabaseManager> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL 未设置，跳过 MySQL 测试");
        return None;
    };
    let config = DatabaseConfig {
        url: Some(url),
        max_connections: 2,
        ..DatabaseConfig::default()
    };
    Some(
        DatabaseManager::connect(&config)
            .await
            .expect("Failed to connect to test database"),
    )
}

async fn create_table(pool: &MySqlPool) -> String {
    let table = format!("produtos_test_{}", uuid::Uuid::new_v4().simple());

    sqlx::query(&format!(
        r#"
        CREATE TABLE `{table}` (
            id INT PRIMARY KEY,
            nome VARCHAR(50) NOT NULL,
            preco DECIMAL(10, 2),
            estoque INT UNSIGNED,
            ativo BOOLEAN,
            peso DOUBLE,
            lancamento DATE,
            atributos JSON,
            duracao TIME,
            atualizado DATETIME(6),
            criado TIMESTAMP NULL,
            codigo BIGINT UNSIGNED,
            hash VARBINARY(4)
        )
        "#
    ))
    .execute(pool)
    .await
    .expect("Failed to create table");

    sqlx::query(&format!(
        "INSERT INTO `{table}` \
         (id, nome, preco, estoque, ativo, peso, lancamento, atributos, \
          duracao, atualizado, criado, codigo, hash) VALUES \
         (1, 'A', 9.90, 10, TRUE, 1.5, '2024-03-01', '{{\"cor\": \"azul\"}}', \
          '30:00:00', '2024-03-01 10:00:00.250000', '2024-03-01 10:00:00', \
          18446744073709551615, x'00ff'), \
         (2, 'B', NULL, NULL, FALSE, NULL, NULL, NULL, \
          '-838:59:59', NULL, NULL, NULL, NULL)"
    ))
    .execute(pool)
    .await
    .expect("Failed to seed table");

    // 全零日期需要关闭 NO_ZERO_DATE，只在这一个连接上生效
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    sqlx::query("SET SESSION sql_mode = ''")
        .execute(&mut *conn)
        .await
        .expect("Failed to relax sql_mode");
    sqlx::query(&format!(
        "INSERT INTO `{table}` (id, nome, lancamento, atualizado) \
         VALUES (3, 'C', '0000-00-00', '0000-00-00 00:00:00')"
    ))
    .execute(&mut *conn)
    .await
    .expect("Failed to seed zero dates");

    table
}

async fn drop_table(pool: &MySqlPool, table: &str) {
    sqlx::query(&format!("DROP TABLE IF EXISTS `{table}`"))
        .execute(pool)
        .await
        .expect("Failed to drop table");
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_store_decodes_rows() {
    let Some(database) = connect().await else {
        return;
    };
    let pool = database.get_pool().clone();
    let table = create_table(&pool).await;
    let store = MySqlProductStore::new(pool.clone(), &table, "id");

    let products = store.list().await.unwrap();
    assert_eq!(products.len(), 3);

    let first = serde_json::to_value(&products[0]).unwrap();
    assert_eq!(
        first,
        json!({
            "id": 1,
            "nome": "A",
            "preco": "9.90",
            "estoque": 10,
            "ativo": 1,
            "peso": 1.5,
            "lancamento": "2024-03-01",
            "atributos": {"cor": "azul"},
            "duracao": "30:00:00",
            "atualizado": "2024-03-01T10:00:00.250000",
            "criado": "2024-03-01T10:00:00Z",
            "codigo": 18446744073709551615u64,
            "hash": [0, 255]
        })
    );

    let second = store.find(ProductId::new(2)).await.unwrap().unwrap();
    assert_eq!(second.get("preco"), Some(&Value::Null));
    assert_eq!(second.get("ativo"), Some(&json!(0)));
    assert_eq!(second.get("duracao"), Some(&json!("-838:59:59")));

    let zero = store.find(ProductId::new(3)).await.unwrap().unwrap();
    assert_eq!(zero.get("lancamento"), Some(&Value::Null));
    assert_eq!(zero.get("atualizado"), Some(&Value::Null));

    assert!(store.find(ProductId::new(99)).await.unwrap().is_none());
    store.ping().await.unwrap();

    drop_table(&pool, &table).await;
    database.close().await;
}

#[tokio::test]
async fn test_endpoints_against_mysql() {
    let Some(database) = connect().await else {
        return;
    };
    let pool = database.get_pool().clone();
    let table = create_table(&pool).await;
    let app = router(
        AppState::new(MySqlProductStore::new(pool.clone(), &table, "id"))
            .with_query_timeout(Duration::from_secs(10)),
    );

    let (status, body) = get(app.clone(), "/api/produtos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, body) = get(app.clone(), "/api/produtos/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duracao"], "-838:59:59");

    let (status, body) = get(app.clone(), "/api/produtos/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nome"], "A");

    let (status, body) = get(app.clone(), "/api/produtos/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Produto não encontrado"}));

    drop_table(&pool, &table).await;

    // 表已删除，查询失败
    let (status, body) = get(app, "/api/produtos").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Erro ao buscar produtos"}));

    database.close().await;
}
