use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app::{build_router, AppState},
    db::{self, DbPool, OrderLedger, SqliteOrderLedger, UserStore},
    models::{user::NewUser, OrderStatus, Role},
    report::{compose_dashboard, document::DocumentSettings, normalize, ReportQuery},
    services::AuthService,
};

const TEST_SECRET: &str = "test-secret";

// Helper function to set up an in-memory database with the full schema
async fn setup_test_db() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    db::setup_database(&pool)
        .await
        .expect("Failed to create schema");
    pool
}

// Helper function to create a test customer
async fn create_test_customer(pool: &DbPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO customers (id, identity_document, full_name, phone, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(format!("DOC-{id}"))
    .bind(name)
    .bind("555-0100")
    .bind("2024-01-01T00:00:00.000000Z")
    .execute(pool)
    .await
    .expect("Failed to save customer");
    id
}

// Helper function to create a test order; `created_at` is RFC 3339 UTC
async fn create_test_order(
    pool: &DbPool,
    number: &str,
    customer: Uuid,
    cents: i64,
    status: OrderStatus,
    created_at: &str,
    estimated_delivery: Option<&str>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO orders (id, order_number, customer_id, furniture_type, description,
                             agreed_price_cents, status, estimated_delivery, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(number)
    .bind(customer.to_string())
    .bind("Table")
    .bind("Walnut dining table")
    .bind(cents)
    .bind(status)
    .bind(estimated_delivery)
    .bind(created_at)
    .execute(pool)
    .await
    .expect("Failed to save order");
    id
}

// Helper function to create a test material; quantities in thousandths
async fn create_test_material(
    pool: &DbPool,
    stock_milli: i64,
    alert_milli: i64,
    cost_cents: Option<i64>,
) {
    sqlx::query(
        "INSERT INTO materials (id, name, category, unit, current_stock_milli,
                                min_stock_alert_milli, unit_cost_cents, created_at)
         VALUES (?, ?, 'madera', 'kg', ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind("Oak board")
    .bind(stock_milli)
    .bind(alert_milli)
    .bind(cost_cents)
    .bind("2024-01-01T00:00:00.000000Z")
    .execute(pool)
    .await
    .expect("Failed to save material");
}

async fn create_test_user(pool: &DbPool, username: &str, password: &str) -> String {
    UserStore::new(pool.clone())
        .create_user(NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: password.to_string(),
            full_name: "Test User".to_string(),
            role: Role::Staff,
        })
        .await
        .expect("Failed to save user")
        .id
}

fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

fn filter(pairs: &[(&str, &str)]) -> crate::report::FilterDescriptor {
    let mut raw = ReportQuery::default();
    for (key, value) in pairs {
        let value = Some(value.to_string());
        match *key {
            "start_date" => raw.start_date = value,
            "end_date" => raw.end_date = value,
            "status" => raw.status = value,
            "customer_id" => raw.customer_id = value,
            other => panic!("unexpected key {other}"),
        }
    }
    normalize(&raw).unwrap()
}

#[cfg(test)]
mod ledger_tests {
    use super::*;

    async fn seeded_ledger() -> (DbPool, SqliteOrderLedger, Uuid, Uuid) {
        let pool = setup_test_db().await;
        let ana = create_test_customer(&pool, "Ana Torres").await;
        let luis = create_test_customer(&pool, "Luis Soto").await;

        for (number, customer, cents, status, created_at) in [
            ("P-0001", ana, 15000, OrderStatus::Pending, "2024-03-01T09:00:00.000000Z"),
            ("P-0002", luis, 7550, OrderStatus::Completed, "2024-03-02T23:59:59.000000Z"),
            ("P-0003", ana, 32000, OrderStatus::InProgress, "2024-03-03T00:00:00.000000Z"),
        ] {
            create_test_order(&pool, number, customer, cents, status, created_at, None).await;
        }

        let ledger = SqliteOrderLedger::new(pool.clone());
        (pool, ledger, ana, luis)
    }

    #[tokio::test]
    async fn empty_filter_returns_every_order_newest_first() {
        let (_pool, ledger, _, _) = seeded_ledger().await;

        let orders = ledger.fetch_orders(&filter(&[])).await.unwrap();

        let numbers: Vec<_> = orders.iter().map(|o| o.order_number.as_str()).collect();
        assert_eq!(numbers, ["P-0003", "P-0002", "P-0001"]);
        assert_eq!(orders[1].customer_name, "Luis Soto");
        assert_eq!(orders[1].agreed_price.to_string(), "75.50");
    }

    #[tokio::test]
    async fn end_date_includes_the_last_second_of_the_day() {
        let (_pool, ledger, _, _) = seeded_ledger().await;

        let orders = ledger
            .fetch_orders(&filter(&[("start_date", "2024-03-02"), ("end_date", "2024-03-02")]))
            .await
            .unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_number, "P-0002");
    }

    #[tokio::test]
    async fn status_and_customer_predicates_combine() {
        let (_pool, ledger, ana, _) = seeded_ledger().await;

        let by_customer = ledger
            .fetch_orders(&filter(&[("customer_id", &ana.to_string())]))
            .await
            .unwrap();
        assert_eq!(by_customer.len(), 2);

        let both = ledger
            .fetch_orders(&filter(&[("customer_id", &ana.to_string()), ("status", "pending")]))
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].order_number, "P-0001");
    }

    #[tokio::test]
    async fn equal_creation_times_are_ordered_by_id() {
        let pool = setup_test_db().await;
        let customer = create_test_customer(&pool, "Ana Torres").await;
        let mut ids = Vec::new();
        let created_at = "2024-03-01T09:00:00.000000Z";
        for number in ["P-A", "P-B", "P-C"] {
            let status = OrderStatus::Pending;
            let id =
                create_test_order(&pool, number, customer, 100, status, created_at, None).await;
            ids.push(id);
        }
        ids.sort();

        let orders = SqliteOrderLedger::new(pool).fetch_recent_orders(5).await.unwrap();
        let fetched: Vec<_> = orders.iter().map(|o| o.id).collect();
        assert_eq!(fetched, ids);
    }

    #[tokio::test]
    async fn status_counts_only_include_present_statuses() {
        let (_pool, ledger, _, _) = seeded_ledger().await;

        let counts = ledger.fetch_order_status_counts().await.unwrap();

        assert_eq!(counts.len(), 3);
        assert_eq!(counts[&OrderStatus::Pending], 1);
        assert!(!counts.contains_key(&OrderStatus::Delivered));
    }

    #[tokio::test]
    async fn low_stock_comparison_is_inclusive() {
        let pool = setup_test_db().await;
        create_test_material(&pool, 5_000, 5_000, Some(100)).await;
        create_test_material(&pool, 4_999, 5_000, Some(100)).await;
        create_test_material(&pool, 5_001, 5_000, Some(100)).await;

        let ledger = SqliteOrderLedger::new(pool);
        assert_eq!(ledger.fetch_low_stock_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn inventory_value_is_exact_and_rounded_to_cents() {
        let pool = setup_test_db().await;
        // 2.5 × 12.40 = 31.00
        create_test_material(&pool, 2_500, 1_000, Some(1240)).await;
        // no unit cost counts as zero
        create_test_material(&pool, 1_000, 1_000, None).await;
        // 0.333 × 0.10 = 0.0333
        create_test_material(&pool, 333, 0, Some(10)).await;

        let summary = SqliteOrderLedger::new(pool).fetch_inventory_summary().await.unwrap();

        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.total_value.to_string(), "31.03");
        assert_eq!(summary.low_stock_items, 1);
    }

    #[tokio::test]
    async fn upcoming_deliveries_respect_window_status_and_limit() {
        let pool = setup_test_db().await;
        let customer = create_test_customer(&pool, "Ana Torres").await;
        let created = "2024-06-01T09:00:00.000000Z";
        let rows = [
            ("P-01", OrderStatus::Pending, "2024-06-09"),
            ("P-02", OrderStatus::Pending, "2024-06-10"),
            ("P-03", OrderStatus::Completed, "2024-06-11"),
            ("P-04", OrderStatus::InProgress, "2024-06-12"),
            ("P-05", OrderStatus::Delivered, "2024-06-13"),
            ("P-06", OrderStatus::Pending, "2024-06-14"),
            ("P-07", OrderStatus::Pending, "2024-06-17"),
            ("P-08", OrderStatus::Pending, "2024-06-18"),
            ("P-09", OrderStatus::InProgress, "2024-06-15"),
            ("P-10", OrderStatus::Pending, "2024-06-16"),
        ];
        for (number, status, due) in rows {
            create_test_order(&pool, number, customer, 100, status, created, Some(due)).await;
        }

        let upcoming = SqliteOrderLedger::new(pool)
            .fetch_upcoming_deliveries(day("2024-06-10"), 7, 5)
            .await
            .unwrap();

        let numbers: Vec<_> = upcoming.iter().map(|o| o.order_number.as_str()).collect();
        assert_eq!(numbers, ["P-02", "P-04", "P-06", "P-09", "P-10"]);
        assert!(upcoming.iter().all(|o| !o.status.is_terminal()));
    }

    #[tokio::test]
    async fn dashboard_over_sqlite_zero_fills_and_counts() {
        let (pool, ledger, _, _) = seeded_ledger().await;
        create_test_material(&pool, 0, 1_000, None).await;

        let snapshot = compose_dashboard(&ledger, day("2024-06-10")).await.unwrap();

        assert_eq!(snapshot.stats.orders.pending, 1);
        assert_eq!(snapshot.stats.orders.in_progress, 1);
        assert_eq!(snapshot.stats.orders.completed, 1);
        assert_eq!(snapshot.stats.orders.delivered, 0);
        assert_eq!(snapshot.stats.low_stock, 1);
        assert_eq!(snapshot.stats.total_customers, 2);
        assert_eq!(snapshot.recent_orders.len(), 3);
        assert!(snapshot.upcoming_deliveries.is_empty());
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;

    async fn test_app() -> (DbPool, Router) {
        let pool = setup_test_db().await;
        let state = AppState::new(
            pool.clone(),
            AuthService::new(TEST_SECRET, 1),
            DocumentSettings::new("Carpentry Workshop"),
        );
        (pool, build_router(state))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, headers, body)
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn json(body: &[u8]) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    async fn login(
        app: &Router,
        username: &str,
        password: &str,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "username": username, "password": password }).to_string(),
            ))
            .unwrap();
        let (status, _, body) = send(app, request).await;
        (status, json(&body))
    }

    async fn token_for(pool: &DbPool, app: &Router) -> String {
        create_test_user(pool, "marta", "password123").await;
        let (status, body) = login(app, "marta", "password123").await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn seed_two_orders(pool: &DbPool) {
        let ana = create_test_customer(pool, "Ana Torres").await;
        for (number, cents, status, created_at) in [
            ("P-0001", 15000, OrderStatus::Pending, "2024-05-01T10:00:00.000000Z"),
            ("P-0002", 7550, OrderStatus::Completed, "2024-05-02T10:00:00.000000Z"),
        ] {
            create_test_order(pool, number, ana, cents, status, created_at, None).await;
        }
    }

    #[tokio::test]
    async fn health_route_is_public() {
        let (_pool, app) = test_app().await;
        let (status, _, body) = send(&app, get("/api", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["message"], "Carpentry Workshop API is running");
    }

    #[tokio::test]
    async fn reports_require_a_token() {
        let (_pool, app) = test_app().await;

        let (status, _, body) = send(&app, get("/api/reports/orders", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json(&body)["error"]["code"], "NO_TOKEN");

        let (status, _, body) = send(&app, get("/api/reports/orders", Some("garbage"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json(&body)["error"]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let (pool, app) = test_app().await;
        create_test_user(&pool, "marta", "password123").await;

        let (status, body) = login(&app, "marta", "nope").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

        let (status, body) = login(&app, "nobody", "password123").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn deleted_user_token_is_rejected() {
        let (pool, app) = test_app().await;
        let token = token_for(&pool, &app).await;

        let (status, _, body) = send(&app, get("/api/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["data"]["username"], "marta");

        sqlx::query("DELETE FROM users").execute(&pool).await.unwrap();
        let (status, _, body) = send(&app, get("/api/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json(&body)["error"]["code"], "USER_NOT_FOUND");
    }

    #[tokio::test]
    async fn orders_report_returns_rows_and_summary() {
        let (pool, app) = test_app().await;
        let token = token_for(&pool, &app).await;
        seed_two_orders(&pool).await;

        let (status, _, body) = send(&app, get("/api/reports/orders", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);

        let body = json(&body);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["orders"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["orders"][0]["order_number"], "P-0002");
        assert_eq!(body["data"]["summary"]["total_orders"], 2);
        assert_eq!(body["data"]["summary"]["total_value"], "225.50");
        assert_eq!(body["data"]["summary"]["by_status"]["pending"], 1);
        assert_eq!(body["data"]["summary"]["by_status"]["completed"], 1);
        assert!(body["data"]["summary"]["by_status"].get("delivered").is_none());
    }

    #[tokio::test]
    async fn bad_filters_fail_before_touching_the_ledger() {
        let (pool, app) = test_app().await;
        let token = token_for(&pool, &app).await;

        let (status, _, body) =
            send(&app, get("/api/reports/orders?status=nonexistent", Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = json(&body);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"][0]["field"], "status");

        let (status, _, body) = send(
            &app,
            get("/api/reports/orders/pdf?start_date=2024-05-10&end_date=2024-05-01", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"]["details"][0]["field"], "end_date");
    }

    #[tokio::test]
    async fn repeated_status_parameter_gets_a_validation_envelope() {
        let (pool, app) = test_app().await;
        let token = token_for(&pool, &app).await;

        for uri in [
            "/api/reports/orders?status=pending&status=completed",
            "/api/reports/orders/pdf?status=pending&status=completed",
        ] {
            let (status, headers, body) = send(&app, get(uri, Some(&token))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(headers[header::CONTENT_TYPE], "application/json");

            let body = json(&body);
            assert_eq!(body["success"], false);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
            assert_eq!(body["error"]["details"][0]["field"], "status");
        }
    }

    #[tokio::test]
    async fn malformed_login_body_gets_a_validation_envelope() {
        let (_pool, app) = test_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username":"marta"}"#))
            .unwrap();

        let (status, _, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = json(&body);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"][0]["field"], "password");
    }

    #[tokio::test]
    async fn csv_format_is_downloadable() {
        let (pool, app) = test_app().await;
        let token = token_for(&pool, &app).await;
        seed_two_orders(&pool).await;

        let (status, headers, body) =
            send(&app, get("/api/reports/orders?format=csv&status=pending", Some(&token))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("orders_report.csv"));
        let text = String::from_utf8(body).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("P-0001,Ana Torres,Table,2024-05-01,pending,150.00"));
    }

    #[tokio::test]
    async fn pdf_report_is_a_pdf_attachment() {
        let (pool, app) = test_app().await;
        let token = token_for(&pool, &app).await;
        seed_two_orders(&pool).await;

        let (status, headers, body) =
            send(&app, get("/api/reports/orders/pdf?status=completed", Some(&token))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn dashboard_and_inventory_routes_respond() {
        let (pool, app) = test_app().await;
        let token = token_for(&pool, &app).await;
        seed_two_orders(&pool).await;
        create_test_material(&pool, 2_000, 5_000, Some(250)).await;

        let (status, _, body) = send(&app, get("/api/reports/dashboard", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let stats = &json(&body)["data"]["stats"];
        assert_eq!(stats["pending"], 1);
        assert_eq!(stats["in_progress"], 0);
        assert_eq!(stats["completed"], 1);
        assert_eq!(stats["delivered"], 0);
        assert_eq!(stats["low_stock"], 1);
        assert_eq!(stats["total_customers"], 1);

        let (status, _, body) = send(&app, get("/api/reports/inventory", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let data = &json(&body)["data"];
        assert_eq!(data["total_items"], 1);
        assert_eq!(data["total_value"], "5.00");
        assert_eq!(data["low_stock_items"], 1);
    }
}
