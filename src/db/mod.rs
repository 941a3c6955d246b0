use anyhow::Result;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::time::Duration;

use crate::models::{user::NewUser, Role};

pub mod order_ledger;
pub mod user_store;

pub use order_ledger::{LedgerError, OrderLedger, SqliteOrderLedger};
pub use user_store::UserStore;

pub type DbPool = Pool<Sqlite>;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        full_name TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'staff' CHECK (role IN ('admin', 'staff')),
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id TEXT PRIMARY KEY NOT NULL,
        identity_document TEXT NOT NULL UNIQUE,
        full_name TEXT NOT NULL,
        phone TEXT NOT NULL,
        email TEXT UNIQUE,
        address TEXT,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS materials (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        category TEXT NOT NULL CHECK (category IN ('madera', 'pintura', 'herrajes', 'otros')),
        unit TEXT NOT NULL CHECK (unit IN ('unidades', 'litros', 'kg', 'metros')),
        current_stock_milli INTEGER NOT NULL DEFAULT 0 CHECK (current_stock_milli >= 0),
        min_stock_alert_milli INTEGER NOT NULL DEFAULT 0 CHECK (min_stock_alert_milli >= 0),
        unit_cost_cents INTEGER CHECK (unit_cost_cents > 0),
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id TEXT PRIMARY KEY NOT NULL,
        order_number TEXT NOT NULL UNIQUE,
        customer_id TEXT NOT NULL REFERENCES customers(id),
        furniture_type TEXT NOT NULL,
        description TEXT NOT NULL,
        agreed_price_cents INTEGER NOT NULL CHECK (agreed_price_cents >= 0),
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'in_progress', 'completed', 'delivered')),
        estimated_delivery TEXT,
        created_by TEXT REFERENCES users(id),
        created_at TEXT NOT NULL
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders(created_at);",
    "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);",
    "CREATE INDEX IF NOT EXISTS idx_orders_estimated_delivery ON orders(estimated_delivery);",
];

/// Initialize the database connection pool
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    // Create the database if it doesn't exist
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        Sqlite::create_database(database_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    setup_database(&pool).await?;
    seed_default_admin(&pool).await?;

    Ok(pool)
}

/// Set up the database schema
pub async fn setup_database(pool: &DbPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Add the default admin account if there are no users yet
async fn seed_default_admin(pool: &DbPool) -> Result<()> {
    let store = UserStore::new(pool.clone());
    if store.count_users().await? > 0 {
        return Ok(());
    }

    store
        .create_user(NewUser {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: "password123".to_string(),
            full_name: "System Admin".to_string(),
            role: Role::Admin,
        })
        .await?;
    tracing::warn!("seeded default admin account (admin/password123), change its password");

    Ok(())
}

/// Timestamps are stored as fixed-width RFC 3339 UTC text so that string
/// comparison in SQL matches chronological order
pub fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

pub fn encode_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn decode_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
