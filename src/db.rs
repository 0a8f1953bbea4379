use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Result};

use crate::error::ApiError;

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).expect("Failed to create database directory");
            }
        }

        let conn = Connection::open(path)?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    /// Locks the connection, mapping a poisoned mutex onto the API error
    /// type so handlers can use `?`.
    pub fn lock(&self) -> std::result::Result<MutexGuard<'_, Connection>, ApiError> {
        self.conn
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");

        conn.execute_batch(
            "
            -- Account identities
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                password_salt TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Bearer sessions; only the token digest is stored
            CREATE TABLE IF NOT EXISTS sessions (
                token_hash TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            -- Catalog of fixed platform offerings
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                icon TEXT NOT NULL DEFAULT '',
                summary TEXT NOT NULL DEFAULT '',
                price_min REAL NOT NULL,
                price_max REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- One cart per user, created lazily on first write
            CREATE TABLE IF NOT EXISTS carts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            -- Cart lines; re-adding a slug increments instead of duplicating
            CREATE TABLE IF NOT EXISTS cart_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cart_id INTEGER NOT NULL,
                product_slug TEXT NOT NULL,
                name TEXT NOT NULL,
                icon TEXT NOT NULL DEFAULT '',
                price_min REAL NOT NULL,
                price_max REAL NOT NULL,
                quantity INTEGER NOT NULL,
                UNIQUE (cart_id, product_slug),
                FOREIGN KEY (cart_id) REFERENCES carts(id)
            );

            -- Orders stay pending until reconciled against a bank transfer
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                total_amount REAL NOT NULL,
                currency TEXT NOT NULL DEFAULT 'EUR',
                payment_method TEXT NOT NULL DEFAULT 'bank_transfer',
                payment_reference TEXT NOT NULL,
                billing_name TEXT,
                billing_email TEXT,
                billing_company TEXT,
                billing_address TEXT,
                billing_city TEXT,
                billing_country TEXT,
                notes TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            -- Line items snapshot cart contents at commit time
            CREATE TABLE IF NOT EXISTS order_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id INTEGER NOT NULL,
                product_slug TEXT NOT NULL,
                name TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                price_min REAL NOT NULL,
                price_max REAL NOT NULL,
                final_price REAL,
                FOREIGN KEY (order_id) REFERENCES orders(id)
            );
            ",
        )?;

        // Run migrations for existing databases (pass connection to avoid deadlock)
        Self::migrate_conn(&conn)?;

        Self::seed_catalog(&conn)?;

        Ok(())
    }

    fn migrate_conn(conn: &Connection) -> Result<()> {
        let order_columns: Vec<String> = conn
            .prepare("PRAGMA table_info(orders)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|r| r.ok())
            .collect();

        if !order_columns.contains(&"billing_company".to_string()) {
            conn.execute("ALTER TABLE orders ADD COLUMN billing_company TEXT", [])?;
        }
        if !order_columns.contains(&"notes".to_string()) {
            conn.execute("ALTER TABLE orders ADD COLUMN notes TEXT", [])?;
        }

        let product_columns: Vec<String> = conn
            .prepare("PRAGMA table_info(products)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|r| r.ok())
            .collect();

        if !product_columns.contains(&"summary".to_string()) {
            conn.execute(
                "ALTER TABLE products ADD COLUMN summary TEXT NOT NULL DEFAULT ''",
                [],
            )?;
        }

        Ok(())
    }

    /// The catalog is a fixed set of offerings, not user data. Seed it once
    /// on an empty database; price bounds are the published pre-negotiation
    /// range for each platform.
    fn seed_catalog(conn: &Connection) -> Result<()> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let offerings: [(&str, &str, &str, &str, f64, f64); 4] = [
            (
                "commerce-suite",
                "Commerce Suite",
                "cart",
                "Headless storefront with catalog, checkout and order management",
                24000.0,
                38000.0,
            ),
            (
                "analytics-hub",
                "Analytics Hub",
                "chart",
                "Self-hosted product analytics with dashboards and funnels",
                18000.0,
                27000.0,
            ),
            (
                "booking-engine",
                "Booking Engine",
                "calendar",
                "Scheduling and reservations platform with payments hooks",
                15000.0,
                22000.0,
            ),
            (
                "support-desk",
                "Support Desk",
                "headset",
                "Ticketing and knowledge base platform for customer support teams",
                12000.0,
                18000.0,
            ),
        ];

        for (slug, name, icon, summary, price_min, price_max) in offerings {
            conn.execute(
                "INSERT INTO products (slug, name, icon, summary, price_min, price_max) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![slug, name, icon, summary, price_min, price_max],
            )?;
        }

        Ok(())
    }
}
