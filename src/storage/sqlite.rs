//! SQLite backend: schema, pragmas, migrations, and the order/notification/offer tables.

use crate::model::types::{
    NewOffer, NewOrder, Notification, NotificationKind, Offer, Order, OrderStatus,
};
use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Local, NaiveDate};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const SCHEMA_VERSION: i64 = 1;

/// Prefix of every generated order ID.
pub const ORDER_ID_PREFIX: &str = "CC";

const MIGRATION_V1: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY,
    order_id TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    phone_number TEXT NOT NULL,
    email TEXT,
    pickup_address TEXT NOT NULL,
    pickup_date TEXT NOT NULL,
    pickup_time TEXT NOT NULL,
    service_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'Scheduled',
    notes TEXT,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY,
    order_id TEXT,
    phone_number TEXT NOT NULL,
    category TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS offers (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    discount_percent REAL,
    discount_amount REAL,
    valid_from TEXT NOT NULL,
    valid_to TEXT NOT NULL,
    target_audience TEXT NOT NULL DEFAULT 'all',
    active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_orders_phone_created
    ON orders(phone_number, created_at DESC);

CREATE INDEX IF NOT EXISTS idx_notifications_created
    ON notifications(created_at DESC);

CREATE INDEX IF NOT EXISTS idx_offers_window
    ON offers(active, valid_from, valid_to);
"#;

const ORDER_COLUMNS: &str = "order_id, full_name, phone_number, email, pickup_address, pickup_date, pickup_time, service_type, status, notes, created_at";

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating db directory {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("opening sqlite db at {}", path.display()))?;
        Self::init(conn)
    }

    /// Private in-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("opening in-memory sqlite db")?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        apply_pragmas(&mut conn)?;
        init_meta(&mut conn)?;
        migrate(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn raw(&self) -> &Connection {
        &self.conn
    }

    #[tracing::instrument(name = "create_order", skip(self, order), fields(service = %order.service_type, date = %order.pickup_date))]
    pub fn create_order(&self, order: &NewOrder) -> Result<String> {
        let created_at = now_millis();
        // a collision on the random suffix is retried with a fresh one
        for _ in 0..3 {
            let order_id = generate_order_id(Local::now().date_naive());
            let inserted = self.conn.execute(
                "INSERT INTO orders(order_id, full_name, phone_number, email, pickup_address,
                    pickup_date, pickup_time, service_type, status, notes, created_at)
                 VALUES(?,?,?,?,?,?,?,?,?,?,?)
                 ON CONFLICT(order_id) DO NOTHING",
                params![
                    order_id,
                    order.full_name,
                    order.phone_number,
                    order.email,
                    order.pickup_address,
                    order.pickup_date,
                    order.pickup_time,
                    order.service_type,
                    OrderStatus::Scheduled.as_str(),
                    order.notes,
                    created_at
                ],
            )?;
            if inserted == 1 {
                tracing::info!(order_id = %order_id, "order_created");
                return Ok(order_id);
            }
        }
        Err(anyhow!("could not allocate a unique order id"))
    }

    pub fn get_order(&self, order_id: &str) -> Result<Option<Order>> {
        self.conn
            .query_row(
                &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?"),
                params![order_id.trim()],
                order_from_row,
            )
            .optional()
            .with_context(|| format!("fetching order {order_id}"))
    }

    /// Most recent order placed with `phone` (canonical form).
    pub fn latest_order_for_phone(&self, phone: &str) -> Result<Option<Order>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE phone_number = ?
                     ORDER BY created_at DESC, id DESC LIMIT 1"
                ),
                params![phone],
                order_from_row,
            )
            .optional()
            .with_context(|| format!("fetching latest order for {phone}"))
    }

    /// All orders, newest first.
    pub fn list_orders(&self) -> Result<Vec<Order>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], order_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("listing orders")
    }

    /// Returns `false` when no order has that ID.
    pub fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE orders SET status = ? WHERE order_id = ?",
            params![status.as_str(), order_id.trim()],
        )?;
        tracing::info!(order_id, status = %status, changed, "order_status_updated");
        Ok(changed > 0)
    }

    pub fn log_notification(
        &self,
        order_id: Option<&str>,
        phone_number: &str,
        category: &NotificationKind,
        message: &str,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO notifications(order_id, phone_number, category, message, created_at)
                 VALUES(?,?,?,?,?)",
                params![
                    order_id,
                    phone_number,
                    category.as_str(),
                    message,
                    now_millis()
                ],
            )
            .context("logging notification")?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(id, category = %category, "notification_logged");
        Ok(id)
    }

    /// Newest first.
    pub fn recent_notifications(&self, limit: usize) -> Result<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, order_id, phone_number, category, message, created_at
             FROM notifications ORDER BY created_at DESC, id DESC LIMIT ?",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(Notification {
                id: row.get(0)?,
                order_id: row.get(1)?,
                phone_number: row.get(2)?,
                category: NotificationKind::from_str_lossy(&row.get::<_, String>(3)?),
                message: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("listing notifications")
    }

    pub fn add_offer(&self, offer: &NewOffer) -> Result<i64> {
        insert_offer(&self.conn, offer)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Active offers valid on `today`, ordered by name.
    ///
    /// With an audience, offers for that audience and for `all` are returned.
    pub fn active_offers(&self, audience: Option<&str>, today: NaiveDate) -> Result<Vec<Offer>> {
        let today = today.format("%Y-%m-%d").to_string();
        let mut sql = String::from(
            "SELECT id, name, description, discount_percent, discount_amount, valid_from, valid_to,
                    target_audience, active
             FROM offers WHERE active = 1 AND valid_from <= ?1 AND valid_to >= ?1",
        );
        if audience.is_some() {
            sql.push_str(" AND (target_audience = ?2 OR target_audience = 'all')");
        }
        sql.push_str(" ORDER BY name, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match audience {
            Some(a) => stmt.query_map(params![today, a], offer_from_row)?,
            None => stmt.query_map(params![today], offer_from_row)?,
        };
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("listing active offers")
    }

    pub fn set_offer_active(&self, id: i64, active: bool) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE offers SET active = ? WHERE id = ?",
                params![active, id],
            )
            .with_context(|| format!("updating offer {id}"))?;
        Ok(changed > 0)
    }
}

/// `CC` + `YYYYMMDD` + 8 uppercase hex chars from a v4 UUID.
pub fn generate_order_id(date: NaiveDate) -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase();
    format!("{ORDER_ID_PREFIX}{}{suffix}", date.format("%Y%m%d"))
}

/// Offers inserted on first open, valid for the calendar year of `today`.
pub fn sample_offers(today: NaiveDate) -> Vec<NewOffer> {
    let year = today.year();
    vec![
        NewOffer {
            name: "New Customer Welcome".into(),
            description: "20% off your first order".into(),
            discount_percent: Some(20.0),
            discount_amount: None,
            valid_from: format!("{year}-01-01"),
            valid_to: format!("{year}-12-31"),
            target_audience: "new_customers".into(),
        },
        NewOffer {
            name: "Winter Special".into(),
            description: "Free sanitizing with any order".into(),
            discount_percent: None,
            discount_amount: Some(0.0),
            valid_from: format!("{year}-01-01"),
            valid_to: format!("{year}-02-28"),
            target_audience: "all".into(),
        },
        NewOffer {
            name: "Loyalty Reward".into(),
            description: "15% off for returning customers".into(),
            discount_percent: Some(15.0),
            discount_amount: None,
            valid_from: format!("{year}-01-01"),
            valid_to: format!("{year}-12-31"),
            target_audience: "returning".into(),
        },
    ]
}

fn apply_pragmas(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
        PRAGMA foreign_keys = ON;
        "#,
    )?;
    Ok(())
}

fn init_meta(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;
    Ok(())
}

fn migrate(conn: &mut Connection) -> Result<()> {
    let current: i64 = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0).map(|s| s.parse().unwrap_or(0)),
        )
        .optional()?
        .unwrap_or(0);

    match current {
        0 => {
            let tx = conn.transaction()?;
            tx.execute_batch(MIGRATION_V1)?;
            for offer in sample_offers(Local::now().date_naive()) {
                insert_offer(&tx, &offer)?;
            }
            tx.execute(
                "INSERT INTO meta(key, value) VALUES('schema_version', ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![SCHEMA_VERSION.to_string()],
            )?;
            tx.commit()?;
            tracing::info!(version = SCHEMA_VERSION, "schema_migrated");
        }
        v if v == SCHEMA_VERSION => {}
        v => return Err(anyhow!("unsupported schema version {}", v)),
    }

    Ok(())
}

fn insert_offer(conn: &Connection, offer: &NewOffer) -> Result<()> {
    conn.execute(
        "INSERT INTO offers(name, description, discount_percent, discount_amount,
            valid_from, valid_to, target_audience, active, created_at)
         VALUES(?,?,?,?,?,?,?,1,?)",
        params![
            offer.name,
            offer.description,
            offer.discount_percent,
            offer.discount_amount,
            offer.valid_from,
            offer.valid_to,
            offer.target_audience,
            now_millis()
        ],
    )
    .with_context(|| format!("inserting offer {}", offer.name))?;
    Ok(())
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    let status: String = row.get(8)?;
    Ok(Order {
        order_id: row.get(0)?,
        full_name: row.get(1)?,
        phone_number: row.get(2)?,
        email: row.get(3)?,
        pickup_address: row.get(4)?,
        pickup_date: row.get(5)?,
        pickup_time: row.get(6)?,
        service_type: row.get(7)?,
        status: OrderStatus::parse(&status).unwrap_or_default(),
        notes: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn offer_from_row(row: &Row<'_>) -> rusqlite::Result<Offer> {
    Ok(Offer {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        discount_percent: row.get(3)?,
        discount_amount: row.get(4)?,
        valid_from: row.get(5)?,
        valid_to: row.get(6)?,
        target_audience: row.get(7)?,
        active: row.get(8)?,
    })
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
