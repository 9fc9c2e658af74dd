use crate::model::{Listing, Portal, StoreError, StoredListing};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens the store, creating the schema and running column migrations.
    pub fn new(db_path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    /// In-memory store, used by tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS listings (
                id TEXT PRIMARY KEY,
                portal TEXT NOT NULL,
                title TEXT NOT NULL,
                price REAL NOT NULL,
                area REAL,
                price_per_m2 REAL,
                location TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL UNIQUE,
                first_seen TEXT NOT NULL,
                last_seen TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                listing_id TEXT NOT NULL,
                channel TEXT NOT NULL,
                sent_at TEXT NOT NULL
            );
            ",
        )?;

        Self::migrate_add_column_if_missing(
            &conn,
            "listings",
            "is_active",
            "INTEGER NOT NULL DEFAULT 1",
        )?;

        Ok(Self { conn })
    }

    /// Adds a column to an existing table if an older database lacks it.
    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StoreError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<StoredListing>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, portal, title, price, area, price_per_m2, location, url,
                    first_seen, last_seen, is_active
             FROM listings WHERE id = ?1",
        )?;

        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::map_listing(row)?))
        } else {
            Ok(None)
        }
    }

    /// Inserts a previously unseen listing with `first_seen = last_seen`.
    /// A duplicate id or url violates a constraint and surfaces as an error.
    pub fn insert(&self, id: &str, listing: &Listing, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO listings (
                id, portal, title, price, area, price_per_m2,
                location, url, first_seen, last_seen, is_active
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1)",
            params![
                id,
                listing.portal.as_str(),
                &listing.title,
                listing.price,
                listing.area,
                listing.price_per_m2(),
                &listing.location,
                &listing.url,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Re-prices a known listing in place; `first_seen` is left untouched.
    pub fn update_price(
        &self,
        id: &str,
        price: f64,
        price_per_m2: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE listings SET price = ?1, price_per_m2 = ?2, last_seen = ?3 WHERE id = ?4",
            params![price, price_per_m2, now.to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Marks a known listing as seen again in this cycle.
    pub fn touch(&self, id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE listings SET last_seen = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Most recently discovered active listings, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredListing>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, portal, title, price, area, price_per_m2, location, url,
                    first_seen, last_seen, is_active
             FROM listings WHERE is_active = 1
             ORDER BY first_seen DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], Self::map_listing)?;

        let mut listings = Vec::new();
        for listing in rows {
            listings.push(listing?);
        }
        Ok(listings)
    }

    /// Records a sent notification for the audit trail.
    pub fn record_notification(
        &self,
        listing_id: &str,
        channel: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO notifications (listing_id, channel, sent_at) VALUES (?1, ?2, ?3)",
            params![listing_id, channel, now.to_rfc3339()],
        )?;
        Ok(())
    }

    fn map_listing(row: &Row) -> Result<StoredListing, rusqlite::Error> {
        let portal_str: String = row.get(1)?;
        let portal = Portal::from_name(&portal_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("unknown portal: {portal_str}").into(),
            )
        })?;

        Ok(StoredListing {
            id: row.get(0)?,
            portal,
            title: row.get(2)?,
            price: row.get(3)?,
            area: row.get(4)?,
            price_per_m2: row.get(5)?,
            location: row.get(6)?,
            url: row.get(7)?,
            first_seen: Self::parse_timestamp(row, 8)?,
            last_seen: Self::parse_timestamp(row, 9)?,
            is_active: row.get::<_, i64>(10)? != 0,
        })
    }

    fn parse_timestamp(row: &Row, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
        let raw: String = row.get(idx)?;
        raw.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
    }
}
