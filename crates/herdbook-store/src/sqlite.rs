//! SQLite-backed store.
//!
//! Dates and decimals are stored as ISO/plain text, so lexicographic
//! ordering on `date` is chronological and no precision is lost. The
//! movement identity index enforces the idempotency key in the database
//! itself; `upsert_movement` is `INSERT OR IGNORE` plus a re-select, never
//! check-then-create.

use crate::{LedgerRead, LedgerWrite, Result, StoreError, Upsert};
use chrono::NaiveDate;
use herdbook_core::{
    Category, CategoryId, Movement, MovementId, MovementKey, MovementKind, Plan, PlanId, Property,
    PropertyId, Sale, SaleId, Sex, Snapshot, SnapshotId,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::time::Duration;

const SCHEMA_SQL: &str = r"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS properties (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    location TEXT
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    sex TEXT NOT NULL CHECK (sex IN ('M', 'F')),
    min_age_months INTEGER NOT NULL DEFAULT 0,
    max_age_months INTEGER,
    avg_weight_kg TEXT,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS plans (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    year INTEGER NOT NULL,
    created_on TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS snapshots (
    id INTEGER PRIMARY KEY,
    property_id INTEGER NOT NULL REFERENCES properties(id),
    category_id INTEGER NOT NULL REFERENCES categories(id),
    date TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity >= 0),
    value_per_head TEXT
);

CREATE INDEX IF NOT EXISTS idx_snapshots_herd_date
    ON snapshots(property_id, category_id, date);

CREATE TABLE IF NOT EXISTS movements (
    id INTEGER PRIMARY KEY,
    property_id INTEGER NOT NULL REFERENCES properties(id),
    category_id INTEGER NOT NULL REFERENCES categories(id),
    kind TEXT NOT NULL,
    date TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    value_per_head TEXT,
    total_value TEXT,
    note TEXT,
    plan_id INTEGER REFERENCES plans(id)
);

CREATE INDEX IF NOT EXISTS idx_movements_herd_date
    ON movements(property_id, category_id, date, id);

-- The idempotency key. ifnull folds the no-plan bucket to 0; plan ids
-- start at 1 so the bucket cannot collide with a real plan.
CREATE UNIQUE INDEX IF NOT EXISTS idx_movements_identity
    ON movements(property_id, category_id, kind, date, quantity, ifnull(plan_id, 0));

CREATE TABLE IF NOT EXISTS sales (
    id INTEGER PRIMARY KEY,
    movement_id INTEGER NOT NULL UNIQUE REFERENCES movements(id) ON DELETE CASCADE,
    customer TEXT NOT NULL,
    avg_weight_kg TEXT NOT NULL,
    total_weight_kg TEXT NOT NULL,
    price_per_kg TEXT NOT NULL,
    value_per_head TEXT NOT NULL,
    total_value TEXT NOT NULL,
    receipt_date TEXT NOT NULL,
    payment_term_days INTEGER NOT NULL DEFAULT 30
);
";

/// SQLite store.
///
/// Contention policy: `busy_timeout` is zero, so a locked database fails
/// fast with [`StoreError::Busy`] and the engine's retry policy decides
/// how long to wait. The store never sleeps.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let conn = Connection::open_with_flags(path, flags)?;
        Self::init(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        conn.busy_timeout(Duration::ZERO)?;
        Ok(Self { conn })
    }

    fn plan_bucket(plan: Option<PlanId>) -> i64 {
        plan.map_or(0, |p| p.0)
    }

    fn year_bounds(year: i32) -> (String, String) {
        (format!("{year:04}-01-01"), format!("{year:04}-12-31"))
    }
}

fn decode_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    raw.parse()
        .map_err(|e: chrono::ParseError| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn decode_decimal(idx: usize, raw: &str) -> rusqlite::Result<Decimal> {
    raw.parse()
        .map_err(|e: rust_decimal::Error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn decode_opt_decimal(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<Decimal>> {
    raw.map(|s| decode_decimal(idx, &s)).transpose()
}

fn decode_kind(idx: usize, raw: &str) -> rusqlite::Result<MovementKind> {
    raw.parse()
        .map_err(|e: herdbook_core::ParseKindError| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        })
}

fn decode_sex(idx: usize, raw: &str) -> rusqlite::Result<Sex> {
    match raw {
        "M" => Ok(Sex::Male),
        "F" => Ok(Sex::Female),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown sex code {other:?}").into(),
        )),
    }
}

fn row_to_property(row: &Row) -> rusqlite::Result<Property> {
    Ok(Property {
        id: PropertyId(row.get(0)?),
        name: row.get(1)?,
        location: row.get(2)?,
    })
}

fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: CategoryId(row.get(0)?),
        name: row.get(1)?,
        sex: decode_sex(2, &row.get::<_, String>(2)?)?,
        min_age_months: row.get(3)?,
        max_age_months: row.get(4)?,
        avg_weight_kg: decode_opt_decimal(5, row.get(5)?)?,
        active: row.get(6)?,
    })
}

fn row_to_plan(row: &Row) -> rusqlite::Result<Plan> {
    Ok(Plan {
        id: PlanId(row.get(0)?),
        code: row.get(1)?,
        year: row.get(2)?,
        created_on: decode_date(3, &row.get::<_, String>(3)?)?,
    })
}

fn row_to_snapshot(row: &Row) -> rusqlite::Result<Snapshot> {
    Ok(Snapshot {
        id: SnapshotId(row.get(0)?),
        property: PropertyId(row.get(1)?),
        category: CategoryId(row.get(2)?),
        date: decode_date(3, &row.get::<_, String>(3)?)?,
        quantity: row.get(4)?,
        value_per_head: decode_opt_decimal(5, row.get(5)?)?,
    })
}

fn row_to_movement(row: &Row) -> rusqlite::Result<Movement> {
    Ok(Movement {
        id: MovementId(row.get(0)?),
        property: PropertyId(row.get(1)?),
        category: CategoryId(row.get(2)?),
        kind: decode_kind(3, &row.get::<_, String>(3)?)?,
        date: decode_date(4, &row.get::<_, String>(4)?)?,
        quantity: row.get(5)?,
        value_per_head: decode_opt_decimal(6, row.get(6)?)?,
        total_value: decode_opt_decimal(7, row.get(7)?)?,
        note: row.get(8)?,
        plan: row.get::<_, Option<i64>>(9)?.map(PlanId),
    })
}

/// Maps the sale columns starting at `base` in a joined row.
fn row_to_sale(row: &Row, base: usize) -> rusqlite::Result<Sale> {
    Ok(Sale {
        id: SaleId(row.get(base)?),
        movement: MovementId(row.get(base + 1)?),
        customer: row.get(base + 2)?,
        avg_weight_kg: decode_decimal(base + 3, &row.get::<_, String>(base + 3)?)?,
        total_weight_kg: decode_decimal(base + 4, &row.get::<_, String>(base + 4)?)?,
        price_per_kg: decode_decimal(base + 5, &row.get::<_, String>(base + 5)?)?,
        value_per_head: decode_decimal(base + 6, &row.get::<_, String>(base + 6)?)?,
        total_value: decode_decimal(base + 7, &row.get::<_, String>(base + 7)?)?,
        receipt_date: decode_date(base + 8, &row.get::<_, String>(base + 8)?)?,
        payment_term_days: row.get(base + 9)?,
    })
}

impl LedgerRead for SqliteStore {
    fn find_properties(&self, name_like: &str) -> Result<Vec<Property>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, name, location FROM properties
             WHERE instr(lower(name), lower(?1)) > 0
             ORDER BY name",
        )?;
        let rows = stmt.query_map([name_like], row_to_property)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn property(&self, id: PropertyId) -> Result<Option<Property>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, location FROM properties WHERE id = ?1",
                [id.0],
                row_to_property,
            )
            .optional()?)
    }

    fn category_by_name(&self, name: &str) -> Result<Option<Category>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, sex, min_age_months, max_age_months, avg_weight_kg, active
                 FROM categories WHERE name = ?1",
                [name],
                row_to_category,
            )
            .optional()?)
    }

    fn category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, sex, min_age_months, max_age_months, avg_weight_kg, active
                 FROM categories WHERE id = ?1",
                [id.0],
                row_to_category,
            )
            .optional()?)
    }

    fn current_plan(&self) -> Result<Option<Plan>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, code, year, created_on FROM plans
                 ORDER BY created_on DESC, year DESC LIMIT 1",
                [],
                row_to_plan,
            )
            .optional()?)
    }

    fn plan(&self, id: PlanId) -> Result<Option<Plan>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, code, year, created_on FROM plans WHERE id = ?1",
                [id.0],
                row_to_plan,
            )
            .optional()?)
    }

    fn snapshots_through(
        &self,
        property: PropertyId,
        category: CategoryId,
        through: NaiveDate,
    ) -> Result<Vec<Snapshot>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, property_id, category_id, date, quantity, value_per_head
             FROM snapshots
             WHERE property_id = ?1 AND category_id = ?2 AND date <= ?3
             ORDER BY date, id",
        )?;
        let rows = stmt.query_map(
            params![property.0, category.0, through.to_string()],
            row_to_snapshot,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn movements_in(
        &self,
        property: PropertyId,
        category: CategoryId,
        after: Option<NaiveDate>,
        through: NaiveDate,
    ) -> Result<Vec<Movement>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, property_id, category_id, kind, date, quantity,
                    value_per_head, total_value, note, plan_id
             FROM movements
             WHERE property_id = ?1 AND category_id = ?2
               AND date <= ?3
               AND (?4 IS NULL OR date > ?4)
             ORDER BY date, id",
        )?;
        let rows = stmt.query_map(
            params![
                property.0,
                category.0,
                through.to_string(),
                after.map(|d| d.to_string())
            ],
            row_to_movement,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn movements_of_kind(
        &self,
        property: PropertyId,
        kind: MovementKind,
        category: Option<CategoryId>,
        from: NaiveDate,
        through: NaiveDate,
    ) -> Result<Vec<Movement>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, property_id, category_id, kind, date, quantity,
                    value_per_head, total_value, note, plan_id
             FROM movements
             WHERE property_id = ?1 AND kind = ?2
               AND (?3 IS NULL OR category_id = ?3)
               AND date >= ?4 AND date <= ?5
             ORDER BY date, id",
        )?;
        let rows = stmt.query_map(
            params![
                property.0,
                kind.code(),
                category.map(|c| c.0),
                from.to_string(),
                through.to_string()
            ],
            row_to_movement,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn find_movement(&self, key: &MovementKey) -> Result<Option<MovementId>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM movements
                 WHERE property_id = ?1 AND category_id = ?2 AND kind = ?3
                   AND date = ?4 AND quantity = ?5 AND ifnull(plan_id, 0) = ?6",
                params![
                    key.property.0,
                    key.category.0,
                    key.kind.code(),
                    key.date.to_string(),
                    key.quantity,
                    Self::plan_bucket(key.plan)
                ],
                |row| row.get(0).map(MovementId),
            )
            .optional()?)
    }

    fn sales_in_year(
        &self,
        property: PropertyId,
        category: CategoryId,
        year: i32,
        plan: Option<PlanId>,
    ) -> Result<Vec<(Movement, Sale)>> {
        let (from, through) = Self::year_bounds(year);
        let mut stmt = self.conn.prepare_cached(
            "SELECT m.id, m.property_id, m.category_id, m.kind, m.date, m.quantity,
                    m.value_per_head, m.total_value, m.note, m.plan_id,
                    s.id, s.movement_id, s.customer, s.avg_weight_kg, s.total_weight_kg,
                    s.price_per_kg, s.value_per_head, s.total_value, s.receipt_date,
                    s.payment_term_days
             FROM movements m
             JOIN sales s ON s.movement_id = m.id
             WHERE m.property_id = ?1 AND m.category_id = ?2 AND m.kind = ?3
               AND m.date >= ?4 AND m.date <= ?5
               AND ifnull(m.plan_id, 0) = ?6
             ORDER BY m.date, m.id",
        )?;
        let rows = stmt.query_map(
            params![
                property.0,
                category.0,
                MovementKind::Sale.code(),
                from,
                through,
                Self::plan_bucket(plan)
            ],
            |row| Ok((row_to_movement(row)?, row_to_sale(row, 10)?)),
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl LedgerWrite for SqliteStore {
    fn insert_property(&mut self, property: &Property) -> Result<PropertyId> {
        self.conn.execute(
            "INSERT INTO properties (name, location) VALUES (?1, ?2)",
            params![property.name, property.location],
        )?;
        Ok(PropertyId(self.conn.last_insert_rowid()))
    }

    fn insert_category(&mut self, category: &Category) -> Result<CategoryId> {
        self.conn.execute(
            "INSERT INTO categories (name, sex, min_age_months, max_age_months, avg_weight_kg, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                category.name,
                category.sex.code(),
                category.min_age_months,
                category.max_age_months,
                category.avg_weight_kg.map(|d| d.to_string()),
                category.active
            ],
        )?;
        Ok(CategoryId(self.conn.last_insert_rowid()))
    }

    fn insert_plan(&mut self, plan: &Plan) -> Result<PlanId> {
        self.conn.execute(
            "INSERT INTO plans (code, year, created_on) VALUES (?1, ?2, ?3)",
            params![plan.code, plan.year, plan.created_on.to_string()],
        )?;
        Ok(PlanId(self.conn.last_insert_rowid()))
    }

    fn insert_snapshot(&mut self, snapshot: &Snapshot) -> Result<SnapshotId> {
        self.conn.execute(
            "INSERT INTO snapshots (property_id, category_id, date, quantity, value_per_head)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                snapshot.property.0,
                snapshot.category.0,
                snapshot.date.to_string(),
                snapshot.quantity,
                snapshot.value_per_head.map(|d| d.to_string())
            ],
        )?;
        Ok(SnapshotId(self.conn.last_insert_rowid()))
    }

    fn insert_movement(&mut self, movement: &Movement) -> Result<MovementId> {
        self.conn.execute(
            "INSERT INTO movements
             (property_id, category_id, kind, date, quantity, value_per_head, total_value, note, plan_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                movement.property.0,
                movement.category.0,
                movement.kind.code(),
                movement.date.to_string(),
                movement.quantity,
                movement.value_per_head.map(|d| d.to_string()),
                movement.total_value.map(|d| d.to_string()),
                movement.note,
                movement.plan.map(|p| p.0)
            ],
        )?;
        Ok(MovementId(self.conn.last_insert_rowid()))
    }

    fn upsert_movement(&mut self, movement: &Movement) -> Result<Upsert> {
        let changes = self.conn.execute(
            "INSERT OR IGNORE INTO movements
             (property_id, category_id, kind, date, quantity, value_per_head, total_value, note, plan_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                movement.property.0,
                movement.category.0,
                movement.kind.code(),
                movement.date.to_string(),
                movement.quantity,
                movement.value_per_head.map(|d| d.to_string()),
                movement.total_value.map(|d| d.to_string()),
                movement.note,
                movement.plan.map(|p| p.0)
            ],
        )?;
        if changes > 0 {
            return Ok(Upsert::Created(MovementId(self.conn.last_insert_rowid())));
        }
        match self.find_movement(&movement.key())? {
            Some(id) => Ok(Upsert::Existing(id)),
            // IGNORE swallowed some other constraint (bad foreign key and
            // the like); resurface it as a real insert error.
            None => self.insert_movement(movement).map(Upsert::Created),
        }
    }

    fn insert_sale(&mut self, sale: &Sale) -> Result<SaleId> {
        self.conn.execute(
            "INSERT INTO sales
             (movement_id, customer, avg_weight_kg, total_weight_kg, price_per_kg,
              value_per_head, total_value, receipt_date, payment_term_days)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                sale.movement.0,
                sale.customer,
                sale.avg_weight_kg.to_string(),
                sale.total_weight_kg.to_string(),
                sale.price_per_kg.to_string(),
                sale.value_per_head.to_string(),
                sale.total_value.to_string(),
                sale.receipt_date.to_string(),
                sale.payment_term_days
            ],
        )?;
        Ok(SaleId(self.conn.last_insert_rowid()))
    }

    fn update_sale_values(&mut self, sale: &Sale) -> Result<()> {
        let changes = self.conn.execute(
            "UPDATE sales SET customer = ?1, avg_weight_kg = ?2, total_weight_kg = ?3,
                 price_per_kg = ?4, value_per_head = ?5, total_value = ?6,
                 receipt_date = ?7, payment_term_days = ?8
             WHERE id = ?9",
            params![
                sale.customer,
                sale.avg_weight_kg.to_string(),
                sale.total_weight_kg.to_string(),
                sale.price_per_kg.to_string(),
                sale.value_per_head.to_string(),
                sale.total_value.to_string(),
                sale.receipt_date.to_string(),
                sale.payment_term_days,
                sale.id.0
            ],
        )?;
        if changes == 0 {
            return Err(StoreError::Constraint(format!("no sale with id {}", sale.id)));
        }
        self.conn.execute(
            "UPDATE movements SET value_per_head = ?1, total_value = ?2 WHERE id = ?3",
            params![
                sale.value_per_head.to_string(),
                sale.total_value.to_string(),
                sale.movement.0
            ],
        )?;
        Ok(())
    }

    fn delete_movement(&mut self, id: MovementId) -> Result<()> {
        self.conn
            .execute("DELETE FROM movements WHERE id = ?1", [id.0])?;
        Ok(())
    }

    fn delete_sales_in_year(
        &mut self,
        property: PropertyId,
        category: CategoryId,
        year: i32,
        plan: Option<PlanId>,
    ) -> Result<u32> {
        let (from, through) = Self::year_bounds(year);
        let deleted = self.conn.execute(
            "DELETE FROM movements
             WHERE property_id = ?1 AND category_id = ?2 AND kind = ?3
               AND date >= ?4 AND date <= ?5
               AND ifnull(plan_id, 0) = ?6",
            params![
                property.0,
                category.0,
                MovementKind::Sale.code(),
                from,
                through,
                Self::plan_bucket(plan)
            ],
        )?;
        Ok(deleted as u32)
    }

    fn begin(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn probe(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herdbook_core::Pricing;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> (SqliteStore, PropertyId, CategoryId) {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let property = store
            .insert_property(&Property::new("Fazenda Girassol"))
            .unwrap();
        let category = store
            .insert_category(&Category::new("Garrote", Sex::Male))
            .unwrap();
        (store, property, category)
    }

    #[test]
    fn schema_is_idempotent_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herd.db");
        drop(SqliteStore::open(&path).unwrap());
        drop(SqliteStore::open(&path).unwrap());
    }

    #[test]
    fn movement_round_trips_through_text_columns() {
        let (mut store, property, category) = seeded();
        let plan = store
            .insert_plan(&Plan::new(2023, 1, date(2023, 1, 10)))
            .unwrap();
        let movement = Movement::new(
            property,
            category,
            MovementKind::TransferOut,
            date(2023, 6, 1),
            512,
        )
        .with_value_per_head(dec!(2925.00))
        .with_note("Lote 1")
        .with_plan(plan);
        let id = store.insert_movement(&movement).unwrap();

        let rows = store
            .movements_in(property, category, None, date(2023, 12, 31))
            .unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id, id);
        assert_eq!(row.kind, MovementKind::TransferOut);
        assert_eq!(row.date, date(2023, 6, 1));
        assert_eq!(row.quantity, 512);
        assert_eq!(row.value_per_head, Some(dec!(2925.00)));
        assert_eq!(row.total_value, Some(dec!(1497600.00)));
        assert_eq!(row.note.as_deref(), Some("Lote 1"));
        assert_eq!(row.plan, Some(plan));
    }

    #[test]
    fn upsert_reports_existing_on_second_insert() {
        let (mut store, property, category) = seeded();
        let movement = Movement::new(
            property,
            category,
            MovementKind::TransferIn,
            date(2023, 6, 1),
            512,
        );
        let first = store.upsert_movement(&movement).unwrap();
        let second = store.upsert_movement(&movement).unwrap();
        assert!(first.created());
        assert_eq!(second, Upsert::Existing(first.id()));
    }

    #[test]
    fn identity_treats_missing_plan_as_one_bucket() {
        let (mut store, property, category) = seeded();
        let planless =
            Movement::new(property, category, MovementKind::Birth, date(2024, 1, 1), 10);
        assert!(store.upsert_movement(&planless).unwrap().created());
        assert!(!store.upsert_movement(&planless).unwrap().created());

        let plan = store
            .insert_plan(&Plan::new(2024, 1, date(2024, 1, 2)))
            .unwrap();
        let planned = planless.with_plan(plan);
        assert!(store.upsert_movement(&planned).unwrap().created());
    }

    #[test]
    fn deleting_a_movement_cascades_to_its_sale() {
        let (mut store, property, category) = seeded();
        let pricing = Pricing::new(dec!(450.00), dec!(6.50));
        let mut movement = Movement::new(
            property,
            category,
            MovementKind::Sale,
            date(2022, 2, 1),
            80,
        )
        .with_value_per_head(pricing.value_per_head());
        movement.id = store.insert_movement(&movement).unwrap();
        store
            .insert_sale(&Sale::for_movement(&movement, &pricing, "JBS"))
            .unwrap();
        assert_eq!(
            store
                .sales_in_year(property, category, 2022, None)
                .unwrap()
                .len(),
            1
        );

        store.delete_movement(movement.id).unwrap();
        assert!(store
            .sales_in_year(property, category, 2022, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn rollback_discards_writes() {
        let (mut store, property, category) = seeded();
        store.begin().unwrap();
        store
            .insert_movement(&Movement::new(
                property,
                category,
                MovementKind::Death,
                date(2023, 4, 1),
                2,
            ))
            .unwrap();
        store.rollback().unwrap();
        assert!(store
            .movements_in(property, category, None, date(2024, 1, 1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn concurrent_writer_surfaces_busy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herd.db");
        let mut holder = SqliteStore::open(&path).unwrap();
        let mut prober = SqliteStore::open(&path).unwrap();

        holder.begin().unwrap();
        holder
            .insert_property(&Property::new("Fazenda Favo de Mel"))
            .unwrap();
        let err = prober.probe().unwrap_err();
        assert!(err.is_busy());

        holder.commit().unwrap();
        prober.probe().unwrap();
    }
}
