//! `Vec`-backed store for tests and dry runs.

use crate::{LedgerRead, LedgerWrite, Result, StoreError, Upsert};
use chrono::{Datelike, NaiveDate};
use herdbook_core::{
    Category, CategoryId, Movement, MovementId, MovementKey, MovementKind, Plan, PlanId, Property,
    PropertyId, Sale, SaleId, Snapshot, SnapshotId,
};

#[derive(Debug, Default, Clone)]
struct Tables {
    properties: Vec<Property>,
    categories: Vec<Category>,
    plans: Vec<Plan>,
    snapshots: Vec<Snapshot>,
    movements: Vec<Movement>,
    sales: Vec<Sale>,
    next_property: i64,
    next_category: i64,
    next_plan: i64,
    next_snapshot: i64,
    next_movement: i64,
    next_sale: i64,
}

impl Tables {
    fn next(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// In-memory store with the same observable behavior as [`crate::SqliteStore`].
///
/// Ids are monotonic and never reused, so insertion order survives
/// delete-and-recreate cycles. A transaction keeps an undo image of all
/// tables; rollback restores it wholesale.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
    saved: Option<Box<Tables>>,
    busy_probes: u32,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` calls to [`LedgerWrite::probe`] report the store
    /// busy, so retry behavior can be exercised without a second writer.
    pub fn fail_next_probes(&mut self, n: u32) {
        self.busy_probes = n;
    }

    fn plan_bucket(plan: Option<PlanId>) -> i64 {
        plan.map_or(0, |p| p.0)
    }
}

impl LedgerRead for MemoryStore {
    fn find_properties(&self, name_like: &str) -> Result<Vec<Property>> {
        let needle = name_like.to_lowercase();
        let mut found: Vec<Property> = self
            .tables
            .properties
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    fn property(&self, id: PropertyId) -> Result<Option<Property>> {
        Ok(self.tables.properties.iter().find(|p| p.id == id).cloned())
    }

    fn category_by_name(&self, name: &str) -> Result<Option<Category>> {
        Ok(self
            .tables
            .categories
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    fn category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.tables.categories.iter().find(|c| c.id == id).cloned())
    }

    fn current_plan(&self) -> Result<Option<Plan>> {
        Ok(self
            .tables
            .plans
            .iter()
            .max_by_key(|p| (p.created_on, p.year))
            .cloned())
    }

    fn plan(&self, id: PlanId) -> Result<Option<Plan>> {
        Ok(self.tables.plans.iter().find(|p| p.id == id).cloned())
    }

    fn snapshots_through(
        &self,
        property: PropertyId,
        category: CategoryId,
        through: NaiveDate,
    ) -> Result<Vec<Snapshot>> {
        let mut rows: Vec<Snapshot> = self
            .tables
            .snapshots
            .iter()
            .filter(|s| s.property == property && s.category == category && s.date <= through)
            .cloned()
            .collect();
        rows.sort_by_key(|s| (s.date, s.id));
        Ok(rows)
    }

    fn movements_in(
        &self,
        property: PropertyId,
        category: CategoryId,
        after: Option<NaiveDate>,
        through: NaiveDate,
    ) -> Result<Vec<Movement>> {
        let mut rows: Vec<Movement> = self
            .tables
            .movements
            .iter()
            .filter(|m| {
                m.property == property
                    && m.category == category
                    && m.date <= through
                    && after.map_or(true, |a| m.date > a)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.date, m.id));
        Ok(rows)
    }

    fn movements_of_kind(
        &self,
        property: PropertyId,
        kind: MovementKind,
        category: Option<CategoryId>,
        from: NaiveDate,
        through: NaiveDate,
    ) -> Result<Vec<Movement>> {
        let mut rows: Vec<Movement> = self
            .tables
            .movements
            .iter()
            .filter(|m| {
                m.property == property
                    && m.kind == kind
                    && category.map_or(true, |c| m.category == c)
                    && m.date >= from
                    && m.date <= through
            })
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.date, m.id));
        Ok(rows)
    }

    fn find_movement(&self, key: &MovementKey) -> Result<Option<MovementId>> {
        Ok(self
            .tables
            .movements
            .iter()
            .find(|m| {
                m.property == key.property
                    && m.category == key.category
                    && m.kind == key.kind
                    && m.date == key.date
                    && m.quantity == key.quantity
                    && Self::plan_bucket(m.plan) == Self::plan_bucket(key.plan)
            })
            .map(|m| m.id))
    }

    fn sales_in_year(
        &self,
        property: PropertyId,
        category: CategoryId,
        year: i32,
        plan: Option<PlanId>,
    ) -> Result<Vec<(Movement, Sale)>> {
        let mut movements: Vec<Movement> = self
            .tables
            .movements
            .iter()
            .filter(|m| {
                m.property == property
                    && m.category == category
                    && m.kind == MovementKind::Sale
                    && m.date.year() == year
                    && Self::plan_bucket(m.plan) == Self::plan_bucket(plan)
            })
            .cloned()
            .collect();
        movements.sort_by_key(|m| (m.date, m.id));
        let mut rows = Vec::with_capacity(movements.len());
        for movement in movements {
            if let Some(sale) = self.tables.sales.iter().find(|s| s.movement == movement.id) {
                rows.push((movement, sale.clone()));
            }
        }
        Ok(rows)
    }
}

impl LedgerWrite for MemoryStore {
    fn insert_property(&mut self, property: &Property) -> Result<PropertyId> {
        if self.tables.properties.iter().any(|p| p.name == property.name) {
            return Err(StoreError::Constraint(format!(
                "property name not unique: {}",
                property.name
            )));
        }
        let id = PropertyId(Tables::next(&mut self.tables.next_property));
        let mut row = property.clone();
        row.id = id;
        self.tables.properties.push(row);
        Ok(id)
    }

    fn insert_category(&mut self, category: &Category) -> Result<CategoryId> {
        if self.tables.categories.iter().any(|c| c.name == category.name) {
            return Err(StoreError::Constraint(format!(
                "category name not unique: {}",
                category.name
            )));
        }
        let id = CategoryId(Tables::next(&mut self.tables.next_category));
        let mut row = category.clone();
        row.id = id;
        self.tables.categories.push(row);
        Ok(id)
    }

    fn insert_plan(&mut self, plan: &Plan) -> Result<PlanId> {
        if self.tables.plans.iter().any(|p| p.code == plan.code) {
            return Err(StoreError::Constraint(format!(
                "plan code not unique: {}",
                plan.code
            )));
        }
        let id = PlanId(Tables::next(&mut self.tables.next_plan));
        let mut row = plan.clone();
        row.id = id;
        self.tables.plans.push(row);
        Ok(id)
    }

    fn insert_snapshot(&mut self, snapshot: &Snapshot) -> Result<SnapshotId> {
        let id = SnapshotId(Tables::next(&mut self.tables.next_snapshot));
        let mut row = snapshot.clone();
        row.id = id;
        self.tables.snapshots.push(row);
        Ok(id)
    }

    fn insert_movement(&mut self, movement: &Movement) -> Result<MovementId> {
        if self.find_movement(&movement.key())?.is_some() {
            return Err(StoreError::Constraint(
                "movement key not unique".to_string(),
            ));
        }
        let id = MovementId(Tables::next(&mut self.tables.next_movement));
        let mut row = movement.clone();
        row.id = id;
        self.tables.movements.push(row);
        Ok(id)
    }

    fn upsert_movement(&mut self, movement: &Movement) -> Result<Upsert> {
        if let Some(id) = self.find_movement(&movement.key())? {
            return Ok(Upsert::Existing(id));
        }
        let id = MovementId(Tables::next(&mut self.tables.next_movement));
        let mut row = movement.clone();
        row.id = id;
        self.tables.movements.push(row);
        Ok(Upsert::Created(id))
    }

    fn insert_sale(&mut self, sale: &Sale) -> Result<SaleId> {
        if !self.tables.movements.iter().any(|m| m.id == sale.movement) {
            return Err(StoreError::Constraint(format!(
                "sale references missing movement {}",
                sale.movement
            )));
        }
        if self.tables.sales.iter().any(|s| s.movement == sale.movement) {
            return Err(StoreError::Constraint(format!(
                "movement {} already has a sale",
                sale.movement
            )));
        }
        let id = SaleId(Tables::next(&mut self.tables.next_sale));
        let mut row = sale.clone();
        row.id = id;
        self.tables.sales.push(row);
        Ok(id)
    }

    fn update_sale_values(&mut self, sale: &Sale) -> Result<()> {
        let Some(row) = self.tables.sales.iter_mut().find(|s| s.id == sale.id) else {
            return Err(StoreError::Constraint(format!(
                "no sale with id {}",
                sale.id
            )));
        };
        let movement_id = row.movement;
        row.customer = sale.customer.clone();
        row.avg_weight_kg = sale.avg_weight_kg;
        row.total_weight_kg = sale.total_weight_kg;
        row.price_per_kg = sale.price_per_kg;
        row.value_per_head = sale.value_per_head;
        row.total_value = sale.total_value;
        row.receipt_date = sale.receipt_date;
        row.payment_term_days = sale.payment_term_days;
        if let Some(movement) = self
            .tables
            .movements
            .iter_mut()
            .find(|m| m.id == movement_id)
        {
            movement.value_per_head = Some(sale.value_per_head);
            movement.total_value = Some(sale.total_value);
        }
        Ok(())
    }

    fn delete_movement(&mut self, id: MovementId) -> Result<()> {
        self.tables.movements.retain(|m| m.id != id);
        self.tables.sales.retain(|s| s.movement != id);
        Ok(())
    }

    fn delete_sales_in_year(
        &mut self,
        property: PropertyId,
        category: CategoryId,
        year: i32,
        plan: Option<PlanId>,
    ) -> Result<u32> {
        let doomed: Vec<MovementId> = self
            .tables
            .movements
            .iter()
            .filter(|m| {
                m.property == property
                    && m.category == category
                    && m.kind == MovementKind::Sale
                    && m.date.year() == year
                    && Self::plan_bucket(m.plan) == Self::plan_bucket(plan)
            })
            .map(|m| m.id)
            .collect();
        for id in &doomed {
            self.tables.movements.retain(|m| m.id != *id);
            self.tables.sales.retain(|s| s.movement != *id);
        }
        Ok(doomed.len() as u32)
    }

    fn begin(&mut self) -> Result<()> {
        if self.saved.is_some() {
            return Err(StoreError::Constraint(
                "transaction already open".to_string(),
            ));
        }
        self.saved = Some(Box::new(self.tables.clone()));
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.saved.take().is_none() {
            return Err(StoreError::Constraint("no open transaction".to_string()));
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        match self.saved.take() {
            Some(saved) => {
                self.tables = *saved;
                Ok(())
            }
            None => Err(StoreError::Constraint("no open transaction".to_string())),
        }
    }

    fn probe(&mut self) -> Result<()> {
        if self.busy_probes > 0 {
            self.busy_probes -= 1;
            return Err(StoreError::Busy);
        }
        Ok(())
    }
}
