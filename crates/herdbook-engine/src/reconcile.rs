//! Transfer-pair reconciliation.
//!
//! A transfer is two movements: `TRANSFERENCIA_SAIDA` at the source and
//! `TRANSFERENCIA_ENTRADA` at the destination, same date, same quantity.
//! Field data loses the entrada side often enough that pairing them back
//! up is a standing chore. The category may change in transit when the
//! animals are promoted while moving; the route carries that mapping
//! explicitly.

use crate::{balance, plan_bucket, EngineError, Result};
use chrono::NaiveDate;
use herdbook_core::{
    CategoryId, Movement, MovementId, MovementKey, MovementKind, PlanId, PropertyId,
};
use herdbook_store::{LedgerRead, LedgerWrite};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// One direction of animal traffic between two properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferRoute {
    /// Property the animals leave.
    pub source: PropertyId,
    /// Property the animals arrive at.
    pub destination: PropertyId,
    /// Category recorded on the saída side.
    pub from_category: CategoryId,
    /// Category recorded on the entrada side; differs from `from_category`
    /// when the animals are promoted in transit.
    pub to_category: CategoryId,
}

impl TransferRoute {
    /// A route that keeps the category unchanged.
    #[must_use]
    pub const fn same_category(
        source: PropertyId,
        destination: PropertyId,
        category: CategoryId,
    ) -> Self {
        Self {
            source,
            destination,
            from_category: category,
            to_category: category,
        }
    }

    /// The entrada key that pairs with a given saída.
    fn entrada_key(&self, out: &Movement) -> MovementKey {
        MovementKey {
            property: self.destination,
            category: self.to_category,
            kind: MovementKind::TransferIn,
            date: out.date,
            quantity: out.quantity,
            plan: out.plan,
        }
    }
}

/// What a reconciliation run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// Saídas examined in the window.
    pub examined: usize,
    /// Entradas created for previously unpaired saídas.
    pub created: Vec<Movement>,
    /// Saídas whose entrada already existed.
    pub already_paired: usize,
}

/// Saídas in the window whose matching entrada does not exist. Read-only.
pub fn find_unpaired<S>(
    store: &S,
    route: &TransferRoute,
    from: NaiveDate,
    through: NaiveDate,
) -> Result<Vec<Movement>>
where
    S: LedgerRead + ?Sized,
{
    let outs = store.movements_of_kind(
        route.source,
        MovementKind::TransferOut,
        Some(route.from_category),
        from,
        through,
    )?;
    let mut unpaired = Vec::new();
    for out in outs {
        if store.find_movement(&route.entrada_key(&out))?.is_none() {
            unpaired.push(out);
        }
    }
    Ok(unpaired)
}

/// Creates the missing entrada for every unpaired saída in the window.
///
/// Values and the plan carry over from the saída; the note names the
/// source property. The write goes through the store's upsert, so a
/// concurrent or repeated run skips instead of duplicating.
pub fn create_missing_pairs<S>(
    store: &mut S,
    route: &TransferRoute,
    from: NaiveDate,
    through: NaiveDate,
) -> Result<ReconcileOutcome>
where
    S: LedgerWrite + ?Sized,
{
    let source_name = store
        .property(route.source)?
        .map_or_else(|| route.source.to_string(), |p| p.name);
    let outs = store.movements_of_kind(
        route.source,
        MovementKind::TransferOut,
        Some(route.from_category),
        from,
        through,
    )?;

    let mut outcome = ReconcileOutcome {
        examined: outs.len(),
        created: Vec::new(),
        already_paired: 0,
    };
    for out in outs {
        let mut entrada = Movement::new(
            route.destination,
            route.to_category,
            MovementKind::TransferIn,
            out.date,
            out.quantity,
        )
        .with_note(format!("Transferência recebida de {source_name}"));
        entrada.value_per_head = out.value_per_head;
        entrada.total_value = out.total_value;
        if let Some(plan) = out.plan {
            entrada = entrada.with_plan(plan);
        }

        let upsert = store.upsert_movement(&entrada)?;
        if upsert.created() {
            entrada.id = upsert.id();
            outcome.created.push(entrada);
        } else {
            info!(
                movement = %upsert.id(),
                date = %out.date,
                quantity = out.quantity,
                "entrada already recorded; skipping"
            );
            outcome.already_paired += 1;
        }
    }
    Ok(outcome)
}

/// Whether a rebuild may shrink the transfer to what the source holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuantityPolicy {
    /// Fail with `InsufficientBalance` when the source holds fewer than
    /// requested.
    Exact,
    /// Move `min(requested, available)` and report the shrink.
    ClampToAvailable,
}

/// Instruction to tear a transfer pair down and recreate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildSpec {
    /// Route being corrected.
    pub route: TransferRoute,
    /// Date of the pair.
    pub date: NaiveDate,
    /// Heads the pair should move.
    pub requested: u32,
    /// Plan the recreated pair belongs to.
    pub plan: Option<PlanId>,
    /// Per-head value for both sides, when priced.
    pub value_per_head: Option<Decimal>,
    /// What to do when the source balance is short.
    pub policy: QuantityPolicy,
}

/// What a rebuild did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum RebuildOutcome {
    /// The pair was recreated with this quantity.
    Recreated {
        /// Heads actually moved after policy was applied.
        quantity: u32,
        /// Id of the new saída.
        outbound: MovementId,
        /// Id of the new entrada.
        inbound: MovementId,
        /// Old rows removed before recreation.
        removed: u32,
    },
    /// The old pair was removed and nothing was recreated: the source had
    /// no animals on the date.
    RemovedOnly {
        /// Old rows removed.
        removed: u32,
    },
}

/// Deletes both sides of a transfer pair and recreates them sized to the
/// source's actual balance on the date.
///
/// The old rows go first so the recomputed balance is not depressed by
/// the very saída being corrected. With [`QuantityPolicy::Exact`] a short
/// balance is a hard error and the batch rolls back; with
/// [`QuantityPolicy::ClampToAvailable`] the pair shrinks, or disappears
/// entirely at zero.
pub fn rebuild_pair<S>(store: &mut S, spec: &RebuildSpec) -> Result<RebuildOutcome>
where
    S: LedgerWrite + ?Sized,
{
    let mut removed = 0u32;
    let old_outs = store.movements_of_kind(
        spec.route.source,
        MovementKind::TransferOut,
        Some(spec.route.from_category),
        spec.date,
        spec.date,
    )?;
    let old_ins = store.movements_of_kind(
        spec.route.destination,
        MovementKind::TransferIn,
        Some(spec.route.to_category),
        spec.date,
        spec.date,
    )?;
    for old in old_outs.iter().chain(old_ins.iter()) {
        if plan_bucket(old.plan) == plan_bucket(spec.plan) {
            store.delete_movement(old.id)?;
            removed += 1;
        }
    }

    let available = balance(store, spec.route.source, spec.route.from_category, spec.date)?;
    let quantity = match spec.policy {
        QuantityPolicy::Exact => {
            if available < spec.requested {
                return Err(EngineError::InsufficientBalance {
                    available,
                    requested: spec.requested,
                });
            }
            spec.requested
        }
        QuantityPolicy::ClampToAvailable => spec.requested.min(available),
    };
    if quantity == 0 {
        info!(date = %spec.date, "source balance is zero; pair removed, none recreated");
        return Ok(RebuildOutcome::RemovedOnly { removed });
    }

    let (mut saida, mut entrada) = paired_movements(store, &spec.route, spec.date, quantity)?;
    if let Some(value) = spec.value_per_head {
        saida = saida.with_value_per_head(value);
        entrada = entrada.with_value_per_head(value);
    }
    if let Some(plan) = spec.plan {
        saida = saida.with_plan(plan);
        entrada = entrada.with_plan(plan);
    }

    let outbound = store.insert_movement(&saida)?;
    let inbound = store.insert_movement(&entrada)?;
    Ok(RebuildOutcome::Recreated {
        quantity,
        outbound,
        inbound,
        removed,
    })
}

/// Both sides of a transfer on a route, noted with the counterpart
/// property's name. The caller attaches values and the plan.
pub(crate) fn paired_movements<S>(
    store: &S,
    route: &TransferRoute,
    date: NaiveDate,
    quantity: u32,
) -> Result<(Movement, Movement)>
where
    S: LedgerRead + ?Sized,
{
    let name = |id: PropertyId| -> Result<String> {
        Ok(store.property(id)?.map_or_else(|| id.to_string(), |p| p.name))
    };
    let saida = Movement::new(
        route.source,
        route.from_category,
        MovementKind::TransferOut,
        date,
        quantity,
    )
    .with_note(format!("Transferência para {}", name(route.destination)?));
    let entrada = Movement::new(
        route.destination,
        route.to_category,
        MovementKind::TransferIn,
        date,
        quantity,
    )
    .with_note(format!("Transferência recebida de {}", name(route.source)?));
    Ok((saida, entrada))
}
