use std::time::Instant;

use common::ItemId;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogItem;
use crate::error::DomainError;
use crate::store::UnitOfWork;

/// One line to reserve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: u32,
}

/// A committed stock decrement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    pub item_id: ItemId,
    pub quantity: u32,

    /// Stock left after the decrement.
    pub remaining: i64,
}

/// A decrement that passed validation against a locked snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDecrement {
    pub item_id: ItemId,
    pub quantity: u32,
    pub available: i64,
}

/// Merges lines that reference the same item, keeping first-seen order.
pub fn merge_lines(lines: &[ReservationLine]) -> Result<Vec<ReservationLine>, DomainError> {
    let mut merged: Vec<ReservationLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|m| m.item_id == line.item_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or_else(|| DomainError::quantity_too_large(&line.item_id))?;
            }
            None => merged.push(line.clone()),
        }
    }
    Ok(merged)
}

/// Validates lines against a snapshot of locked catalog items.
///
/// Fails on the first line, in line order, whose item is missing or does not
/// have enough stock. A missing item reports zero available units.
pub fn plan_reservation(
    lines: &[ReservationLine],
    snapshot: &[CatalogItem],
) -> Result<Vec<PlannedDecrement>, DomainError> {
    if lines.is_empty() {
        return Err(DomainError::Validation(
            "nothing to reserve".to_string(),
        ));
    }

    merge_lines(lines)?
        .into_iter()
        .map(|line| {
            let item = snapshot.iter().find(|item| item.id == line.item_id);
            match item {
                Some(item) if item.has_stock(line.quantity) => Ok(PlannedDecrement {
                    item_id: line.item_id,
                    quantity: line.quantity,
                    available: item.stock,
                }),
                Some(item) => Err(DomainError::InsufficientStock {
                    item_id: line.item_id,
                    item_name: item.name.clone(),
                    available: item.stock,
                    requested: line.quantity,
                }),
                None => Err(DomainError::InsufficientStock {
                    item_id: line.item_id,
                    item_name: line.item_name,
                    available: 0,
                    requested: line.quantity,
                }),
            }
        })
        .collect()
}

/// Reserves stock for every line, or for none.
///
/// Locks the referenced items in id order, validates the whole set, then
/// applies one conditional decrement per item. On any error the caller must
/// roll back `uow`; decrements already applied are undone with it.
pub async fn reserve<U: UnitOfWork>(
    uow: &mut U,
    lines: &[ReservationLine],
) -> Result<Vec<StockChange>, DomainError> {
    let start = Instant::now();

    let mut ids: Vec<ItemId> = lines.iter().map(|line| line.item_id.clone()).collect();
    ids.sort();
    ids.dedup();
    let snapshot = uow.lock_items(&ids).await?;

    let plan = match plan_reservation(lines, &snapshot) {
        Ok(plan) => plan,
        Err(e) => {
            metrics::counter!("stock_reservations_total", "outcome" => "insufficient").increment(1);
            tracing::debug!(error = %e, "Reservation rejected during validation");
            return Err(e);
        }
    };

    let mut changes = Vec::with_capacity(plan.len());
    for step in plan {
        match uow.decrement_stock(&step.item_id, step.quantity).await? {
            Some(remaining) if remaining >= 0 => changes.push(StockChange {
                item_id: step.item_id,
                quantity: step.quantity,
                remaining,
            }),
            outcome => {
                metrics::counter!("stock_reservations_total", "outcome" => "inconsistent").increment(1);
                tracing::error!(
                    item_id = %step.item_id,
                    quantity = step.quantity,
                    validated_stock = step.available,
                    ?outcome,
                    "Conditional stock decrement refused after validation"
                );
                return Err(DomainError::InternalConsistency(format!(
                    "stock decrement of {} by {} was refused after validation",
                    step.item_id, step.quantity
                )));
            }
        }
    }

    metrics::counter!("stock_reservations_total", "outcome" => "reserved").increment(1);
    metrics::histogram!("stock_reservation_duration_seconds").record(start.elapsed().as_secs_f64());

    Ok(changes)
}
