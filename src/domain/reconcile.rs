//! Turning requested items into concrete line writes.
//!
//! Planning is pure: products are looked up through a caller-supplied
//! function and nothing is written. The service applies the resulting plan
//! inside the same transaction that produced the inputs, so a plan either
//! lands completely or not at all.

use std::collections::BTreeMap;

use super::auth::Principal;
use super::errors::DomainError;
use super::order::{LineChange, LineUpdate, NewLine, OrderLine, PricedLine, MAX_LINE_QUANTITY};
use super::pricing;
use super::product::Product;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub deletions: Vec<i32>,
    pub updates: Vec<LineUpdate>,
    pub insertions: Vec<PricedLine>,
    pub new_total: i64,
}

enum Fate {
    Remove,
    Update(LineUpdate),
}

/// Compute the insert/update/delete delta of `changes` against `current`.
///
/// Lines not mentioned in `changes` are kept as they are, price snapshot
/// included, and still count towards the new total. Existing lines are
/// re-priced even when their product is no longer available; only new
/// lines are subject to availability. When a line id appears
/// more than once, the last occurrence decides its fate; every occurrence is
/// still validated.
pub fn plan_reconciliation<F>(
    current: &[OrderLine],
    changes: &[LineChange],
    caller: &Principal,
    mut find_product: F,
) -> Result<ReconcilePlan, DomainError>
where
    F: FnMut(i32) -> Result<Option<Product>, DomainError>,
{
    let existing: BTreeMap<i32, &OrderLine> = current.iter().map(|l| (l.id, l)).collect();
    let mut fates: BTreeMap<i32, Fate> = BTreeMap::new();
    let mut insertions = Vec::new();

    for change in changes {
        match *change {
            LineChange::Remove { line_id } => {
                ensure_line_exists(&existing, line_id)?;
                fates.insert(line_id, Fate::Remove);
            }
            LineChange::Update {
                line_id,
                product_id,
                quantity,
            } => {
                ensure_line_exists(&existing, line_id)?;
                validate_quantity(quantity)?;
                let product = find_product(product_id)?.ok_or_else(|| {
                    DomainError::NotFound(format!("product {product_id} not found"))
                })?;
                let priced = price_line(&product, quantity)?;
                fates.insert(
                    line_id,
                    Fate::Update(LineUpdate {
                        id: line_id,
                        product_id,
                        quantity,
                        unit_price: priced.unit_price,
                        line_total: priced.line_total,
                    }),
                );
            }
            LineChange::Insert {
                product_id,
                quantity,
            } => {
                validate_quantity(quantity)?;
                let product = find_product(product_id)?.ok_or_else(|| {
                    DomainError::NotFound(format!("product {product_id} not found"))
                })?;
                ensure_orderable(&product, caller)?;
                insertions.push(price_line(&product, quantity)?);
            }
        }
    }

    let mut deletions = Vec::new();
    let mut updates = Vec::new();
    for (id, fate) in fates {
        match fate {
            Fate::Remove => deletions.push(id),
            Fate::Update(update) => updates.push(update),
        }
    }

    let kept = current
        .iter()
        .filter(|line| !deletions.contains(&line.id) && !updates.iter().any(|u| u.id == line.id))
        .map(|line| line.line_total);
    let new_total = pricing::order_total(
        kept.chain(updates.iter().map(|u| u.line_total))
            .chain(insertions.iter().map(|l| l.line_total)),
    )
    .ok_or_else(out_of_range)?;

    Ok(ReconcilePlan {
        deletions,
        updates,
        insertions,
        new_total,
    })
}

/// Price the items of a brand-new order. Any unknown product aborts the
/// whole order.
pub fn price_new_order<F>(
    items: &[NewLine],
    caller: &Principal,
    mut find_product: F,
) -> Result<(Vec<PricedLine>, i64), DomainError>
where
    F: FnMut(i32) -> Result<Option<Product>, DomainError>,
{
    if items.is_empty() {
        return Err(DomainError::InvalidInput(
            "an order needs at least one item".to_string(),
        ));
    }

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        validate_quantity(item.quantity)?;
        let product = find_product(item.product_id)?.ok_or_else(|| {
            DomainError::InvalidInput(format!("product {} does not exist", item.product_id))
        })?;
        ensure_orderable(&product, caller)?;
        lines.push(price_line(&product, item.quantity)?);
    }

    let total =
        pricing::order_total(lines.iter().map(|l| l.line_total)).ok_or_else(out_of_range)?;
    Ok((lines, total))
}

fn ensure_line_exists(
    existing: &BTreeMap<i32, &OrderLine>,
    line_id: i32,
) -> Result<(), DomainError> {
    if existing.contains_key(&line_id) {
        Ok(())
    } else {
        Err(DomainError::InvalidInput(format!(
            "line {line_id} not found in this order"
        )))
    }
}

fn validate_quantity(quantity: i32) -> Result<(), DomainError> {
    if (1..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(DomainError::InvalidInput(format!(
            "quantity must be between 1 and {MAX_LINE_QUANTITY}, got {quantity}"
        )))
    }
}

/// Clients may only add products that are currently on sale.
fn ensure_orderable(product: &Product, caller: &Principal) -> Result<(), DomainError> {
    if !caller.is_admin() && !product.available {
        return Err(DomainError::InvalidInput(format!(
            "product {} is not available",
            product.name
        )));
    }
    Ok(())
}

fn price_line(product: &Product, quantity: i32) -> Result<PricedLine, DomainError> {
    let line_total = pricing::line_total(product.sale_price, quantity).ok_or_else(out_of_range)?;
    Ok(PricedLine {
        product_id: product.id,
        quantity,
        unit_price: product.sale_price,
        line_total,
    })
}

fn out_of_range() -> DomainError {
    DomainError::InvalidInput("order amount out of range".to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{NaiveDate, Utc};

    use super::*;

    const A: i32 = 100;
    const B: i32 = 200;
    const C: i32 = 300;
    const RETIRED: i32 = 400;

    fn catalog() -> HashMap<i32, Product> {
        [(A, 10, true), (B, 5, true), (C, 7, true), (RETIRED, 3, false)]
            .into_iter()
            .map(|(id, price, available)| {
                (
                    id,
                    Product {
                        id,
                        name: format!("product-{id}"),
                        sale_price: price,
                        gross_price: price / 2,
                        available,
                        last_restocked: NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
                        created_at: Utc::now(),
                        updated_at: Utc::now(),
                    },
                )
            })
            .collect()
    }

    fn line(id: i32, product_id: i32, quantity: i32, unit_price: i64) -> OrderLine {
        OrderLine {
            id,
            order_id: 1,
            product_id,
            quantity,
            unit_price,
            line_total: unit_price * i64::from(quantity),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Lines 1 (A x2 @10) and 2 (B x1 @5), total 25.
    fn current() -> Vec<OrderLine> {
        vec![line(1, A, 2, 10), line(2, B, 1, 5)]
    }

    fn plan(changes: &[LineChange], caller: Principal) -> Result<ReconcilePlan, DomainError> {
        let products = catalog();
        plan_reconciliation(&current(), changes, &caller, |id| {
            Ok(products.get(&id).cloned())
        })
    }

    #[test]
    fn omitted_lines_are_kept_and_counted() {
        let plan = plan(
            &[
                LineChange::Update {
                    line_id: 1,
                    product_id: A,
                    quantity: 3,
                },
                LineChange::Insert {
                    product_id: C,
                    quantity: 1,
                },
            ],
            Principal::client(1),
        )
        .expect("plan");

        assert_eq!(plan.new_total, 30 + 5 + 7);
        assert!(plan.deletions.is_empty());
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].line_total, 30);
        assert_eq!(plan.insertions.len(), 1);
        assert_eq!(plan.insertions[0].unit_price, 7);
    }

    #[test]
    fn removal_only_keeps_the_rest() {
        let plan = plan(&[LineChange::Remove { line_id: 1 }], Principal::client(1)).expect("plan");
        assert_eq!(plan.deletions, vec![1]);
        assert_eq!(plan.new_total, 5);
    }

    #[test]
    fn resubmitting_unchanged_lines_keeps_totals() {
        let plan = plan(
            &[
                LineChange::Update {
                    line_id: 1,
                    product_id: A,
                    quantity: 2,
                },
                LineChange::Update {
                    line_id: 2,
                    product_id: B,
                    quantity: 1,
                },
            ],
            Principal::client(1),
        )
        .expect("plan");
        assert_eq!(plan.new_total, 25);
        assert_eq!(plan.updates[0].line_total, 20);
        assert_eq!(plan.updates[1].line_total, 5);
    }

    #[test]
    fn empty_request_keeps_everything() {
        let plan = plan(&[], Principal::client(1)).expect("plan");
        assert_eq!(plan.new_total, 25);
        assert!(plan.updates.is_empty() && plan.insertions.is_empty() && plan.deletions.is_empty());
    }

    #[test]
    fn unknown_line_id_aborts() {
        let err = plan(
            &[
                LineChange::Insert {
                    product_id: C,
                    quantity: 1,
                },
                LineChange::Remove { line_id: 99 },
            ],
            Principal::client(1),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(msg) if msg.contains("line 99")));
    }

    #[test]
    fn unknown_product_aborts() {
        let err = plan(
            &[LineChange::Insert {
                product_id: 9999,
                quantity: 1,
            }],
            Principal::client(1),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let err = plan(
            &[LineChange::Update {
                line_id: 1,
                product_id: 9999,
                quantity: 1,
            }],
            Principal::admin(7),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn non_positive_quantity_is_not_a_removal() {
        for quantity in [0, -3] {
            let err = plan(
                &[LineChange::Update {
                    line_id: 1,
                    product_id: A,
                    quantity,
                }],
                Principal::client(1),
            )
            .unwrap_err();
            assert!(matches!(err, DomainError::InvalidInput(_)));
        }
    }

    #[test]
    fn clients_cannot_pick_unavailable_products_but_admins_can() {
        let change = [LineChange::Insert {
            product_id: RETIRED,
            quantity: 2,
        }];
        let err = plan(&change, Principal::client(1)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(msg) if msg.contains("not available")));

        let plan = plan(&change, Principal::admin(7)).expect("admin plan");
        assert_eq!(plan.new_total, 25 + 6);
    }

    #[test]
    fn existing_lines_stay_editable_after_product_is_withdrawn() {
        let retired_line = vec![line(1, A, 2, 10), line(2, RETIRED, 1, 3)];
        let products = catalog();
        let plan = plan_reconciliation(
            &retired_line,
            &[
                LineChange::Update {
                    line_id: 2,
                    product_id: RETIRED,
                    quantity: 1,
                },
                LineChange::Update {
                    line_id: 1,
                    product_id: A,
                    quantity: 2,
                },
            ],
            &Principal::client(1),
            |id| Ok(products.get(&id).cloned()),
        )
        .expect("resubmission");
        assert_eq!(plan.new_total, 23);

        let plan = plan_reconciliation(
            &retired_line,
            &[LineChange::Update {
                line_id: 2,
                product_id: RETIRED,
                quantity: 4,
            }],
            &Principal::client(1),
            |id| Ok(products.get(&id).cloned()),
        )
        .expect("quantity change");
        assert_eq!(plan.updates[0].line_total, 12);
        assert_eq!(plan.new_total, 20 + 12);
    }

    #[test]
    fn duplicate_line_id_last_write_wins() {
        let plan = plan(
            &[
                LineChange::Update {
                    line_id: 1,
                    product_id: A,
                    quantity: 5,
                },
                LineChange::Remove { line_id: 1 },
            ],
            Principal::client(1),
        )
        .expect("plan");
        assert_eq!(plan.deletions, vec![1]);
        assert!(plan.updates.is_empty());
        assert_eq!(plan.new_total, 5);

        let plan = self::plan(
            &[
                LineChange::Remove { line_id: 2 },
                LineChange::Update {
                    line_id: 2,
                    product_id: C,
                    quantity: 2,
                },
            ],
            Principal::client(1),
        )
        .expect("plan");
        assert!(plan.deletions.is_empty());
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.new_total, 20 + 14);
    }

    #[test]
    fn update_reprices_from_current_catalog() {
        let mut products = catalog();
        if let Some(a) = products.get_mut(&A) {
            a.sale_price = 12;
        }
        let plan = plan_reconciliation(
            &current(),
            &[LineChange::Update {
                line_id: 1,
                product_id: A,
                quantity: 2,
            }],
            &Principal::client(1),
            |id| Ok(products.get(&id).cloned()),
        )
        .expect("plan");
        assert_eq!(plan.updates[0].unit_price, 12);
        assert_eq!(plan.new_total, 24 + 5);
    }

    #[test]
    fn lookup_failure_propagates() {
        let err = plan_reconciliation(
            &current(),
            &[LineChange::Insert {
                product_id: A,
                quantity: 1,
            }],
            &Principal::client(1),
            |_| Err(DomainError::Internal("connection reset".into())),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
    }

    #[test]
    fn new_order_is_priced_from_catalog() {
        let products = catalog();
        let (lines, total) = price_new_order(
            &[
                NewLine {
                    product_id: A,
                    quantity: 2,
                },
                NewLine {
                    product_id: C,
                    quantity: 3,
                },
            ],
            &Principal::client(1),
            |id| Ok(products.get(&id).cloned()),
        )
        .expect("priced");
        assert_eq!(lines.len(), 2);
        assert_eq!(total, 20 + 21);
    }

    #[test]
    fn new_order_with_missing_product_names_it() {
        let products = catalog();
        let err = price_new_order(
            &[
                NewLine {
                    product_id: A,
                    quantity: 1,
                },
                NewLine {
                    product_id: 4242,
                    quantity: 1,
                },
            ],
            &Principal::client(1),
            |id| Ok(products.get(&id).cloned()),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(msg) if msg.contains("4242")));
    }

    #[test]
    fn new_order_needs_items() {
        let err = price_new_order(&[], &Principal::client(1), |_| Ok(None)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn overflowing_amounts_are_rejected() {
        let mut products = catalog();
        if let Some(a) = products.get_mut(&A) {
            a.sale_price = i64::MAX / 2;
        }
        let err = price_new_order(
            &[NewLine {
                product_id: A,
                quantity: 3,
            }],
            &Principal::admin(1),
            |id| Ok(products.get(&id).cloned()),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(msg) if msg.contains("out of range")));
    }
}
