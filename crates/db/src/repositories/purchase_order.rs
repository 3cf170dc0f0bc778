//! Purchase order repository.
//!
//! Every operation takes an explicit [`Actor`]. Listings compose the
//! actor's [`TenantScope`] into the SQL predicate; lookups fetch by ID
//! and then authorize against the row's organization/branch, so a
//! request for a foreign order fails with access denied rather than
//! pretending the order does not exist.
//!
//! State transitions re-read the order under `FOR UPDATE`, so of two
//! concurrent transitions exactly one wins and the loser fails the
//! status check.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use kasira_core::procurement::{
    LifecycleAction, LifecycleError, LifecycleService, LineItemInput, OrderCharges, PricingError,
    PurchaseOrderStatus, Receipt, format_po_number, pricing,
};
use kasira_core::scope::{Actor, ScopeError, ScopeResolver, TenantRef, TenantScope};
use kasira_shared::{AppError, PageRequest, PageResponse};

use crate::entities::{branches, po_number_sequences, purchase_order_items, purchase_orders};

/// Error types for purchase order operations.
#[derive(Debug, thiserror::Error)]
pub enum PurchaseOrderError {
    /// Purchase order not found.
    #[error("purchase order not found: {0}")]
    NotFound(Uuid),

    /// Purchase order item not found.
    #[error("purchase order item not found: {0}")]
    ItemNotFound(Uuid),

    /// Branch not found.
    #[error("branch not found: {0}")]
    BranchNotFound(Uuid),

    /// Tenant boundary violation.
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// State machine violation.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Invalid item or charge figures.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PurchaseOrderError> for AppError {
    fn from(err: PurchaseOrderError) -> Self {
        match err {
            PurchaseOrderError::NotFound(_)
            | PurchaseOrderError::ItemNotFound(_)
            | PurchaseOrderError::BranchNotFound(_) => Self::NotFound(err.to_string()),
            PurchaseOrderError::Scope(e) => e.into(),
            PurchaseOrderError::Lifecycle(e) => e.into(),
            PurchaseOrderError::Pricing(e) => e.into(),
            PurchaseOrderError::Database(e) => {
                if matches!(
                    e.sql_err(),
                    Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
                ) {
                    return Self::Conflict(
                        "a concurrent request reserved the same purchase order number, please retry"
                            .to_string(),
                    );
                }
                tracing::error!(error = %e, "purchase order database error");
                Self::Unexpected("an internal error occurred".to_string())
            }
        }
    }
}

/// Input for creating a purchase order.
#[derive(Debug, Clone)]
pub struct CreatePurchaseOrderInput {
    /// Branch the order belongs to.
    pub branch_id: Uuid,
    /// Supplier the order is placed with.
    pub supplier_id: Uuid,
    /// Order date; also drives the PO number.
    pub order_date: NaiveDate,
    /// Expected delivery date.
    pub expected_delivery_date: Option<NaiveDate>,
    /// Payment terms, free form.
    pub payment_terms: Option<String>,
    /// Delivery address.
    pub delivery_address: Option<String>,
    /// Order notes.
    pub notes: Option<String>,
    /// Line items. Must be non-empty.
    pub items: Vec<LineItemInput>,
    /// Order-level charges.
    pub charges: OrderCharges,
}

/// Input for updating a draft purchase order.
#[derive(Debug, Clone, Default)]
pub struct UpdatePurchaseOrderInput {
    /// Replacement supplier.
    pub supplier_id: Option<Uuid>,
    /// Replacement order date.
    pub order_date: Option<NaiveDate>,
    /// Replacement expected delivery date.
    pub expected_delivery_date: Option<NaiveDate>,
    /// Replacement payment terms.
    pub payment_terms: Option<String>,
    /// Replacement delivery address.
    pub delivery_address: Option<String>,
    /// Replacement notes.
    pub notes: Option<String>,
    /// Full replacement of the line items when present.
    pub items: Option<Vec<LineItemInput>>,
    /// Replacement flat tax amount.
    pub tax_amount: Option<Decimal>,
    /// Replacement flat discount amount.
    pub discount_amount: Option<Decimal>,
    /// Replacement shipping cost.
    pub shipping_cost: Option<Decimal>,
    /// Replacement amount paid.
    pub amount_paid: Option<Decimal>,
}

/// Filter options for listing purchase orders.
#[derive(Debug, Clone, Default)]
pub struct PurchaseOrderFilter {
    /// Filter by status.
    pub status: Option<PurchaseOrderStatus>,
    /// Filter by supplier.
    pub supplier_id: Option<Uuid>,
    /// Narrow to one branch. Scope predicates still apply.
    pub branch_id: Option<Uuid>,
    /// Substring match on the PO number.
    pub search: Option<String>,
    /// Filter by order date range start.
    pub date_from: Option<NaiveDate>,
    /// Filter by order date range end.
    pub date_to: Option<NaiveDate>,
    /// Include soft-deleted orders.
    pub include_deleted: bool,
}

/// Purchase order with its items.
#[derive(Debug, Clone)]
pub struct PurchaseOrderWithItems {
    /// Order header.
    pub order: purchase_orders::Model,
    /// Line items.
    pub items: Vec<purchase_order_items::Model>,
}

/// Outcome of receiving stock against one item.
#[derive(Debug, Clone)]
pub struct ReceiveOutcome {
    /// Order header after the receipt.
    pub order: purchase_orders::Model,
    /// The item that absorbed the receipt.
    pub item: purchase_order_items::Model,
    /// Item counters after the receipt.
    pub receipt: Receipt,
    /// The resulting transition.
    pub action: LifecycleAction,
}

/// Purchase order repository.
#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    db: Arc<DatabaseConnection>,
}

impl PurchaseOrderRepository {
    /// Creates a new purchase order repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a purchase order with its items.
    ///
    /// The PO number is reserved from the per-day sequence inside the
    /// same transaction that inserts the order, so concurrent creates
    /// on the same day never collide.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch does not exist, the actor is out
    /// of scope, the items fail validation, or the database fails.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreatePurchaseOrderInput,
    ) -> Result<PurchaseOrderWithItems, PurchaseOrderError> {
        let branch = branches::Entity::find_by_id(input.branch_id)
            .one(&*self.db)
            .await?
            .ok_or(PurchaseOrderError::BranchNotFound(input.branch_id))?;
        ScopeResolver::authorize(
            actor,
            TenantRef {
                organization_id: branch.organization_id,
                branch_id: branch.id,
            },
        )?;

        let priced = pricing::price_items(&input.items)?;
        let totals = pricing::order_totals(&priced, &input.charges)?;

        let txn = self.db.begin().await?;

        let sequence = next_po_sequence(&txn, input.order_date).await?;
        let po_number = format_po_number(input.order_date, sequence);

        let now = Utc::now().into();
        let order_id = Uuid::new_v4();
        let order = purchase_orders::ActiveModel {
            id: Set(order_id),
            organization_id: Set(branch.organization_id),
            branch_id: Set(branch.id),
            supplier_id: Set(input.supplier_id),
            po_number: Set(po_number),
            status: Set(PurchaseOrderStatus::Draft.into()),
            order_date: Set(input.order_date),
            expected_delivery_date: Set(input.expected_delivery_date),
            actual_delivery_date: Set(None),
            subtotal: Set(totals.subtotal),
            tax_amount: Set(input.charges.tax_amount),
            discount_amount: Set(input.charges.discount_amount),
            shipping_cost: Set(input.charges.shipping_cost),
            total_amount: Set(totals.total_amount),
            amount_paid: Set(input.charges.amount_paid),
            amount_due: Set(totals.amount_due),
            payment_terms: Set(input.payment_terms),
            delivery_address: Set(input.delivery_address),
            notes: Set(input.notes),
            created_by: Set(actor.user_id),
            approved_by: Set(None),
            approved_at: Set(None),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let items = insert_items(&txn, order_id, &priced).await?;

        txn.commit().await?;

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// Lists purchase orders visible to the actor, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: PurchaseOrderFilter,
        page: PageRequest,
    ) -> Result<PageResponse<purchase_orders::Model>, PurchaseOrderError> {
        let scope = ScopeResolver::scope_for(actor);
        let mut query = purchase_orders::Entity::find().filter(scope_condition(&scope));

        if !filter.include_deleted {
            query = query.filter(purchase_orders::Column::DeletedAt.is_null());
        }
        if let Some(status) = filter.status {
            let db_status: crate::entities::sea_orm_active_enums::PurchaseOrderStatus =
                status.into();
            query = query.filter(purchase_orders::Column::Status.eq(db_status));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(purchase_orders::Column::SupplierId.eq(supplier_id));
        }
        // Branch users are already pinned to their branch by the scope
        // predicate; the optional filter only narrows wider scopes.
        if let Some(branch_id) = filter.branch_id
            && matches!(
                scope,
                TenantScope::Unrestricted | TenantScope::Organization(_)
            )
        {
            query = query.filter(purchase_orders::Column::BranchId.eq(branch_id));
        }
        if let Some(search) = filter.search {
            query = query.filter(purchase_orders::Column::PoNumber.contains(&search));
        }
        if let Some(date_from) = filter.date_from {
            query = query.filter(purchase_orders::Column::OrderDate.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(purchase_orders::Column::OrderDate.lte(date_to));
        }

        let paginator = query
            .order_by_desc(purchase_orders::Column::OrderDate)
            .order_by_desc(purchase_orders::Column::CreatedAt)
            .paginate(&*self.db, page.limit());

        let total = paginator.num_items().await?;
        let rows = paginator
            .fetch_page(u64::from(page.page.saturating_sub(1)))
            .await?;

        Ok(PageResponse::new(
            rows,
            page.page.max(1),
            page.per_page_clamped(),
            total,
        ))
    }

    /// Gets a purchase order with its items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such order exists and `Scope` if it
    /// belongs to a tenant the actor may not see.
    pub async fn find_with_items(
        &self,
        actor: &Actor,
        order_id: Uuid,
        include_deleted: bool,
    ) -> Result<PurchaseOrderWithItems, PurchaseOrderError> {
        let mut query = purchase_orders::Entity::find_by_id(order_id);
        if !include_deleted {
            query = query.filter(purchase_orders::Column::DeletedAt.is_null());
        }
        let order = query
            .one(&*self.db)
            .await?
            .ok_or(PurchaseOrderError::NotFound(order_id))?;
        authorize_row(actor, &order)?;

        let items = purchase_order_items::Entity::find()
            .filter(purchase_order_items::Column::PurchaseOrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// Updates a draft purchase order, optionally replacing its items,
    /// and recomputes all totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found, out of scope, not a
    /// draft, or fails validation.
    pub async fn update(
        &self,
        actor: &Actor,
        order_id: Uuid,
        input: UpdatePurchaseOrderInput,
    ) -> Result<PurchaseOrderWithItems, PurchaseOrderError> {
        let txn = self.db.begin().await?;

        let order = fetch_locked(&txn, order_id).await?;
        authorize_row(actor, &order)?;
        LifecycleService::ensure_editable(order.status.clone().into())?;

        let charges = merge_charges(&order, &input);

        let items = if let Some(new_items) = input.items {
            let priced = pricing::price_items(&new_items)?;
            purchase_order_items::Entity::delete_many()
                .filter(purchase_order_items::Column::PurchaseOrderId.eq(order_id))
                .exec(&txn)
                .await?;
            insert_items(&txn, order_id, &priced).await?
        } else {
            purchase_order_items::Entity::find()
                .filter(purchase_order_items::Column::PurchaseOrderId.eq(order_id))
                .all(&txn)
                .await?
        };

        let priced = pricing::price_items(&items.iter().map(line_input).collect::<Vec<_>>())?;
        let totals = pricing::order_totals(&priced, &charges)?;

        let mut active: purchase_orders::ActiveModel = order.into();
        if let Some(supplier_id) = input.supplier_id {
            active.supplier_id = Set(supplier_id);
        }
        if let Some(order_date) = input.order_date {
            active.order_date = Set(order_date);
        }
        if let Some(expected) = input.expected_delivery_date {
            active.expected_delivery_date = Set(Some(expected));
        }
        if let Some(terms) = input.payment_terms {
            active.payment_terms = Set(Some(terms));
        }
        if let Some(address) = input.delivery_address {
            active.delivery_address = Set(Some(address));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.subtotal = Set(totals.subtotal);
        active.tax_amount = Set(charges.tax_amount);
        active.discount_amount = Set(charges.discount_amount);
        active.shipping_cost = Set(charges.shipping_cost);
        active.total_amount = Set(totals.total_amount);
        active.amount_paid = Set(charges.amount_paid);
        active.amount_due = Set(totals.amount_due);
        active.updated_at = Set(Utc::now().into());
        let order = active.update(&txn).await?;

        txn.commit().await?;

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// Submits a draft order for approval.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is missing, out of scope, or not
    /// a draft.
    pub async fn submit(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<(purchase_orders::Model, LifecycleAction), PurchaseOrderError> {
        self.transition(actor, order_id, LifecycleService::submit)
            .await
    }

    /// Approves a pending order, stamping the approver.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is missing, out of scope, or not
    /// pending.
    pub async fn approve(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<(purchase_orders::Model, LifecycleAction), PurchaseOrderError> {
        let approver = actor.user_id;
        self.transition(actor, order_id, move |status| {
            LifecycleService::approve(status, approver)
        })
        .await
    }

    /// Cancels a non-terminal order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is missing, out of scope, or
    /// already received or cancelled.
    pub async fn cancel(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<(purchase_orders::Model, LifecycleAction), PurchaseOrderError> {
        self.transition(actor, order_id, LifecycleService::cancel)
            .await
    }

    /// Receives a quantity against one item of an approved order.
    ///
    /// Updates the item's counters, then moves the order to
    /// `partially_received` or `received` depending on whether every
    /// item is now complete.
    ///
    /// # Errors
    ///
    /// Returns an error if the order or item is missing, out of scope,
    /// not receivable, or the quantity is invalid.
    pub async fn receive(
        &self,
        actor: &Actor,
        order_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<ReceiveOutcome, PurchaseOrderError> {
        let txn = self.db.begin().await?;

        let order = fetch_locked(&txn, order_id).await?;
        authorize_row(actor, &order)?;

        let status: PurchaseOrderStatus = order.status.clone().into();
        if !status.is_receivable() {
            return Err(LifecycleError::InvalidTransition {
                from: status,
                to: PurchaseOrderStatus::PartiallyReceived,
            }
            .into());
        }

        let item = purchase_order_items::Entity::find_by_id(item_id)
            .filter(purchase_order_items::Column::PurchaseOrderId.eq(order_id))
            .one(&txn)
            .await?
            .ok_or(PurchaseOrderError::ItemNotFound(item_id))?;

        let receipt =
            LifecycleService::apply_receipt(item.quantity_ordered, item.quantity_received, quantity)?;

        let mut active: purchase_order_items::ActiveModel = item.into();
        active.quantity_received = Set(receipt.quantity_received);
        active.updated_at = Set(Utc::now().into());
        let item = active.update(&txn).await?;

        let all_received = purchase_order_items::Entity::find()
            .filter(purchase_order_items::Column::PurchaseOrderId.eq(order_id))
            .all(&txn)
            .await?
            .iter()
            .all(|row| row.quantity_received >= row.quantity_ordered);

        let action = LifecycleService::receive(status, all_received, Utc::now().date_naive())?;

        let mut active: purchase_orders::ActiveModel = order.into();
        active.status = Set(action.new_status().into());
        if let LifecycleAction::Receive {
            actual_delivery_date: Some(date),
            ..
        } = &action
        {
            active.actual_delivery_date = Set(Some(*date));
        }
        active.updated_at = Set(Utc::now().into());
        let order = active.update(&txn).await?;

        txn.commit().await?;

        Ok(ReceiveOutcome {
            order,
            item,
            receipt,
            action,
        })
    }

    /// Soft deletes a draft order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is missing, out of scope, or not
    /// a draft.
    pub async fn delete(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<purchase_orders::Model, PurchaseOrderError> {
        let txn = self.db.begin().await?;

        let order = fetch_locked(&txn, order_id).await?;
        authorize_row(actor, &order)?;
        LifecycleService::ensure_deletable(order.status.clone().into())?;

        let mut active: purchase_orders::ActiveModel = order.into();
        active.deleted_at = Set(Some(Utc::now().into()));
        active.updated_at = Set(Utc::now().into());
        let order = active.update(&txn).await?;

        txn.commit().await?;
        Ok(order)
    }

    /// Restores a soft-deleted order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is missing, out of scope, or not
    /// soft-deleted.
    pub async fn restore(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<purchase_orders::Model, PurchaseOrderError> {
        let txn = self.db.begin().await?;

        let order = fetch_locked_any(&txn, order_id).await?;
        authorize_row(actor, &order)?;
        if order.deleted_at.is_none() {
            return Err(LifecycleError::NotDeleted.into());
        }

        let mut active: purchase_orders::ActiveModel = order.into();
        active.deleted_at = Set(None);
        active.updated_at = Set(Utc::now().into());
        let order = active.update(&txn).await?;

        txn.commit().await?;
        Ok(order)
    }

    /// Permanently removes an order and its items.
    ///
    /// Works on live and soft-deleted orders alike, with the same
    /// draft-only guard as soft deletion.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is missing, out of scope, or not
    /// a draft.
    pub async fn force_delete(
        &self,
        actor: &Actor,
        order_id: Uuid,
    ) -> Result<purchase_orders::Model, PurchaseOrderError> {
        let txn = self.db.begin().await?;

        let order = fetch_locked_any(&txn, order_id).await?;
        authorize_row(actor, &order)?;
        LifecycleService::ensure_deletable(order.status.clone().into())?;

        // Items cascade at the database level.
        purchase_orders::Entity::delete_by_id(order_id)
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(order)
    }

    /// Runs one locked status transition.
    async fn transition<F>(
        &self,
        actor: &Actor,
        order_id: Uuid,
        decide: F,
    ) -> Result<(purchase_orders::Model, LifecycleAction), PurchaseOrderError>
    where
        F: FnOnce(PurchaseOrderStatus) -> Result<LifecycleAction, LifecycleError>,
    {
        let txn = self.db.begin().await?;

        let order = fetch_locked(&txn, order_id).await?;
        authorize_row(actor, &order)?;

        let action = decide(order.status.clone().into())?;

        let mut active: purchase_orders::ActiveModel = order.into();
        active.status = Set(action.new_status().into());
        if let LifecycleAction::Approve {
            approved_by,
            approved_at,
            ..
        } = &action
        {
            active.approved_by = Set(Some(*approved_by));
            active.approved_at = Set(Some((*approved_at).into()));
        }
        active.updated_at = Set(Utc::now().into());
        let order = active.update(&txn).await?;

        txn.commit().await?;
        Ok((order, action))
    }
}

/// Translates a tenant scope into a SQL predicate.
///
/// `Denied` becomes the always-false predicate so listings come back
/// empty instead of leaking rows.
fn scope_condition(scope: &TenantScope) -> Condition {
    match scope {
        TenantScope::Unrestricted => Condition::all(),
        TenantScope::Organization(organization_id) => {
            Condition::all().add(purchase_orders::Column::OrganizationId.eq(*organization_id))
        }
        TenantScope::Branch(branch_id) => {
            Condition::all().add(purchase_orders::Column::BranchId.eq(*branch_id))
        }
        TenantScope::Denied => Condition::all().add(Expr::value(false)),
    }
}

fn authorize_row(
    actor: &Actor,
    order: &purchase_orders::Model,
) -> Result<(), PurchaseOrderError> {
    ScopeResolver::authorize(
        actor,
        TenantRef {
            organization_id: order.organization_id,
            branch_id: order.branch_id,
        },
    )?;
    Ok(())
}

/// Fetches a live (not soft-deleted) order under `FOR UPDATE`.
async fn fetch_locked(
    txn: &DatabaseTransaction,
    order_id: Uuid,
) -> Result<purchase_orders::Model, PurchaseOrderError> {
    purchase_orders::Entity::find_by_id(order_id)
        .filter(purchase_orders::Column::DeletedAt.is_null())
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(PurchaseOrderError::NotFound(order_id))
}

/// Fetches an order under `FOR UPDATE`, soft-deleted or not.
async fn fetch_locked_any(
    txn: &DatabaseTransaction,
    order_id: Uuid,
) -> Result<purchase_orders::Model, PurchaseOrderError> {
    purchase_orders::Entity::find_by_id(order_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(PurchaseOrderError::NotFound(order_id))
}

/// Reserves the next PO sequence value for the given day.
///
/// The existing row is locked with `FOR UPDATE`; the first order of a
/// day inserts the row instead. A concurrent first insert loses on the
/// primary key and surfaces as a database error, which the unique
/// index on `po_number` also backstops.
async fn next_po_sequence(
    txn: &DatabaseTransaction,
    date: NaiveDate,
) -> Result<i64, PurchaseOrderError> {
    let existing = po_number_sequences::Entity::find_by_id(date)
        .lock_exclusive()
        .one(txn)
        .await?;

    match existing {
        Some(row) => {
            let sequence = row.next_value;
            let mut active: po_number_sequences::ActiveModel = row.into();
            active.next_value = Set(sequence + 1);
            active.update(txn).await?;
            Ok(sequence)
        }
        None => {
            po_number_sequences::ActiveModel {
                sequence_date: Set(date),
                next_value: Set(2),
            }
            .insert(txn)
            .await?;
            Ok(1)
        }
    }
}

async fn insert_items(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    priced: &[kasira_core::procurement::PricedLineItem],
) -> Result<Vec<purchase_order_items::Model>, PurchaseOrderError> {
    let now = Utc::now().into();
    let mut items = Vec::with_capacity(priced.len());
    for line in priced {
        let item = purchase_order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_order_id: Set(order_id),
            product_variant_id: Set(line.input.product_variant_id),
            quantity_ordered: Set(line.input.quantity_ordered),
            quantity_received: Set(0),
            unit_cost: Set(line.input.unit_cost),
            tax_rate: Set(line.input.tax_rate),
            discount_percentage: Set(line.input.discount_percentage),
            total_cost: Set(line.line_total),
            notes: Set(line.input.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;
        items.push(item);
    }
    Ok(items)
}

/// Merges requested charge overrides with the stored figures, field
/// by field. A field absent from the request keeps its stored value.
fn merge_charges(
    order: &purchase_orders::Model,
    input: &UpdatePurchaseOrderInput,
) -> OrderCharges {
    OrderCharges {
        tax_amount: input.tax_amount.unwrap_or(order.tax_amount),
        discount_amount: input.discount_amount.unwrap_or(order.discount_amount),
        shipping_cost: input.shipping_cost.unwrap_or(order.shipping_cost),
        amount_paid: input.amount_paid.unwrap_or(order.amount_paid),
    }
}

/// Rebuilds a pricing input from a stored item row.
fn line_input(item: &purchase_order_items::Model) -> LineItemInput {
    LineItemInput {
        product_variant_id: item.product_variant_id,
        quantity_ordered: item.quantity_ordered,
        unit_cost: item.unit_cost,
        tax_rate: item.tax_rate,
        discount_percentage: item.discount_percentage,
        notes: item.notes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait};

    fn order_model(org: Uuid, branch: Uuid) -> purchase_orders::Model {
        let now = Utc::now().into();
        purchase_orders::Model {
            id: Uuid::new_v4(),
            organization_id: org,
            branch_id: branch,
            supplier_id: Uuid::new_v4(),
            po_number: "PO-20260823-0001".to_string(),
            status: PurchaseOrderStatus::Draft.into(),
            order_date: Utc::now().date_naive(),
            expected_delivery_date: None,
            actual_delivery_date: None,
            subtotal: dec!(100.00),
            tax_amount: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            total_amount: dec!(100.00),
            amount_paid: Decimal::ZERO,
            amount_due: dec!(100.00),
            payment_terms: None,
            delivery_address: None,
            notes: None,
            created_by: Uuid::new_v4(),
            approved_by: None,
            approved_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_authorize_row_denies_foreign_branch() {
        let org = Uuid::new_v4();
        let actor = Actor::branch_scoped(Uuid::new_v4(), org, Uuid::new_v4());
        let order = order_model(org, Uuid::new_v4());
        let err = authorize_row(&actor, &order).unwrap_err();
        assert!(matches!(err, PurchaseOrderError::Scope(_)));

        let app: AppError = err.into();
        assert_eq!(app.status_code(), 403);
    }

    #[test]
    fn test_authorize_row_allows_own_branch() {
        let org = Uuid::new_v4();
        let branch = Uuid::new_v4();
        let actor = Actor::branch_scoped(Uuid::new_v4(), org, branch);
        let order = order_model(org, branch);
        assert!(authorize_row(&actor, &order).is_ok());
    }

    #[test]
    fn test_scope_condition_shapes() {
        // Unrestricted adds no predicate; the others add exactly one.
        assert!(scope_condition(&TenantScope::Unrestricted).is_empty());
        assert!(!scope_condition(&TenantScope::Organization(Uuid::new_v4())).is_empty());
        assert!(!scope_condition(&TenantScope::Branch(Uuid::new_v4())).is_empty());
        assert!(!scope_condition(&TenantScope::Denied).is_empty());
    }

    #[test]
    fn test_line_input_roundtrip_from_model() {
        let now = Utc::now().into();
        let item = purchase_order_items::Model {
            id: Uuid::new_v4(),
            purchase_order_id: Uuid::new_v4(),
            product_variant_id: Uuid::new_v4(),
            quantity_ordered: 5,
            quantity_received: 2,
            unit_cost: dec!(12.50),
            tax_rate: dec!(10),
            discount_percentage: dec!(5),
            total_cost: dec!(65.31),
            notes: Some("rush".to_string()),
            created_at: now,
            updated_at: now,
        };
        let input = line_input(&item);
        assert_eq!(input.quantity_ordered, 5);
        assert_eq!(input.unit_cost, dec!(12.50));
        assert_eq!(input.notes.as_deref(), Some("rush"));
    }

    #[test]
    fn test_database_error_maps_to_opaque_500() {
        let err = PurchaseOrderError::Database(DbErr::Custom("connection reset".to_string()));
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 500);
        assert!(!app.to_string().contains("connection reset"));
    }

    #[test]
    fn test_merge_charges_keeps_untouched_fields() {
        let mut order = order_model(Uuid::new_v4(), Uuid::new_v4());
        order.tax_amount = dec!(25.00);
        order.shipping_cost = dec!(5.00);

        let input = UpdatePurchaseOrderInput {
            shipping_cost: Some(dec!(9.99)),
            ..UpdatePurchaseOrderInput::default()
        };
        let charges = merge_charges(&order, &input);
        assert_eq!(charges.shipping_cost, dec!(9.99));
        assert_eq!(charges.tax_amount, dec!(25.00));
        assert_eq!(charges.amount_paid, Decimal::ZERO);
    }

    #[test]
    fn test_list_query_embeds_scope_predicate() {
        let org = Uuid::new_v4();
        let sql = purchase_orders::Entity::find()
            .filter(scope_condition(&TenantScope::Organization(org)))
            .build(DatabaseBackend::Postgres)
            .to_string();
        assert!(sql.contains("organization_id"));

        let denied = purchase_orders::Entity::find()
            .filter(scope_condition(&TenantScope::Denied))
            .build(DatabaseBackend::Postgres)
            .to_string();
        assert!(denied.contains("FALSE"));
    }

    // Simulates the loser of two racing approvals: the row re-read
    // under the lock already carries the winner's status.
    #[tokio::test]
    async fn test_approve_loser_sees_applied_status() {
        let mut order = order_model(Uuid::new_v4(), Uuid::new_v4());
        order.status = PurchaseOrderStatus::Approved.into();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![order]])
            .into_connection();

        let repo = PurchaseOrderRepository::new(Arc::new(db));
        let actor = Actor::super_admin(Uuid::new_v4());
        let err = repo.approve(&actor, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(
            err,
            PurchaseOrderError::Lifecycle(LifecycleError::InvalidTransition {
                from: PurchaseOrderStatus::Approved,
                ..
            })
        ));

        let app: AppError = err.into();
        assert_eq!(app.status_code(), 422);
    }

    #[tokio::test]
    async fn test_next_po_sequence_increments_existing_row() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![po_number_sequences::Model {
                    sequence_date: date,
                    next_value: 5,
                }],
                vec![po_number_sequences::Model {
                    sequence_date: date,
                    next_value: 6,
                }],
            ])
            .into_connection();

        let txn = db.begin().await.unwrap();
        let sequence = next_po_sequence(&txn, date).await.unwrap();
        assert_eq!(sequence, 5);
        assert_eq!(format_po_number(date, sequence), "PO-20260823-0005");
    }

    #[tokio::test]
    async fn test_next_po_sequence_starts_day_at_one() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                Vec::<po_number_sequences::Model>::new(),
                vec![po_number_sequences::Model {
                    sequence_date: date,
                    next_value: 2,
                }],
            ])
            .into_connection();

        let txn = db.begin().await.unwrap();
        let sequence = next_po_sequence(&txn, date).await.unwrap();
        assert_eq!(sequence, 1);
    }
}
