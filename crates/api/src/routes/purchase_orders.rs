//! Purchase order routes.
//!
//! Listings apply the caller's tenant scope at the query level; a
//! caller outside every scope sees empty pages, never other tenants'
//! rows. Lookups of a concrete order that exists but belongs to a
//! foreign tenant answer 403.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{delete, get, patch, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, response};
use kasira_core::audit::AuditRecord;
use kasira_core::procurement::{LineItemInput, OrderCharges, PurchaseOrderStatus};
use kasira_shared::{AppError, PageRequest};
use kasira_db::{
    entities::{purchase_order_items, purchase_orders},
    repositories::purchase_order::{
        CreatePurchaseOrderInput, PurchaseOrderFilter, PurchaseOrderRepository,
        PurchaseOrderWithItems, UpdatePurchaseOrderInput,
    },
};

/// Creates the purchase order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/purchase-orders", get(list_purchase_orders))
        .route("/purchase-orders", post(create_purchase_order))
        .route("/purchase-orders/{id}", get(get_purchase_order))
        .route("/purchase-orders/{id}", put(update_purchase_order))
        .route("/purchase-orders/{id}", delete(delete_purchase_order))
        .route("/purchase-orders/{id}/submit", patch(submit_purchase_order))
        .route("/purchase-orders/{id}/approve", patch(approve_purchase_order))
        .route("/purchase-orders/{id}/cancel", patch(cancel_purchase_order))
        .route("/purchase-orders/{id}/restore", patch(restore_purchase_order))
        .route("/purchase-orders/{id}/receive", post(receive_purchase_order))
        .route("/purchase-orders/{id}/force", delete(force_delete_purchase_order))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing purchase orders.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Filter by status.
    pub status: Option<String>,
    /// Filter by supplier.
    pub supplier_id: Option<Uuid>,
    /// Narrow to one branch.
    pub branch_id: Option<Uuid>,
    /// Substring match on the PO number.
    pub search: Option<String>,
    /// Filter by order date range start (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Filter by order date range end (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
    /// Include soft-deleted orders.
    #[serde(default)]
    pub include_deleted: bool,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Request body for one line item.
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    /// Product variant being ordered.
    pub product_variant_id: Uuid,
    /// Units ordered.
    pub quantity_ordered: i32,
    /// Cost per unit.
    pub unit_cost: Decimal,
    /// Per-line tax rate in percent.
    #[serde(default)]
    pub tax_rate: Decimal,
    /// Per-line discount in percent.
    #[serde(default)]
    pub discount_percentage: Decimal,
    /// Free-form note.
    pub notes: Option<String>,
}

impl From<ItemRequest> for LineItemInput {
    fn from(req: ItemRequest) -> Self {
        Self {
            product_variant_id: req.product_variant_id,
            quantity_ordered: req.quantity_ordered,
            unit_cost: req.unit_cost,
            tax_rate: req.tax_rate,
            discount_percentage: req.discount_percentage,
            notes: req.notes,
        }
    }
}

/// Request body for creating a purchase order.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    /// Branch the order belongs to.
    pub branch_id: Uuid,
    /// Supplier the order is placed with.
    pub supplier_id: Uuid,
    /// Order date (YYYY-MM-DD).
    pub order_date: NaiveDate,
    /// Expected delivery date.
    pub expected_delivery_date: Option<NaiveDate>,
    /// Payment terms.
    pub payment_terms: Option<String>,
    /// Delivery address.
    pub delivery_address: Option<String>,
    /// Order notes.
    pub notes: Option<String>,
    /// Line items.
    pub items: Vec<ItemRequest>,
    /// Flat tax amount on top of the subtotal.
    #[serde(default)]
    pub tax_amount: Decimal,
    /// Flat discount amount off the subtotal.
    #[serde(default)]
    pub discount_amount: Decimal,
    /// Shipping cost.
    #[serde(default)]
    pub shipping_cost: Decimal,
    /// Amount already paid.
    #[serde(default)]
    pub amount_paid: Decimal,
}

/// Request body for updating a draft purchase order.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateRequest {
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
    pub items: Option<Vec<ItemRequest>>,
    /// Replacement flat tax amount.
    pub tax_amount: Option<Decimal>,
    /// Replacement flat discount amount.
    pub discount_amount: Option<Decimal>,
    /// Replacement shipping cost.
    pub shipping_cost: Option<Decimal>,
    /// Replacement amount paid.
    pub amount_paid: Option<Decimal>,
}

/// Request body for receiving stock against one item.
#[derive(Debug, Deserialize)]
pub struct ReceiveRequest {
    /// The item absorbing the receipt.
    pub item_id: Uuid,
    /// Quantity received now.
    pub quantity: i32,
}

/// Response for a line item.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    /// Item ID.
    pub id: Uuid,
    /// Product variant.
    pub product_variant_id: Uuid,
    /// Units ordered.
    pub quantity_ordered: i32,
    /// Units received so far.
    pub quantity_received: i32,
    /// Units still outstanding.
    pub quantity_pending: i32,
    /// Cost per unit.
    pub unit_cost: Decimal,
    /// Per-line tax rate in percent.
    pub tax_rate: Decimal,
    /// Per-line discount in percent.
    pub discount_percentage: Decimal,
    /// Line total.
    pub total_cost: Decimal,
    /// Note.
    pub notes: Option<String>,
}

impl From<purchase_order_items::Model> for ItemResponse {
    fn from(item: purchase_order_items::Model) -> Self {
        Self {
            id: item.id,
            product_variant_id: item.product_variant_id,
            quantity_ordered: item.quantity_ordered,
            quantity_received: item.quantity_received,
            quantity_pending: item.quantity_ordered - item.quantity_received,
            unit_cost: item.unit_cost,
            tax_rate: item.tax_rate,
            discount_percentage: item.discount_percentage,
            total_cost: item.total_cost,
            notes: item.notes,
        }
    }
}

/// Response for a purchase order.
#[derive(Debug, Serialize)]
pub struct PurchaseOrderResponse {
    /// Order ID.
    pub id: Uuid,
    /// Human-readable PO number.
    pub po_number: String,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Owning branch.
    pub branch_id: Uuid,
    /// Supplier.
    pub supplier_id: Uuid,
    /// Lifecycle status.
    pub status: String,
    /// Order date.
    pub order_date: NaiveDate,
    /// Expected delivery date.
    pub expected_delivery_date: Option<NaiveDate>,
    /// Actual delivery date, set on full receipt.
    pub actual_delivery_date: Option<NaiveDate>,
    /// Sum of line totals.
    pub subtotal: Decimal,
    /// Flat tax amount.
    pub tax_amount: Decimal,
    /// Flat discount amount.
    pub discount_amount: Decimal,
    /// Shipping cost.
    pub shipping_cost: Decimal,
    /// Grand total.
    pub total_amount: Decimal,
    /// Amount already paid.
    pub amount_paid: Decimal,
    /// Amount outstanding.
    pub amount_due: Decimal,
    /// Payment terms.
    pub payment_terms: Option<String>,
    /// Delivery address.
    pub delivery_address: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Creating user.
    pub created_by: Uuid,
    /// Approving user, once approved.
    pub approved_by: Option<Uuid>,
    /// Approval timestamp.
    pub approved_at: Option<String>,
    /// Soft deletion timestamp.
    pub deleted_at: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
    /// Line items, present on detail responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemResponse>>,
}

impl PurchaseOrderResponse {
    fn from_order(order: purchase_orders::Model) -> Self {
        let status: PurchaseOrderStatus = order.status.into();
        Self {
            id: order.id,
            po_number: order.po_number,
            organization_id: order.organization_id,
            branch_id: order.branch_id,
            supplier_id: order.supplier_id,
            status: status.as_str().to_string(),
            order_date: order.order_date,
            expected_delivery_date: order.expected_delivery_date,
            actual_delivery_date: order.actual_delivery_date,
            subtotal: order.subtotal,
            tax_amount: order.tax_amount,
            discount_amount: order.discount_amount,
            shipping_cost: order.shipping_cost,
            total_amount: order.total_amount,
            amount_paid: order.amount_paid,
            amount_due: order.amount_due,
            payment_terms: order.payment_terms,
            delivery_address: order.delivery_address,
            notes: order.notes,
            created_by: order.created_by,
            approved_by: order.approved_by,
            approved_at: order.approved_at.map(|t| t.to_rfc3339()),
            deleted_at: order.deleted_at.map(|t| t.to_rfc3339()),
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
            items: None,
        }
    }

    fn from_order_with_items(result: PurchaseOrderWithItems) -> Self {
        let mut response = Self::from_order(result.order);
        response.items = Some(result.items.into_iter().map(ItemResponse::from).collect());
        response
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/purchase-orders` - Create a purchase order.
async fn create_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateRequest>,
) -> Response {
    let repo = PurchaseOrderRepository::new(state.db.clone());
    let actor = auth.actor();

    let input = CreatePurchaseOrderInput {
        branch_id: body.branch_id,
        supplier_id: body.supplier_id,
        order_date: body.order_date,
        expected_delivery_date: body.expected_delivery_date,
        payment_terms: body.payment_terms,
        delivery_address: body.delivery_address,
        notes: body.notes,
        items: body.items.into_iter().map(Into::into).collect(),
        charges: OrderCharges {
            tax_amount: body.tax_amount,
            discount_amount: body.discount_amount,
            shipping_cost: body.shipping_cost,
            amount_paid: body.amount_paid,
        },
    };

    match repo.create(&actor, input).await {
        Ok(result) => {
            state.audit.record(&AuditRecord::new(
                "purchase_order.created",
                result.order.id,
                actor.user_id,
                result.order.organization_id,
                result.order.branch_id,
                json!({ "po_number": result.order.po_number }),
            ));
            response::success(
                StatusCode::CREATED,
                "Purchase order created",
                PurchaseOrderResponse::from_order_with_items(result),
            )
        }
        Err(e) => response::failure(&e.into()),
    }
}

/// GET `/purchase-orders` - List purchase orders visible to the caller.
async fn list_purchase_orders(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Response {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => match PurchaseOrderStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                return response::failure(&AppError::InvalidInput(format!(
                    "unknown status: {raw}"
                )));
            }
        },
    };

    let filter = PurchaseOrderFilter {
        status,
        supplier_id: query.supplier_id,
        branch_id: query.branch_id,
        search: query.search,
        date_from: query.from,
        date_to: query.to,
        include_deleted: query.include_deleted,
    };
    let page = PageRequest {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(15),
    };

    let repo = PurchaseOrderRepository::new(state.db.clone());
    match repo.list(&auth.actor(), filter, page).await {
        Ok(page) => {
            let page = page.map(PurchaseOrderResponse::from_order);
            response::success(
                StatusCode::OK,
                "Purchase orders retrieved",
                json!({ "purchase_orders": page.data, "meta": page.meta }),
            )
        }
        Err(e) => response::failure(&e.into()),
    }
}

/// GET `/purchase-orders/{id}` - Get a purchase order with items.
async fn get_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = PurchaseOrderRepository::new(state.db.clone());
    match repo.find_with_items(&auth.actor(), id, false).await {
        Ok(result) => response::success(
            StatusCode::OK,
            "Purchase order retrieved",
            PurchaseOrderResponse::from_order_with_items(result),
        ),
        Err(e) => response::failure(&e.into()),
    }
}

/// PUT `/purchase-orders/{id}` - Update a draft purchase order.
async fn update_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRequest>,
) -> Response {
    let repo = PurchaseOrderRepository::new(state.db.clone());
    let actor = auth.actor();

    let input = UpdatePurchaseOrderInput {
        supplier_id: body.supplier_id,
        order_date: body.order_date,
        expected_delivery_date: body.expected_delivery_date,
        payment_terms: body.payment_terms,
        delivery_address: body.delivery_address,
        notes: body.notes,
        items: body
            .items
            .map(|items| items.into_iter().map(Into::into).collect()),
        tax_amount: body.tax_amount,
        discount_amount: body.discount_amount,
        shipping_cost: body.shipping_cost,
        amount_paid: body.amount_paid,
    };

    match repo.update(&actor, id, input).await {
        Ok(result) => {
            state.audit.record(&AuditRecord::new(
                "purchase_order.updated",
                result.order.id,
                actor.user_id,
                result.order.organization_id,
                result.order.branch_id,
                json!({ "total_amount": result.order.total_amount }),
            ));
            response::success(
                StatusCode::OK,
                "Purchase order updated",
                PurchaseOrderResponse::from_order_with_items(result),
            )
        }
        Err(e) => response::failure(&e.into()),
    }
}

/// PATCH `/purchase-orders/{id}/submit` - Submit a draft for approval.
async fn submit_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = PurchaseOrderRepository::new(state.db.clone());
    let actor = auth.actor();
    match repo.submit(&actor, id).await {
        Ok((order, action)) => transition_response(&state, &actor, order, action.action_name()),
        Err(e) => response::failure(&e.into()),
    }
}

/// PATCH `/purchase-orders/{id}/approve` - Approve a pending order.
async fn approve_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = PurchaseOrderRepository::new(state.db.clone());
    let actor = auth.actor();
    match repo.approve(&actor, id).await {
        Ok((order, action)) => transition_response(&state, &actor, order, action.action_name()),
        Err(e) => response::failure(&e.into()),
    }
}

/// PATCH `/purchase-orders/{id}/cancel` - Cancel a non-terminal order.
async fn cancel_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = PurchaseOrderRepository::new(state.db.clone());
    let actor = auth.actor();
    match repo.cancel(&actor, id).await {
        Ok((order, action)) => transition_response(&state, &actor, order, action.action_name()),
        Err(e) => response::failure(&e.into()),
    }
}

/// POST `/purchase-orders/{id}/receive` - Receive stock against one item.
async fn receive_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ReceiveRequest>,
) -> Response {
    let repo = PurchaseOrderRepository::new(state.db.clone());
    let actor = auth.actor();

    match repo.receive(&actor, id, body.item_id, body.quantity).await {
        Ok(outcome) => {
            state.audit.record(&AuditRecord::new(
                outcome.action.action_name(),
                outcome.order.id,
                actor.user_id,
                outcome.order.organization_id,
                outcome.order.branch_id,
                json!({
                    "item_id": outcome.item.id,
                    "quantity_received": outcome.receipt.quantity_received,
                    "quantity_pending": outcome.receipt.quantity_pending,
                }),
            ));
            let mut data = PurchaseOrderResponse::from_order(outcome.order);
            data.items = Some(vec![ItemResponse::from(outcome.item)]);
            response::success(StatusCode::OK, "Receipt recorded", data)
        }
        Err(e) => response::failure(&e.into()),
    }
}

/// DELETE `/purchase-orders/{id}` - Soft delete a draft order.
async fn delete_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = PurchaseOrderRepository::new(state.db.clone());
    let actor = auth.actor();
    match repo.delete(&actor, id).await {
        Ok(order) => {
            state.audit.record(&AuditRecord::new(
                "purchase_order.deleted",
                order.id,
                actor.user_id,
                order.organization_id,
                order.branch_id,
                json!({ "po_number": order.po_number }),
            ));
            response::success(StatusCode::OK, "Purchase order deleted", json!(null))
        }
        Err(e) => response::failure(&e.into()),
    }
}

/// PATCH `/purchase-orders/{id}/restore` - Restore a soft-deleted order.
async fn restore_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = PurchaseOrderRepository::new(state.db.clone());
    let actor = auth.actor();
    match repo.restore(&actor, id).await {
        Ok(order) => {
            state.audit.record(&AuditRecord::new(
                "purchase_order.restored",
                order.id,
                actor.user_id,
                order.organization_id,
                order.branch_id,
                json!({ "po_number": order.po_number }),
            ));
            response::success(
                StatusCode::OK,
                "Purchase order restored",
                PurchaseOrderResponse::from_order(order),
            )
        }
        Err(e) => response::failure(&e.into()),
    }
}

/// DELETE `/purchase-orders/{id}/force` - Permanently remove a draft
/// order, trashed or not.
async fn force_delete_purchase_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = PurchaseOrderRepository::new(state.db.clone());
    let actor = auth.actor();
    match repo.force_delete(&actor, id).await {
        Ok(order) => {
            state.audit.record(&AuditRecord::new(
                "purchase_order.force_deleted",
                order.id,
                actor.user_id,
                order.organization_id,
                order.branch_id,
                json!({ "po_number": order.po_number }),
            ));
            response::success(
                StatusCode::OK,
                "Purchase order permanently deleted",
                json!(null),
            )
        }
        Err(e) => response::failure(&e.into()),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Records the transition audit event and builds the success response.
fn transition_response(
    state: &AppState,
    actor: &kasira_core::scope::Actor,
    order: purchase_orders::Model,
    action_name: &str,
) -> Response {
    state.audit.record(&AuditRecord::new(
        action_name,
        order.id,
        actor.user_id,
        order.organization_id,
        order.branch_id,
        json!({ "status": PurchaseOrderStatus::from(order.status.clone()).as_str() }),
    ));
    response::success(
        StatusCode::OK,
        "Purchase order updated",
        PurchaseOrderResponse::from_order(order),
    )
}
