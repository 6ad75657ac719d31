//! Order repository.
//!
//! Orders are written once at checkout and merge-updated by the webhook
//! receiver. Lookups return `Ok(None)` for unknown references so callers
//! decide between propagation (server webhook, 404) and silent tolerance
//! (client redirect path).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use elida_core::{Email, OrderReference, OrderStatus};

use super::RepositoryError;
use crate::models::order::{NewOrder, Order, OrderPayment};

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new order with status `created`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the reference already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let items = serde_json::to_value(&order.items)
            .map_err(|e| RepositoryError::DataCorruption(format!("items encode: {e}")))?;
        let shipping = serde_json::to_value(&order.shipping)
            .map_err(|e| RepositoryError::DataCorruption(format!("shipping encode: {e}")))?;

        let row = sqlx::query(
            r"
            INSERT INTO orders (reference, user_id, email, items, total, shipping, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'created')
            RETURNING id, reference, user_id, email, items, total, shipping,
                      status, payment, created_at, updated_at
            ",
        )
        .bind(order.reference.as_str())
        .bind(&order.user_id)
        .bind(order.email.as_str())
        .bind(items)
        .bind(order.total)
        .bind(shipping)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!(
                    "order reference already exists: {}",
                    order.reference
                ));
            }
            RepositoryError::Database(e)
        })?;

        decode_order(&row)
    }

    /// Look up an order by its reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored value cannot be decoded.
    pub async fn get_by_reference(
        &self,
        reference: &OrderReference,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT id, reference, user_id, email, items, total, shipping,
                   status, payment, created_at, updated_at
            FROM orders
            WHERE reference = $1
            ",
        )
        .bind(reference.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.as_ref().map(decode_order).transpose()
    }

    /// Move a freshly created order to `pending` once its payment
    /// transaction exists. A no-op for orders past `created`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_pending(&self, reference: &OrderReference) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE orders
            SET status = 'pending', updated_at = now()
            WHERE reference = $1 AND status = 'created'
            ",
        )
        .bind(reference.as_str())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Merge a payment outcome onto the stored order.
    ///
    /// The row is locked (`SELECT ... FOR UPDATE`) for the duration of the
    /// merge so concurrent deliveries for the same reference serialize
    /// instead of racing. Applying the same payment twice yields the same
    /// final state. Deliveries can also arrive out of order: a stale
    /// `PENDING` after a terminal status leaves the stored order untouched.
    ///
    /// Returns the updated order, or `Ok(None)` when no order matches the
    /// reference (the receiver never creates orders from webhook data).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails, or
    /// `RepositoryError::DataCorruption` if a stored value cannot be decoded.
    pub async fn apply_payment(
        &self,
        reference: &OrderReference,
        payment: &OrderPayment,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query("SELECT status FROM orders WHERE reference = $1 FOR UPDATE")
            .bind(reference.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(locked) = locked else {
            tx.rollback().await?;
            return Ok(None);
        };

        let current: String = locked.try_get("status")?;
        let current = current
            .parse::<OrderStatus>()
            .map_err(RepositoryError::DataCorruption)?;
        let status = payment.status.order_status();

        if regresses(current, status) {
            let row = sqlx::query(
                r"
                SELECT id, reference, user_id, email, items, total, shipping,
                       status, payment, created_at, updated_at
                FROM orders
                WHERE reference = $1
                ",
            )
            .bind(reference.as_str())
            .fetch_one(&mut *tx)
            .await?;

            let order = decode_order(&row)?;
            tx.commit().await?;
            return Ok(Some(order));
        }

        let payment_json = serde_json::to_value(payment)
            .map_err(|e| RepositoryError::DataCorruption(format!("payment encode: {e}")))?;

        let row = sqlx::query(
            r"
            UPDATE orders
            SET status = $2, payment = $3, updated_at = now()
            WHERE reference = $1
            RETURNING id, reference, user_id, email, items, total, shipping,
                      status, payment, created_at, updated_at
            ",
        )
        .bind(reference.as_str())
        .bind(status.to_string())
        .bind(payment_json)
        .fetch_one(&mut *tx)
        .await?;

        let order = decode_order(&row)?;
        tx.commit().await?;

        Ok(Some(order))
    }
}

/// True when applying `incoming` would move a settled order backwards.
/// `completed` and `cancelled` are terminal; only a fresher terminal status
/// may overwrite them.
const fn regresses(current: OrderStatus, incoming: OrderStatus) -> bool {
    matches!(current, OrderStatus::Completed | OrderStatus::Cancelled)
        && matches!(incoming, OrderStatus::Created | OrderStatus::Pending)
}

/// Decode a database row into an [`Order`].
fn decode_order(row: &PgRow) -> Result<Order, RepositoryError> {
    let id: Uuid = row.try_get("id")?;
    let reference: String = row.try_get("reference")?;
    let user_id: Option<String> = row.try_get("user_id")?;
    let email: String = row.try_get("email")?;
    let items: serde_json::Value = row.try_get("items")?;
    let total: Decimal = row.try_get("total")?;
    let shipping: serde_json::Value = row.try_get("shipping")?;
    let status: String = row.try_get("status")?;
    let payment: Option<serde_json::Value> = row.try_get("payment")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    let email = Email::parse(&email)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(RepositoryError::DataCorruption)?;
    let items = serde_json::from_value(items)
        .map_err(|e| RepositoryError::DataCorruption(format!("items decode: {e}")))?;
    let shipping = serde_json::from_value(shipping)
        .map_err(|e| RepositoryError::DataCorruption(format!("shipping decode: {e}")))?;
    let payment = payment
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| RepositoryError::DataCorruption(format!("payment decode: {e}")))?;

    Ok(Order {
        id,
        reference: OrderReference::from_string(reference),
        user_id,
        email,
        items,
        total,
        shipping,
        status,
        payment,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_status_never_downgrades() {
        assert!(regresses(OrderStatus::Completed, OrderStatus::Pending));
        assert!(regresses(OrderStatus::Cancelled, OrderStatus::Pending));
    }

    #[test]
    fn test_terminal_status_may_be_overwritten_by_terminal() {
        // A late COMPLETED after CANCELLED wins: the money moved.
        assert!(!regresses(OrderStatus::Cancelled, OrderStatus::Completed));
        assert!(!regresses(OrderStatus::Completed, OrderStatus::Completed));
        assert!(!regresses(OrderStatus::Completed, OrderStatus::Cancelled));
    }

    #[test]
    fn test_open_orders_accept_any_outcome() {
        assert!(!regresses(OrderStatus::Created, OrderStatus::Pending));
        assert!(!regresses(OrderStatus::Pending, OrderStatus::Completed));
        assert!(!regresses(OrderStatus::Pending, OrderStatus::Cancelled));
    }
}
