//! # Order Repository
//!
//! Orders with their line items, plus the one write the sync owns: applying
//! state machine transitions driven by remote warehouse statuses.
//!
//! ## Transition Write
//! ```text
//! apply_transitions(order_id, [(Transaction, Cancel), (Delivery, Cancel)])
//!   1. read current (order_state, delivery_state, transaction_state)
//!   2. apply every step in memory      ← any illegal? DbError::Domain, no write
//!   3. UPDATE orders SET all three states
//!   4. return the new status triple
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use infoplus_core::{Machine, Order, OrderLineItem, StatusTriple, TransactionState, Transition};

const SELECT_COLUMNS: &str = r#"
    SELECT o.id, o.order_number, o.customer_id, c.customer_number, o.order_date,
           o.order_state, o.delivery_state, o.transaction_state,
           o.shipping_first_name, o.shipping_last_name, o.shipping_company,
           o.email, o.phone, o.street, o.additional_address, o.city, o.zip_code,
           o.country_iso, o.state_code, o.updated_at
    FROM orders o
    JOIN customers c ON c.id = o.customer_id
"#;

/// Repository for orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Paid orders with line items: the order sync's source set.
    pub async fn list_paid(&self) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "{SELECT_COLUMNS} WHERE o.transaction_state = ?1 ORDER BY o.order_date, o.order_number"
        ))
        .bind(TransactionState::Paid)
        .fetch_all(&self.pool)
        .await?;

        self.with_line_items(orders).await
    }

    /// One order with line items.
    pub async fn get(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!("{SELECT_COLUMNS} WHERE o.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match order {
            Some(order) => Ok(self.with_line_items(vec![order]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn with_line_items(&self, mut orders: Vec<Order>) -> DbResult<Vec<Order>> {
        for order in &mut orders {
            order.line_items = sqlx::query_as::<_, OrderLineItem>(
                r#"
                SELECT product_id, sku, quantity, unit_price_cents
                FROM order_line_items
                WHERE order_id = ?1
                ORDER BY id
                "#,
            )
            .bind(&order.id)
            .fetch_all(&self.pool)
            .await?;
        }
        Ok(orders)
    }

    /// Inserts an order and its line items in one transaction.
    ///
    /// `customer_number` is read from the customers table and ignored here.
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(order_number = %order.order_number, "Inserting order");

        let address = &order.address;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, customer_id, order_date,
                order_state, delivery_state, transaction_state,
                shipping_first_name, shipping_last_name, shipping_company,
                email, phone, street, additional_address, city, zip_code,
                country_iso, state_code, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.customer_id)
        .bind(order.order_date)
        .bind(order.order_state)
        .bind(order.delivery_state)
        .bind(order.transaction_state)
        .bind(&order.shipping_first_name)
        .bind(&order.shipping_last_name)
        .bind(&order.shipping_company)
        .bind(&order.email)
        .bind(&order.phone)
        .bind(&address.street)
        .bind(&address.additional_address)
        .bind(&address.city)
        .bind(&address.zip_code)
        .bind(&address.country_iso)
        .bind(&address.state_code)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.line_items {
            sqlx::query(
                r#"
                INSERT INTO order_line_items (order_id, product_id, sku, quantity, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&order.id)
            .bind(&item.product_id)
            .bind(&item.sku)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Applies one transition to one of the order's state machines.
    ///
    /// Illegal transitions leave the row untouched and return
    /// [`DbError::Domain`].
    pub async fn apply_transition(
        &self,
        order_id: &str,
        machine: Machine,
        transition: Transition,
    ) -> DbResult<StatusTriple> {
        self.apply_transitions(order_id, &[(machine, transition)]).await
    }

    /// Applies a sequence of transitions as one write.
    ///
    /// Every step is checked against its state machine before anything is
    /// written; if any step is illegal the row is left untouched.
    pub async fn apply_transitions(
        &self,
        order_id: &str,
        steps: &[(Machine, Transition)],
    ) -> DbResult<StatusTriple> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Order>(&format!("{SELECT_COLUMNS} WHERE o.id = ?1"))
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let mut statuses = current.status_triple();
        for &(machine, transition) in steps {
            match machine {
                Machine::Order => statuses.order = statuses.order.apply(transition)?,
                Machine::Delivery => statuses.shipping = statuses.shipping.apply(transition)?,
                Machine::Transaction => statuses.payment = statuses.payment.apply(transition)?,
            }
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET order_state = ?2, delivery_state = ?3, transaction_state = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .bind(statuses.order)
        .bind(statuses.shipping)
        .bind(statuses.payment)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            order_id = %order_id,
            steps = steps.len(),
            statuses = %statuses,
            "Applied order transitions"
        );

        Ok(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use infoplus_core::{Address, CoreError, Customer, DeliveryState, OrderState};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.customers()
            .insert(&Customer {
                id: "c1".into(),
                customer_number: "10001".into(),
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                company: None,
                email: "grace@example.com".into(),
                phone: None,
                address: Address::default(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        db
    }

    fn order(id: &str, payment: TransactionState) -> Order {
        Order {
            id: id.to_string(),
            order_number: format!("SO-{id}"),
            customer_id: "c1".into(),
            customer_number: String::new(),
            order_date: Utc::now(),
            order_state: OrderState::Open,
            delivery_state: DeliveryState::Open,
            transaction_state: payment,
            shipping_first_name: "Grace".into(),
            shipping_last_name: "Hopper".into(),
            shipping_company: None,
            email: "grace@example.com".into(),
            phone: None,
            address: Address {
                street: "1 Navy Way".into(),
                additional_address: None,
                city: "Arlington".into(),
                zip_code: "22201".into(),
                country_iso: "US".into(),
                state_code: Some("VA".into()),
            },
            line_items: vec![OrderLineItem {
                product_id: "p1".into(),
                sku: "ABC123".into(),
                quantity: 2,
                unit_price_cents: 500,
            }],
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_paid_loads_line_items_and_customer_number() {
        let db = seeded().await;
        let repo = db.orders();
        repo.insert(&order("o1", TransactionState::Paid)).await.unwrap();
        repo.insert(&order("o2", TransactionState::Open)).await.unwrap();

        let paid = repo.list_paid().await.unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].id, "o1");
        assert_eq!(paid[0].customer_number, "10001");
        assert_eq!(paid[0].line_items.len(), 1);
        assert_eq!(paid[0].address.state_code.as_deref(), Some("VA"));
    }

    #[tokio::test]
    async fn test_apply_transition_persists() {
        let db = seeded().await;
        let repo = db.orders();
        repo.insert(&order("o1", TransactionState::Paid)).await.unwrap();

        let statuses = repo
            .apply_transition("o1", Machine::Delivery, Transition::Ship)
            .await
            .unwrap();
        assert_eq!(statuses.shipping, DeliveryState::Shipped);

        let stored = repo.get("o1").await.unwrap().unwrap();
        assert_eq!(stored.delivery_state, DeliveryState::Shipped);
        assert_eq!(stored.transaction_state, TransactionState::Paid);
    }

    #[tokio::test]
    async fn test_illegal_transition_leaves_row_untouched() {
        let db = seeded().await;
        let repo = db.orders();
        repo.insert(&order("o1", TransactionState::Paid)).await.unwrap();
        repo.apply_transition("o1", Machine::Delivery, Transition::Ship)
            .await
            .unwrap();

        let err = repo
            .apply_transition("o1", Machine::Delivery, Transition::Cancel)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::IllegalTransition { .. })
        ));
        assert_eq!(
            repo.get("o1").await.unwrap().unwrap().delivery_state,
            DeliveryState::Shipped
        );

        assert!(matches!(
            repo.apply_transition("missing", Machine::Order, Transition::Cancel)
                .await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_partial_illegal_sequence_writes_nothing() {
        let db = seeded().await;
        let repo = db.orders();
        repo.insert(&order("o1", TransactionState::Paid)).await.unwrap();
        repo.apply_transition("o1", Machine::Delivery, Transition::Ship)
            .await
            .unwrap();

        let err = repo
            .apply_transitions(
                "o1",
                &[
                    (Machine::Transaction, Transition::Cancel),
                    (Machine::Delivery, Transition::Cancel),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::IllegalTransition {
                machine: Machine::Delivery,
                ..
            })
        ));

        let stored = repo.get("o1").await.unwrap().unwrap();
        assert_eq!(stored.transaction_state, TransactionState::Paid);
        assert_eq!(stored.delivery_state, DeliveryState::Shipped);
    }

    #[tokio::test]
    async fn test_cancel_sequence_applied_together() {
        let db = seeded().await;
        let repo = db.orders();
        repo.insert(&order("o1", TransactionState::Paid)).await.unwrap();

        let statuses = repo
            .apply_transitions(
                "o1",
                &[
                    (Machine::Transaction, Transition::Cancel),
                    (Machine::Delivery, Transition::Cancel),
                ],
            )
            .await
            .unwrap();
        assert_eq!(statuses.payment, TransactionState::Cancelled);
        assert_eq!(statuses.shipping, DeliveryState::Cancelled);
        assert_eq!(repo.get("o1").await.unwrap().unwrap().status_triple(), statuses);
    }
}
