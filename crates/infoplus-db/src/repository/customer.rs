//! Customer reads for the customer and order syncs.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use infoplus_core::Customer;

const SELECT_COLUMNS: &str = r#"
    SELECT id, customer_number, first_name, last_name, company, email, phone,
           street, additional_address, city, zip_code, country_iso, state_code,
           updated_at
    FROM customers
"#;

/// Repository for customers.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// All customers, ordered by customer number.
    pub async fn list_for_sync(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "{SELECT_COLUMNS} ORDER BY customer_number"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(customer_number = %customer.customer_number, "Inserting customer");

        let address = &customer.address;
        sqlx::query(
            r#"
            INSERT INTO customers (
                id, customer_number, first_name, last_name, company, email, phone,
                street, additional_address, city, zip_code, country_iso, state_code,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.customer_number)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.company)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&address.street)
        .bind(&address.additional_address)
        .bind(&address.city)
        .bind(&address.zip_code)
        .bind(&address.country_iso)
        .bind(&address.state_code)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};
    use chrono::Utc;
    use infoplus_core::Address;

    fn customer(id: &str, number: &str) -> Customer {
        Customer {
            id: id.to_string(),
            customer_number: number.to_string(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            company: None,
            email: "ada@example.com".into(),
            phone: Some("555-0100".into()),
            address: Address {
                street: "12 St James's Square".into(),
                additional_address: None,
                city: "London".into(),
                zip_code: "SW1Y 4JH".into(),
                country_iso: "GB".into(),
                state_code: None,
            },
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back_address() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.insert(&customer("c2", "10002")).await.unwrap();
        repo.insert(&customer("c1", "10001")).await.unwrap();

        let all = repo.list_for_sync().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].customer_number, "10001");
        assert_eq!(all[0].address.city, "London");

        let one = repo.get_by_id("c2").await.unwrap().unwrap();
        assert_eq!(one.phone.as_deref(), Some("555-0100"));
    }

    #[tokio::test]
    async fn test_duplicate_customer_number() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();
        repo.insert(&customer("c1", "10001")).await.unwrap();

        let dup = repo.insert(&customer("c9", "10001")).await;
        assert!(matches!(dup, Err(DbError::UniqueViolation { .. })));
    }
}
