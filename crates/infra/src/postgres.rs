//! Postgres-backed customer and invoice stores.
//!
//! ## Error Mapping
//!
//! | Failure | StoreError |
//! |---------|------------|
//! | `UPDATE` touched no row | `Missing` |
//! | Column type mismatch, unknown currency/status text | `Decode` |
//! | Anything else from SQLx (pool, network, constraint) | `Backend` |
//!
//! Invoice updates are a single `UPDATE ... WHERE id = $1` statement, so a
//! concurrent reader sees all of an update or none of it. Conditional updates add
//! `AND status = $4` to the same statement; a zero row count is then resolved
//! into `Missing` or "status moved on" with one extra lookup.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use chargebook_core::{
    CustomerId, DomainError, InvoiceId, Money, StoreError, StoreResult,
};
use chargebook_customers::{Customer, CustomerCreateRequest, CustomerStore, CustomerUpdateRequest};
use chargebook_invoicing::{Invoice, InvoiceStatus, InvoiceStore, InvoiceUpdateRequest, NewInvoice};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id           BIGSERIAL PRIMARY KEY,
        name         TEXT NOT NULL,
        currency     TEXT NOT NULL,
        email        TEXT NOT NULL,
        phone_number TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id                     BIGSERIAL PRIMARY KEY,
        customer_id            BIGINT NOT NULL REFERENCES customers (id),
        value                  NUMERIC(1000, 2) NOT NULL,
        currency               TEXT NOT NULL,
        status                 TEXT NOT NULL,
        successful_charge_date TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS invoices_status_idx ON invoices (status)",
];

const INVOICE_COLUMNS: &str =
    "id, customer_id, value, currency, status, successful_charge_date";

const CUSTOMER_COLUMNS: &str = "id, name, currency, email, phone_number";

/// The charge date survives only while the resulting status is `PAID`.
const INVOICE_UPDATE: &str = "UPDATE invoices \
     SET status = COALESCE($2, status), \
         successful_charge_date = CASE \
             WHEN COALESCE($2, status) = 'PAID' THEN COALESCE($3, successful_charge_date) \
             ELSE NULL \
         END \
     WHERE id = $1";

/// Open a connection pool.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Create tables and indexes if they do not exist yet.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::backend(err.to_string())
}

fn decode(err: sqlx::Error) -> StoreError {
    StoreError::decode(err.to_string())
}

fn parse_column<T>(raw: &str) -> StoreResult<T>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse()
        .map_err(|err: DomainError| StoreError::decode(err.to_string()))
}

fn invoice_from_row(row: &PgRow) -> StoreResult<Invoice> {
    let id: i64 = row.try_get("id").map_err(decode)?;
    let customer_id: i64 = row.try_get("customer_id").map_err(decode)?;
    let value: Decimal = row.try_get("value").map_err(decode)?;
    let currency: String = row.try_get("currency").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;
    Ok(Invoice {
        id: InvoiceId::new(id),
        customer_id: CustomerId::new(customer_id),
        amount: Money::new(value, parse_column(&currency)?),
        status: parse_column(&status)?,
        successful_charge_date: row.try_get("successful_charge_date").map_err(decode)?,
    })
}

fn customer_from_row(row: &PgRow) -> StoreResult<Customer> {
    let id: i64 = row.try_get("id").map_err(decode)?;
    let currency: String = row.try_get("currency").map_err(decode)?;
    Ok(Customer {
        id: CustomerId::new(id),
        name: row.try_get("name").map_err(decode)?,
        currency: parse_column(&currency)?,
        email: row.try_get("email").map_err(decode)?,
        phone_number: row.try_get("phone_number").map_err(decode)?,
    })
}

#[derive(Debug, Clone)]
pub struct PostgresInvoiceStore {
    pool: PgPool,
}

impl PostgresInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceStore for PostgresInvoiceStore {
    #[instrument(skip(self), fields(invoice_id = %id), err)]
    async fn fetch_by_id(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(invoice_from_row).transpose()
    }

    async fn fetch_all(&self) -> StoreResult<Vec<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY id");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(invoice_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn fetch_by_statuses(&self, statuses: &[InvoiceStatus]) -> StoreResult<Vec<Invoice>> {
        let codes: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE status = ANY($1) ORDER BY id");
        let rows = sqlx::query(&sql)
            .bind(codes)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(invoice_from_row).collect()
    }

    async fn create(&self, invoice: NewInvoice) -> StoreResult<Invoice> {
        let sql = format!(
            "INSERT INTO invoices (customer_id, value, currency, status, successful_charge_date) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {INVOICE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(invoice.customer_id.get())
            .bind(invoice.amount.value)
            .bind(invoice.amount.currency.code())
            .bind(invoice.status.as_str())
            .bind(invoice.successful_charge_date)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        invoice_from_row(&row)
    }

    #[instrument(skip(self), fields(invoice_id = %request.id), err)]
    async fn update(&self, request: &InvoiceUpdateRequest) -> StoreResult<()> {
        let result = sqlx::query(INVOICE_UPDATE)
            .bind(request.id.get())
            .bind(request.status.map(|s| s.as_str()))
            .bind(request.successful_charge_date)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::missing("invoice", request.id.get()));
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(invoice_id = %request.id), err)]
    async fn update_if_status(
        &self,
        expected: InvoiceStatus,
        request: &InvoiceUpdateRequest,
    ) -> StoreResult<bool> {
        let sql = format!("{INVOICE_UPDATE} AND status = $4");
        let result = sqlx::query(&sql)
            .bind(request.id.get())
            .bind(request.status.map(|s| s.as_str()))
            .bind(request.successful_charge_date)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        match self.fetch_by_id(request.id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::missing("invoice", request.id.get())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresCustomerStore {
    pool: PgPool,
}

impl PostgresCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for PostgresCustomerStore {
    async fn fetch_by_id(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn fetch_all(&self) -> StoreResult<Vec<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(customer_from_row).collect()
    }

    async fn create(&self, request: &CustomerCreateRequest) -> StoreResult<Customer> {
        let sql = format!(
            "INSERT INTO customers (name, currency, email, phone_number) \
             VALUES ($1, $2, $3, $4) RETURNING {CUSTOMER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&request.name)
            .bind(request.currency.code())
            .bind(&request.email)
            .bind(&request.phone_number)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        customer_from_row(&row)
    }

    #[instrument(skip(self), fields(customer_id = %request.id), err)]
    async fn update(&self, request: &CustomerUpdateRequest) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE customers \
             SET name = COALESCE($2, name), \
                 currency = COALESCE($3, currency), \
                 email = COALESCE($4, email), \
                 phone_number = COALESCE($5, phone_number) \
             WHERE id = $1",
        )
        .bind(request.id.get())
        .bind(&request.name)
        .bind(request.currency.map(|c| c.code()))
        .bind(&request.email)
        .bind(&request.phone_number)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::missing("customer", request.id.get()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Run against a real database when `DATABASE_URL` is set; skipped otherwise.

    use super::*;
    use chargebook_core::Currency;
    use chrono::{TimeZone, Utc};

    async fn pool() -> Option<PgPool> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = connect(&url).await.ok()?;
        migrate(&pool).await.ok()?;
        Some(pool)
    }

    async fn customer(store: &PostgresCustomerStore) -> Customer {
        store
            .create(&CustomerCreateRequest {
                name: "Ada".to_string(),
                currency: Currency::Sek,
                email: "ada@example.com".to_string(),
                phone_number: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn invoice_status_update_round_trips_through_postgres() {
        let Some(pool) = pool().await else { return };
        let customers = PostgresCustomerStore::new(pool.clone());
        let invoices = PostgresInvoiceStore::new(pool);
        let owner = customer(&customers).await;

        let created = invoices
            .create(NewInvoice::pending(
                owner.id,
                Money::new(Decimal::new(12_345, 2), Currency::Sek),
            ))
            .await
            .unwrap();
        assert_eq!(created.status, InvoiceStatus::Pending);

        let charged_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        invoices
            .update(&InvoiceUpdateRequest::paid(created.id, charged_at))
            .await
            .unwrap();

        let stored = invoices.fetch_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert_eq!(stored.successful_charge_date, Some(charged_at));
        assert_eq!(stored.amount, created.amount);

        let paid = invoices
            .fetch_by_statuses(&[InvoiceStatus::Paid])
            .await
            .unwrap();
        assert!(paid.iter().any(|invoice| invoice.id == created.id));
    }

    #[tokio::test]
    async fn leaving_paid_clears_the_stored_charge_date() {
        let Some(pool) = pool().await else { return };
        let customers = PostgresCustomerStore::new(pool.clone());
        let invoices = PostgresInvoiceStore::new(pool);
        let owner = customer(&customers).await;
        let charged_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let created = invoices
            .create(NewInvoice::paid(
                owner.id,
                Money::new(Decimal::new(500, 2), Currency::Sek),
                charged_at,
            ))
            .await
            .unwrap();
        invoices
            .update(&InvoiceUpdateRequest::status(created.id, InvoiceStatus::Pending))
            .await
            .unwrap();

        let stored = invoices.fetch_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvoiceStatus::Pending);
        assert_eq!(stored.successful_charge_date, None);
    }

    #[tokio::test]
    async fn conditional_update_leaves_a_moved_row_alone() {
        let Some(pool) = pool().await else { return };
        let customers = PostgresCustomerStore::new(pool.clone());
        let invoices = PostgresInvoiceStore::new(pool);
        let owner = customer(&customers).await;
        let charged_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let created = invoices
            .create(NewInvoice::paid(
                owner.id,
                Money::new(Decimal::new(500, 2), Currency::Sek),
                charged_at,
            ))
            .await
            .unwrap();
        let written = invoices
            .update_if_status(
                InvoiceStatus::Pending,
                &InvoiceUpdateRequest::status(created.id, InvoiceStatus::UnpaidLowAccountBalance),
            )
            .await
            .unwrap();
        assert!(!written);

        let stored = invoices.fetch_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert_eq!(stored.successful_charge_date, Some(charged_at));

        let err = invoices
            .update_if_status(
                InvoiceStatus::Pending,
                &InvoiceUpdateRequest::status(InvoiceId::new(i64::MAX), InvoiceStatus::Paid),
            )
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::missing("invoice", i64::MAX));
    }

    #[tokio::test]
    async fn updating_unknown_rows_reports_missing() {
        let Some(pool) = pool().await else { return };
        let customers = PostgresCustomerStore::new(pool.clone());
        let invoices = PostgresInvoiceStore::new(pool);

        let err = invoices
            .update(&InvoiceUpdateRequest::status(
                InvoiceId::new(i64::MAX),
                InvoiceStatus::Canceled,
            ))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::missing("invoice", i64::MAX));

        let err = customers
            .update(&CustomerUpdateRequest::new(CustomerId::new(i64::MAX)))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::missing("customer", i64::MAX));
    }

    #[tokio::test]
    async fn partial_customer_update_keeps_other_fields() {
        let Some(pool) = pool().await else { return };
        let customers = PostgresCustomerStore::new(pool);
        let created = customer(&customers).await;

        let mut request = CustomerUpdateRequest::new(created.id);
        request.phone_number = Some("+46 70 123 45 67".to_string());
        customers.update(&request).await.unwrap();

        let stored = customers.fetch_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.name, created.name);
        assert_eq!(stored.currency, created.currency);
        assert_eq!(stored.phone_number.as_deref(), Some("+46 70 123 45 67"));
    }

    #[test]
    fn unknown_status_text_is_a_decode_error() {
        let err = parse_column::<InvoiceStatus>("REFUNDED").unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
        assert_eq!(parse_column::<Currency>("eur").unwrap(), Currency::Eur);
    }
}
