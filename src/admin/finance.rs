/// Finance ledger
use crate::{
    db,
    error::{PortalError, PortalResult},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

/// Finance record types
pub const RECORD_TYPES: [&str; 3] = ["income", "expense", "transfer"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceRecord {
    pub id: String,
    pub record_type: String,
    pub category: String,
    pub amount: f64,
    pub description: Option<String>,
    pub reference_id: Option<String>,
    pub reference_type: Option<String>,
    pub payment_method: Option<String>,
    pub recorded_by: Option<String>,
    pub record_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    pub record_type: String,
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub reference_type: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub record_date: Option<NaiveDate>,
}

impl CreateRecordRequest {
    pub fn validate(&self) -> PortalResult<()> {
        if !RECORD_TYPES.contains(&self.record_type.as_str()) {
            return Err(PortalError::invalid_field(
                "recordType",
                "Record type must be income, expense or transfer",
            ));
        }
        if self.category.trim().is_empty() {
            return Err(PortalError::invalid_field("category", "Category is required"));
        }
        if !db::positive_at_scale(self.amount, 2) {
            return Err(PortalError::invalid_field(
                "amount",
                "Amount must be at least 0.01",
            ));
        }
        if !db::fits_numeric(self.amount, 12, 2) {
            return Err(PortalError::invalid_field("amount", "Amount is too large"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilter {
    pub record_type: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Totals per record type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub income: f64,
    pub expense: f64,
    pub transfer: f64,
    pub balance: f64,
}

impl FinanceSummary {
    pub fn new(income: f64, expense: f64, transfer: f64) -> Self {
        Self {
            income,
            expense,
            transfer,
            balance: income - expense,
        }
    }
}

const RECORD_COLUMNS: &str = "id, record_type, category, amount::float8 AS amount, description, \
                              reference_id, reference_type, payment_method, recorded_by, \
                              record_date, created_at";

/// Finance manager
#[derive(Clone)]
pub struct FinanceManager {
    db: PgPool,
}

impl FinanceManager {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List records, newest record date first
    pub async fn list(&self, filter: &RecordFilter) -> PortalResult<Vec<FinanceRecord>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM finance_records WHERE 1=1", RECORD_COLUMNS));
        push_filter(&mut query, filter);
        query.push(" ORDER BY record_date DESC, created_at DESC");

        let rows = query
            .build()
            .fetch_all(&self.db)
            .await
            .map_err(|e| db::map_missing_table(e, "finance_records"))?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    pub async fn create(
        &self,
        req: &CreateRecordRequest,
        recorded_by: Option<&str>,
    ) -> PortalResult<FinanceRecord> {
        req.validate()?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO finance_records
                (id, record_type, category, amount, description, reference_id, reference_type,
                 payment_method, recorded_by, record_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, CURRENT_DATE))
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&req.record_type)
        .bind(req.category.trim())
        .bind(req.amount)
        .bind(req.description.as_deref())
        .bind(req.reference_id.as_deref())
        .bind(req.reference_type.as_deref())
        .bind(req.payment_method.as_deref())
        .bind(recorded_by)
        .bind(req.record_date)
        .fetch_one(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "finance_records"))?;

        let record = record_from_row(&row);
        tracing::info!(
            "Recorded {} of {:.2} ({})",
            record.record_type,
            record.amount,
            record.category
        );

        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> PortalResult<()> {
        let result = sqlx::query("DELETE FROM finance_records WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| db::map_missing_table(e, "finance_records"))?;

        if result.rows_affected() == 0 {
            return Err(PortalError::NotFound("Finance record not found".to_string()));
        }

        Ok(())
    }

    /// Totals over the filtered records
    pub async fn summary(&self, filter: &RecordFilter) -> PortalResult<FinanceSummary> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE record_type = 'income'), 0)::float8 AS income,
                COALESCE(SUM(amount) FILTER (WHERE record_type = 'expense'), 0)::float8 AS expense,
                COALESCE(SUM(amount) FILTER (WHERE record_type = 'transfer'), 0)::float8 AS transfer
            FROM finance_records WHERE 1=1
            "#,
        );
        push_filter(&mut query, filter);

        let row = query
            .build()
            .fetch_one(&self.db)
            .await
            .map_err(|e| db::map_missing_table(e, "finance_records"))?;

        Ok(FinanceSummary::new(
            row.get("income"),
            row.get("expense"),
            row.get("transfer"),
        ))
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &RecordFilter) {
    if let Some(record_type) = filter.record_type.as_deref().filter(|t| !t.is_empty()) {
        query.push(" AND record_type = ").push_bind(record_type.to_string());
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        query.push(" AND category = ").push_bind(category.to_string());
    }
    if let Some(start) = filter.start_date {
        query.push(" AND record_date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        query.push(" AND record_date <= ").push_bind(end);
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> FinanceRecord {
    FinanceRecord {
        id: row.get("id"),
        record_type: row.get("record_type"),
        category: row.get("category"),
        amount: row.get("amount"),
        description: row.get("description"),
        reference_id: row.get("reference_id"),
        reference_type: row.get("reference_type"),
        payment_method: row.get("payment_method"),
        recorded_by: row.get("recorded_by"),
        record_date: row.get("record_date"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(record_type: &str, category: &str, amount: f64) -> CreateRecordRequest {
        CreateRecordRequest {
            record_type: record_type.to_string(),
            category: category.to_string(),
            amount,
            description: None,
            reference_id: None,
            reference_type: None,
            payment_method: None,
            record_date: None,
        }
    }

    #[test]
    fn test_validate_record() {
        assert!(req("income", "registrations", 2200.0).validate().is_ok());
        assert!(req("transfer", "bank", 10.0).validate().is_ok());

        assert!(req("refund", "registrations", 10.0).validate().is_err());
        assert!(req("expense", " ", 10.0).validate().is_err());
        assert!(req("expense", "trophies", 0.0).validate().is_err());
        assert!(req("expense", "trophies", -5.0).validate().is_err());
    }

    #[test]
    fn test_amount_must_survive_cent_rounding() {
        assert!(req("income", "g", 0.01).validate().is_ok());
        assert!(req("income", "g", 9_999_999_999.99).validate().is_ok());

        for amount in [0.001, 10_000_000_000.0, f64::INFINITY] {
            let err = req("income", "g", amount).validate().unwrap_err();
            assert!(matches!(err, PortalError::InvalidField { field: "amount", .. }));
        }
    }

    #[test]
    fn test_balance_ignores_transfers() {
        let summary = FinanceSummary::new(5000.0, 1250.5, 800.0);
        assert_eq!(summary.balance, 3749.5);
    }

    #[test]
    fn test_filter_dates_deserialize() {
        let filter: RecordFilter =
            serde_json::from_str(r#"{"recordType":"expense","startDate":"2026-02-01"}"#).unwrap();
        assert_eq!(filter.record_type.as_deref(), Some("expense"));
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2026, 2, 1));
        assert!(filter.end_date.is_none());
    }
}
