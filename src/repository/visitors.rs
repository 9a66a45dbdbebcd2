//! Visitors repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{CheckInOrder, FrequentName, VisitorRecord},
};

/// Backend contract consumed by the services layer.
///
/// Mirrors the store operations of the kiosk: batch insert at terms
/// acceptance, active/history queries, the single checkout update and
/// the stale-visitor sweep.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitorStore: Send + Sync {
    async fn check_in(&self, order: &CheckInOrder) -> AppResult<Vec<VisitorRecord>>;
    async fn list_active(&self) -> AppResult<Vec<VisitorRecord>>;
    async fn list_history(&self, limit: i64) -> AppResult<Vec<VisitorRecord>>;
    async fn check_out(&self, id: Uuid) -> AppResult<VisitorRecord>;
    async fn check_out_stale(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
    async fn frequent_names(&self, company: &str, prefix: &str) -> AppResult<Vec<FrequentName>>;
}

#[derive(Clone)]
pub struct VisitorsRepository {
    pool: Pool<Postgres>,
}

impl VisitorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get visitor record by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<VisitorRecord> {
        sqlx::query_as::<_, VisitorRecord>("SELECT * FROM visitors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visitor with id {} not found", id)))
    }

    /// Cutoff instant for the stale sweep: the most recent occurrence of
    /// `hour:00` in the past, floored at the start of the current day.
    /// The sweep only ever covers visitors checked in on earlier days; a
    /// same-day arrival is still legitimately on site after closing time.
    pub fn stale_cutoff(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
        let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
        let today = now.date_naive().and_time(time).and_utc();
        let cutoff = if now >= today {
            today
        } else {
            today - Duration::days(1)
        };
        let start_of_today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        cutoff.min(start_of_today)
    }
}

#[async_trait]
impl VisitorStore for VisitorsRepository {
    /// Insert one record per visitor in list order, all inside a single
    /// transaction so a mid-batch failure leaves nothing behind.
    async fn check_in(&self, order: &CheckInOrder) -> AppResult<Vec<VisitorRecord>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(order.names.len());

        for name in &order.names {
            let record = sqlx::query_as::<_, VisitorRecord>(
                r#"
                INSERT INTO visitors (name, company, visiting, is_service_personnel)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(name)
            .bind(&order.company)
            .bind(&order.host_name)
            .bind(order.is_service_personnel)
            .fetch_one(&mut *tx)
            .await?;
            created.push(record);
        }

        tx.commit().await?;
        Ok(created)
    }

    /// All currently on-site visitors, most recent check-in first
    async fn list_active(&self) -> AppResult<Vec<VisitorRecord>> {
        let records = sqlx::query_as::<_, VisitorRecord>(
            "SELECT * FROM visitors WHERE checked_out = FALSE ORDER BY check_in_time DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Most recent records regardless of checkout state
    async fn list_history(&self, limit: i64) -> AppResult<Vec<VisitorRecord>> {
        let records = sqlx::query_as::<_, VisitorRecord>(
            "SELECT * FROM visitors ORDER BY check_in_time DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Set `checked_out` and stamp `check_out_time` for exactly one record.
    /// A record that is already checked out is a conflict; the guard in the
    /// UPDATE keeps the transition one-way even under concurrent checkouts.
    async fn check_out(&self, id: Uuid) -> AppResult<VisitorRecord> {
        let record = self.get_by_id(id).await?;
        if record.checked_out {
            return Err(AppError::Conflict(format!(
                "Visitor {} is already checked out",
                id
            )));
        }

        sqlx::query_as::<_, VisitorRecord>(
            r#"
            UPDATE visitors
            SET checked_out = TRUE, check_out_time = NOW()
            WHERE id = $1 AND checked_out = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("Visitor {} is already checked out", id))
        })
    }

    /// Check out every visitor still active from before the cutoff.
    /// Returns the number of records swept.
    async fn check_out_stale(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE visitors
            SET checked_out = TRUE, check_out_time = NOW()
            WHERE checked_out = FALSE AND check_in_time < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Names used at least three times by past visitors of a company,
    /// filtered by prefix, most frequent first
    async fn frequent_names(&self, company: &str, prefix: &str) -> AppResult<Vec<FrequentName>> {
        let pattern = format!("{}%", like_escape(prefix));
        let names = sqlx::query_as::<_, FrequentName>(
            r#"
            SELECT name, COUNT(*) AS visit_count
            FROM visitors
            WHERE company = $1 AND name ILIKE $2
            GROUP BY name
            HAVING COUNT(*) >= 3
            ORDER BY visit_count DESC, name
            "#,
        )
        .bind(company)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }
}

/// Escape `%`, `_` and `\` so a user-supplied fragment only ever matches
/// literally inside an ILIKE pattern.
fn like_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stale_cutoff_floors_at_start_of_day_after_the_hour() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 19, 30, 0).unwrap();
        let cutoff = VisitorsRepository::stale_cutoff(now, 18);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn stale_cutoff_uses_yesterday_before_the_hour() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let cutoff = VisitorsRepository::stale_cutoff(now, 18);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2026, 3, 9, 18, 0, 0).unwrap());
    }

    #[test]
    fn stale_cutoff_clamps_out_of_range_hour() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let cutoff = VisitorsRepository::stale_cutoff(now, 99);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2026, 3, 9, 23, 0, 0).unwrap());
    }

    #[test]
    fn same_day_check_in_is_never_stale() {
        // A visitor who arrived this morning must survive an evening sweep.
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 19, 0, 0).unwrap();
        let checked_in = Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap();
        let cutoff = VisitorsRepository::stale_cutoff(now, 18);
        assert!(checked_in >= cutoff);
    }

    #[test]
    fn yesterday_check_in_is_stale_after_the_hour() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 19, 0, 0).unwrap();
        let checked_in = Utc.with_ymd_and_hms(2026, 3, 9, 20, 0, 0).unwrap();
        let cutoff = VisitorsRepository::stale_cutoff(now, 18);
        assert!(checked_in < cutoff);
    }

    #[test]
    fn like_escape_neutralizes_wildcards() {
        assert_eq!(like_escape("An"), "An");
        assert_eq!(like_escape("%"), "\\%");
        assert_eq!(like_escape("a_b\\c%"), "a\\_b\\\\c\\%");
    }
}
