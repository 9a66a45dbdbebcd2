//! Visitor statistics service

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use sqlx::Row;

use crate::{
    api::stats::{StatEntry, StatsResponse, TimeSeriesEntry, VisitStats},
    error::AppResult,
    repository::Repository,
};

const TOP_COMPANIES: i64 = 10;

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Visit totals, top companies, daily counts for the last 30 days and
    /// the regular/service breakdown, all computed over the full history.
    pub async fn get_stats(&self) -> AppResult<StatsResponse> {
        let pool = &self.repository.pool;

        let now = Utc::now();
        let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let week_ago = today - Duration::days(7);
        let month_ago = today - Duration::days(30);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM visitors")
            .fetch_one(pool)
            .await?;

        let today_visits: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM visitors WHERE check_in_time >= $1")
                .bind(today)
                .fetch_one(pool)
                .await?;

        let weekly_visits: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM visitors WHERE check_in_time >= $1")
                .bind(week_ago)
                .fetch_one(pool)
                .await?;

        let monthly_visits: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM visitors WHERE check_in_time >= $1")
                .bind(month_ago)
                .fetch_one(pool)
                .await?;

        let on_site: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM visitors WHERE checked_out = FALSE")
                .fetch_one(pool)
                .await?;

        let companies = sqlx::query(
            r#"
            SELECT company, COUNT(*) AS count
            FROM visitors
            GROUP BY company
            ORDER BY count DESC, company
            LIMIT $1
            "#,
        )
        .bind(TOP_COMPANIES)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| StatEntry {
            label: row.get("company"),
            count: row.get("count"),
        })
        .collect();

        let daily = sqlx::query(
            r#"
            SELECT check_in_time::date AS day, COUNT(*) AS count
            FROM visitors
            WHERE check_in_time >= $1
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(month_ago)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| TimeSeriesEntry {
            date: row.get::<NaiveDate, _>("day"),
            count: row.get("count"),
        })
        .collect();

        let visitor_types = sqlx::query(
            r#"
            SELECT is_service_personnel, COUNT(*) AS count
            FROM visitors
            GROUP BY is_service_personnel
            ORDER BY is_service_personnel
            "#,
        )
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|row| StatEntry {
            label: if row.get::<bool, _>("is_service_personnel") {
                "service".to_string()
            } else {
                "regular".to_string()
            },
            count: row.get("count"),
        })
        .collect();

        Ok(StatsResponse {
            visits: VisitStats {
                total,
                today: today_visits,
                last_7_days: weekly_visits,
                last_30_days: monthly_visits,
            },
            on_site,
            companies,
            daily,
            visitor_types,
        })
    }
}
