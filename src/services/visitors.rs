//! Visitor commit/fetch operations
//!
//! Wraps the store with the kiosk-level behavior: the stale-visitor sweep
//! before active listings, the autocomplete guards, and the event feed
//! that backs the SSE push interface (admin polling stays the fallback).

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    config::KioskConfig,
    error::{AppError, AppResult},
    models::{
        visitor::CheckInRequest, CheckInOrder, FrequentName, VisitorEvent, VisitorRecord,
    },
    repository::visitors::{VisitorStore, VisitorsRepository},
};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const DEFAULT_HISTORY_LIMIT: i64 = 100;
const MAX_HISTORY_LIMIT: i64 = 1000;

/// Minimum prefix length before autocomplete kicks in
const MIN_PREFIX_CHARS: usize = 2;

#[derive(Clone)]
pub struct VisitorsService {
    store: Arc<dyn VisitorStore>,
    events: broadcast::Sender<VisitorEvent>,
    kiosk: KioskConfig,
}

impl VisitorsService {
    pub fn new(store: Arc<dyn VisitorStore>, kiosk: KioskConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            events,
            kiosk,
        }
    }

    /// Subscribe to the visitor event feed
    pub fn subscribe(&self) -> broadcast::Receiver<VisitorEvent> {
        self.events.subscribe()
    }

    /// Commit a wizard check-in: one record per visitor, all-or-nothing
    pub async fn check_in(&self, order: &CheckInOrder) -> AppResult<Vec<VisitorRecord>> {
        let records = self.store.check_in(order).await?;
        tracing::info!(
            count = records.len(),
            company = %order.company,
            host = %order.host_name,
            "visitors checked in"
        );
        for record in &records {
            let _ = self.events.send(VisitorEvent::CheckedIn {
                record: record.clone(),
            });
        }
        Ok(records)
    }

    /// Direct single-visitor check-in (admin/manual path)
    pub async fn check_in_one(&self, request: &CheckInRequest) -> AppResult<VisitorRecord> {
        let order = CheckInOrder {
            names: vec![request.name.trim().to_string()],
            company: request.company.trim().to_string(),
            host_name: request.visiting.trim().to_string(),
            is_service_personnel: request.is_service_personnel,
        };
        let records = self.check_in(&order).await?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("check-in returned no record".to_string()))
    }

    /// Active visitors, newest check-in first. Runs the stale sweep first
    /// so visitors forgotten on site do not linger past closing time.
    pub async fn list_active(&self) -> AppResult<Vec<VisitorRecord>> {
        let cutoff = VisitorsRepository::stale_cutoff(Utc::now(), self.kiosk.auto_checkout_hour);
        let swept = self.store.check_out_stale(cutoff).await?;
        if swept > 0 {
            tracing::info!(swept, %cutoff, "auto-checked out stale visitors");
        }
        self.store.list_active().await
    }

    /// Recent visitor history
    pub async fn list_history(&self, limit: Option<i64>) -> AppResult<Vec<VisitorRecord>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
        self.store.list_history(limit).await
    }

    /// Check a visitor out. Exactly one transition per record: a second
    /// checkout is a conflict, never a silent re-stamp.
    pub async fn check_out(&self, id: Uuid) -> AppResult<VisitorRecord> {
        let record = self.store.check_out(id).await?;
        tracing::info!(visitor = %id, "visitor checked out");
        let _ = self.events.send(VisitorEvent::CheckedOut {
            record: record.clone(),
        });
        Ok(record)
    }

    /// Frequent-visitor name suggestions for the kiosk form
    pub async fn frequent_names(
        &self,
        company: &str,
        prefix: &str,
    ) -> AppResult<Vec<FrequentName>> {
        if company.trim().is_empty() || prefix.chars().count() < MIN_PREFIX_CHARS {
            return Ok(Vec::new());
        }
        self.store.frequent_names(company, prefix).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::visitors::MockVisitorStore;
    use chrono::{DateTime, Utc};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn record(name: &str, checked_out: bool) -> VisitorRecord {
        VisitorRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            company: "Acme".to_string(),
            visiting: "Per Falk".to_string(),
            is_service_personnel: false,
            check_in_time: Utc::now(),
            check_out_time: checked_out.then(Utc::now),
            checked_out,
        }
    }

    fn service(store: MockVisitorStore) -> VisitorsService {
        VisitorsService::new(Arc::new(store), KioskConfig::default())
    }

    #[tokio::test]
    async fn check_in_forwards_full_order_and_emits_events() {
        let mut store = MockVisitorStore::new();
        store
            .expect_check_in()
            .withf(|order: &CheckInOrder| {
                order.names == ["Anna Svensson", "Per Svensson"]
                    && order.company == "Acme"
                    && order.host_name == "Per Falk"
                    && !order.is_service_personnel
            })
            .times(1)
            .returning(|order| {
                Ok(order
                    .names
                    .iter()
                    .map(|n| record(n, false))
                    .collect())
            });

        let service = service(store);
        let mut events = service.subscribe();

        let order = CheckInOrder {
            names: vec!["Anna Svensson".to_string(), "Per Svensson".to_string()],
            company: "Acme".to_string(),
            host_name: "Per Falk".to_string(),
            is_service_personnel: false,
        };
        let records = service.check_in(&order).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.checked_out));

        for expected in ["Anna Svensson", "Per Svensson"] {
            match events.try_recv().unwrap() {
                VisitorEvent::CheckedIn { record } => assert_eq!(record.name, expected),
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn check_out_emits_event_with_stamped_record() {
        let id = Uuid::new_v4();
        let mut store = MockVisitorStore::new();
        store
            .expect_check_out()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(record("Anna Svensson", true)));

        let service = service(store);
        let mut events = service.subscribe();

        let result = service.check_out(id).await.unwrap();
        assert!(result.checked_out);
        assert!(result.check_out_time.is_some());

        match events.try_recv().unwrap() {
            VisitorEvent::CheckedOut { record } => assert!(record.checked_out),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn check_out_conflict_emits_no_event() {
        let id = Uuid::new_v4();
        let mut store = MockVisitorStore::new();
        store
            .expect_check_out()
            .returning(move |_| Err(AppError::Conflict(format!("Visitor {} is already checked out", id))));

        let service = service(store);
        let mut events = service.subscribe();

        assert!(matches!(
            service.check_out(id).await,
            Err(AppError::Conflict(_))
        ));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn list_active_runs_stale_sweep_first() {
        let mut store = MockVisitorStore::new();
        let mut seq = Sequence::new();
        store
            .expect_check_out_stale()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|cutoff: &DateTime<Utc>| *cutoff < Utc::now())
            .returning(|_| Ok(2));
        store
            .expect_list_active()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![record("Anna Svensson", false)]));

        let service = service(store);
        let active = service.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert!(!active[0].checked_out);
    }

    #[tokio::test]
    async fn frequent_names_short_circuits_on_weak_input() {
        // No store expectations: the guard must not reach the backend.
        let service = service(MockVisitorStore::new());

        assert!(service.frequent_names("", "An").await.unwrap().is_empty());
        assert!(service.frequent_names("Acme", "A").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_limit_is_clamped() {
        let mut store = MockVisitorStore::new();
        store
            .expect_list_history()
            .with(eq(MAX_HISTORY_LIMIT))
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let service = service(store);
        service.list_history(Some(50_000)).await.unwrap();
    }
}
