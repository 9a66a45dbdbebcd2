//! In-memory wizard session store
//!
//! One [`Wizard`] per kiosk session, kept behind a single RwLock map.
//! Sessions idle past the configured timeout are discarded on access, and
//! wall-clock time spent on the confirmation screen is converted into
//! countdown ticks when the session is next touched, so the auto-dismiss
//! holds without a per-session timer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    api::sessions::SessionView,
    config::KioskConfig,
    error::{AppError, AppResult},
    models::{CheckInOrder, Host, VisitorType},
    wizard::{DraftName, Step, Wizard, WizardError, WizardOptions},
};

struct Session {
    wizard: Wizard,
    last_seen: DateTime<Utc>,
}

pub struct SessionService {
    sessions: RwLock<HashMap<Uuid, Session>>,
    kiosk: KioskConfig,
}

fn wizard_err(err: WizardError) -> AppError {
    match err {
        WizardError::CommitInFlight => {
            AppError::Conflict("a commit is already in flight".to_string())
        }
        WizardError::InvalidTransition { step } => {
            AppError::BadRequest(format!("action not valid in step {:?}", step))
        }
        WizardError::BadVisitorCount { max } => {
            AppError::Validation(format!("visitor count must be between 1 and {}", max))
        }
    }
}

impl SessionService {
    pub fn new(kiosk: KioskConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            kiosk,
        }
    }

    fn wizard_options(&self) -> WizardOptions {
        WizardOptions {
            max_visitors: self.kiosk.max_visitors_per_check_in,
            countdown_ticks: self.kiosk.confirmation_countdown_secs,
        }
    }

    /// Create a fresh wizard session
    pub async fn create(&self) -> SessionView {
        let id = Uuid::new_v4();
        let wizard = Wizard::new(self.wizard_options());
        let view = SessionView::of(id, &wizard);
        self.sessions.write().await.insert(
            id,
            Session {
                wizard,
                last_seen: Utc::now(),
            },
        );
        tracing::debug!(session = %id, "wizard session created");
        view
    }

    /// Run `f` against the session's wizard after applying idle expiry and
    /// elapsed confirmation-countdown ticks.
    async fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Wizard) -> AppResult<T>,
    ) -> AppResult<T> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;

        let idle = (now - session.last_seen).num_seconds().max(0);
        if idle as u64 > self.kiosk.session_timeout_secs {
            sessions.remove(&id);
            tracing::debug!(session = %id, "wizard session expired");
            return Err(AppError::NotFound(format!("Session {} expired", id)));
        }

        if session.wizard.step() == Step::Confirmation {
            for _ in 0..idle {
                if session.wizard.tick() {
                    break;
                }
            }
        }
        session.last_seen = now;

        f(&mut session.wizard)
    }

    /// Current session state
    pub async fn view(&self, id: Uuid) -> AppResult<SessionView> {
        self.with_session(id, |w| Ok(SessionView::of(id, w))).await
    }

    pub async fn select_type(
        &self,
        id: Uuid,
        visitor_type: VisitorType,
    ) -> AppResult<SessionView> {
        self.with_session(id, |w| {
            w.select_type(visitor_type).map_err(wizard_err)?;
            Ok(SessionView::of(id, w))
        })
        .await
    }

    /// Submit the visitor-info form. Field-level validation failures are
    /// returned in the view's `field_errors`, not as an error.
    pub async fn submit_visitors(
        &self,
        id: Uuid,
        names: Vec<DraftName>,
        company: String,
    ) -> AppResult<SessionView> {
        self.with_session(id, |w| {
            w.submit_visitor_info(names, company).map_err(wizard_err)?;
            Ok(SessionView::of(id, w))
        })
        .await
    }

    pub async fn select_host(&self, id: Uuid, host: Host) -> AppResult<SessionView> {
        self.with_session(id, |w| {
            w.select_host(host).map_err(wizard_err)?;
            Ok(SessionView::of(id, w))
        })
        .await
    }

    /// Accept terms and take the commit payload; the wizard holds in
    /// `terms` with its submit control disabled until the outcome lands.
    pub async fn begin_commit(&self, id: Uuid) -> AppResult<CheckInOrder> {
        self.with_session(id, |w| w.accept_terms().map_err(wizard_err))
            .await
    }

    /// Report the commit outcome back to the wizard
    pub async fn finish_commit(&self, id: Uuid, success: bool) -> AppResult<SessionView> {
        self.with_session(id, |w| {
            if success {
                w.commit_succeeded().map_err(wizard_err)?;
            } else {
                w.commit_failed();
            }
            Ok(SessionView::of(id, w))
        })
        .await
    }

    pub async fn back(&self, id: Uuid) -> AppResult<SessionView> {
        self.with_session(id, |w| {
            w.back().map_err(wizard_err)?;
            Ok(SessionView::of(id, w))
        })
        .await
    }

    /// Dismiss the confirmation screen, or abandon the check-out flow
    pub async fn close(&self, id: Uuid) -> AppResult<SessionView> {
        self.with_session(id, |w| {
            match w.step() {
                Step::Confirmation => w.close().map_err(wizard_err)?,
                Step::CheckOut => w.cancel_check_out().map_err(wizard_err)?,
                step => return Err(wizard_err(WizardError::InvalidTransition { step })),
            }
            Ok(SessionView::of(id, w))
        })
        .await
    }

    pub async fn start_check_out(&self, id: Uuid) -> AppResult<SessionView> {
        self.with_session(id, |w| {
            w.start_check_out().map_err(wizard_err)?;
            Ok(SessionView::of(id, w))
        })
        .await
    }

    pub async fn begin_check_out(&self, id: Uuid) -> AppResult<()> {
        self.with_session(id, |w| w.begin_check_out().map_err(wizard_err))
            .await
    }

    pub async fn finish_check_out(&self, id: Uuid, success: bool) -> AppResult<SessionView> {
        self.with_session(id, |w| {
            if success {
                w.check_out_succeeded();
            } else {
                w.check_out_failed();
            }
            Ok(SessionView::of(id, w))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn names(pairs: &[(&str, &str)]) -> Vec<DraftName> {
        pairs
            .iter()
            .map(|(f, l)| DraftName {
                first_name: f.to_string(),
                last_name: l.to_string(),
            })
            .collect()
    }

    fn host() -> Host {
        Host {
            id: 1,
            name: "Per Falk".to_string(),
            department: "Operations".to_string(),
        }
    }

    async fn rewind_last_seen(service: &SessionService, id: Uuid, secs: i64) {
        let mut sessions = service.sessions.write().await;
        if let Some(session) = sessions.get_mut(&id) {
            session.last_seen = Utc::now() - Duration::seconds(secs);
        }
    }

    #[tokio::test]
    async fn full_check_in_flow_through_sessions() {
        let service = SessionService::new(KioskConfig::default());
        let created = service.create().await;
        let id = created.id;
        assert_eq!(created.step, Step::TypeSelection);

        service.select_type(id, VisitorType::Regular).await.unwrap();

        // Invalid submission surfaces flags, keeps the step.
        let view = service
            .submit_visitors(id, names(&[("Anna", "")]), "Acme".to_string())
            .await
            .unwrap();
        assert_eq!(view.step, Step::VisitorInfo);
        assert_eq!(view.field_errors.len(), 1);

        let view = service
            .submit_visitors(id, names(&[("Anna", "Svensson")]), "Acme".to_string())
            .await
            .unwrap();
        assert_eq!(view.step, Step::HostSelection);
        assert!(view.field_errors.is_empty());

        service.select_host(id, host()).await.unwrap();

        let order = service.begin_commit(id).await.unwrap();
        assert_eq!(order.names, vec!["Anna Svensson".to_string()]);

        let view = service.finish_commit(id, true).await.unwrap();
        assert_eq!(view.step, Step::Confirmation);
        assert_eq!(view.countdown, 10);
    }

    #[tokio::test]
    async fn failed_commit_leaves_session_in_terms() {
        let service = SessionService::new(KioskConfig::default());
        let id = service.create().await.id;
        service.select_type(id, VisitorType::Service).await.unwrap();
        service
            .submit_visitors(id, names(&[("Eva", "Lind")]), "FixIt AB".to_string())
            .await
            .unwrap();
        service.select_host(id, host()).await.unwrap();
        service.begin_commit(id).await.unwrap();

        let view = service.finish_commit(id, false).await.unwrap();
        assert_eq!(view.step, Step::Terms);
        assert!(!view.commit_pending);
    }

    #[tokio::test]
    async fn confirmation_auto_dismisses_from_elapsed_time() {
        let service = SessionService::new(KioskConfig::default());
        let id = service.create().await.id;
        service.select_type(id, VisitorType::Regular).await.unwrap();
        service
            .submit_visitors(id, names(&[("Anna", "Svensson")]), "Acme".to_string())
            .await
            .unwrap();
        service.select_host(id, host()).await.unwrap();
        service.begin_commit(id).await.unwrap();
        service.finish_commit(id, true).await.unwrap();

        // Mid-countdown the session is still confirming.
        rewind_last_seen(&service, id, 4).await;
        let view = service.view(id).await.unwrap();
        assert_eq!(view.step, Step::Confirmation);
        assert_eq!(view.countdown, 6);

        // Past the countdown the wizard is back at the start.
        rewind_last_seen(&service, id, 7).await;
        let view = service.view(id).await.unwrap();
        assert_eq!(view.step, Step::TypeSelection);
        assert!(view.drafts.is_empty());
    }

    #[tokio::test]
    async fn idle_session_expires() {
        let service = SessionService::new(KioskConfig {
            session_timeout_secs: 60,
            ..KioskConfig::default()
        });
        let id = service.create().await.id;

        rewind_last_seen(&service, id, 61).await;
        assert!(matches!(
            service.view(id).await,
            Err(AppError::NotFound(_))
        ));
        // The entry is gone, not just rejected.
        assert!(service.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn check_out_flow_resets_on_success() {
        let service = SessionService::new(KioskConfig::default());
        let id = service.create().await.id;

        let view = service.start_check_out(id).await.unwrap();
        assert_eq!(view.step, Step::CheckOut);

        service.begin_check_out(id).await.unwrap();
        let view = service.finish_check_out(id, true).await.unwrap();
        assert_eq!(view.step, Step::TypeSelection);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let service = SessionService::new(KioskConfig::default());
        assert!(matches!(
            service.view(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
