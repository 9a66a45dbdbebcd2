//! Check-in wizard state machine
//!
//! Drives the kiosk flow: type selection, visitor info, host selection,
//! terms, confirmation, plus the parallel check-out flow. The machine is
//! pure and synchronous; backend commits happen outside it and their
//! outcome is reported back via [`Wizard::commit_succeeded`] /
//! [`Wizard::commit_failed`]. No transition is taken on a failed commit.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{CheckInOrder, Host, VisitorType};

/// Wizard steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    TypeSelection,
    VisitorInfo,
    HostSelection,
    Terms,
    Confirmation,
    CheckOut,
}

/// Form field a validation error applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FirstName,
    LastName,
    Company,
}

/// Field-level validation error flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// Index of the visitor the flag applies to; `None` for the company field
    pub visitor: Option<usize>,
    pub field: Field,
}

/// In-memory draft of one visitor, discarded on commit or cancellation
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VisitorDraft {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

impl VisitorDraft {
    fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Name pair submitted from the visitor-info form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftName {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardError {
    #[error("action not valid in step {step:?}")]
    InvalidTransition { step: Step },

    #[error("a commit is already in flight")]
    CommitInFlight,

    #[error("visitor count must be between 1 and {max}")]
    BadVisitorCount { max: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct WizardOptions {
    /// Maximum visitors per check-in
    pub max_visitors: usize,
    /// Confirmation countdown, one tick per second
    pub countdown_ticks: u8,
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self {
            max_visitors: 5,
            countdown_ticks: 10,
        }
    }
}

/// The wizard context: current step plus all draft state.
///
/// One instance per kiosk session. Every transition is an explicit method
/// so callers cannot bypass validation or advance past a failed commit.
#[derive(Debug, Clone)]
pub struct Wizard {
    options: WizardOptions,
    step: Step,
    visitor_type: Option<VisitorType>,
    drafts: Vec<VisitorDraft>,
    company: String,
    host: Option<Host>,
    field_errors: Vec<FieldError>,
    countdown: u8,
    commit_pending: bool,
}

impl Wizard {
    pub fn new(options: WizardOptions) -> Self {
        Self {
            options,
            step: Step::TypeSelection,
            visitor_type: None,
            drafts: Vec::new(),
            company: String::new(),
            host: None,
            field_errors: Vec::new(),
            countdown: 0,
            commit_pending: false,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn visitor_type(&self) -> Option<VisitorType> {
        self.visitor_type
    }

    pub fn drafts(&self) -> &[VisitorDraft] {
        &self.drafts
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn host(&self) -> Option<&Host> {
        self.host.as_ref()
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn countdown(&self) -> u8 {
        self.countdown
    }

    pub fn commit_pending(&self) -> bool {
        self.commit_pending
    }

    /// Clear all draft state and return to the first step
    fn reset(&mut self) {
        self.step = Step::TypeSelection;
        self.visitor_type = None;
        self.drafts.clear();
        self.company.clear();
        self.host = None;
        self.field_errors.clear();
        self.countdown = 0;
        self.commit_pending = false;
    }

    /// `type-selection` -> `visitor-info`
    pub fn select_type(&mut self, visitor_type: VisitorType) -> Result<(), WizardError> {
        if self.step != Step::TypeSelection {
            return Err(WizardError::InvalidTransition { step: self.step });
        }
        self.visitor_type = Some(visitor_type);
        self.step = Step::VisitorInfo;
        Ok(())
    }

    /// `visitor-info` -> `host-selection` when every first/last name and the
    /// company are non-blank. On validation failure the wizard stays put,
    /// keeps the submitted values, and flags the offending fields; returns
    /// whether the step advanced.
    pub fn submit_visitor_info(
        &mut self,
        names: Vec<DraftName>,
        company: String,
    ) -> Result<bool, WizardError> {
        if self.step != Step::VisitorInfo {
            return Err(WizardError::InvalidTransition { step: self.step });
        }
        if names.is_empty() || names.len() > self.options.max_visitors {
            return Err(WizardError::BadVisitorCount {
                max: self.options.max_visitors,
            });
        }

        self.drafts = names
            .into_iter()
            .map(|n| VisitorDraft {
                id: Uuid::new_v4(),
                first_name: n.first_name,
                last_name: n.last_name,
            })
            .collect();
        self.company = company;

        self.field_errors.clear();
        for (i, draft) in self.drafts.iter().enumerate() {
            if draft.first_name.trim().is_empty() {
                self.field_errors.push(FieldError {
                    visitor: Some(i),
                    field: Field::FirstName,
                });
            }
            if draft.last_name.trim().is_empty() {
                self.field_errors.push(FieldError {
                    visitor: Some(i),
                    field: Field::LastName,
                });
            }
        }
        if self.company.trim().is_empty() {
            self.field_errors.push(FieldError {
                visitor: None,
                field: Field::Company,
            });
        }

        if self.field_errors.is_empty() {
            self.step = Step::HostSelection;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// `host-selection` -> `terms`
    pub fn select_host(&mut self, host: Host) -> Result<(), WizardError> {
        if self.step != Step::HostSelection {
            return Err(WizardError::InvalidTransition { step: self.step });
        }
        self.host = Some(host);
        self.step = Step::Terms;
        Ok(())
    }

    /// Terms accepted: produce the commit payload, one entry per drafted
    /// visitor in list order. The wizard stays in `terms` with the submit
    /// control disabled until the commit outcome is reported back.
    pub fn accept_terms(&mut self) -> Result<CheckInOrder, WizardError> {
        if self.step != Step::Terms {
            return Err(WizardError::InvalidTransition { step: self.step });
        }
        if self.commit_pending {
            return Err(WizardError::CommitInFlight);
        }
        let host = self
            .host
            .as_ref()
            .ok_or(WizardError::InvalidTransition { step: self.step })?;
        let visitor_type = self
            .visitor_type
            .ok_or(WizardError::InvalidTransition { step: self.step })?;

        self.commit_pending = true;
        Ok(CheckInOrder {
            names: self.drafts.iter().map(VisitorDraft::full_name).collect(),
            company: self.company.trim().to_string(),
            host_name: host.name.clone(),
            is_service_personnel: visitor_type.is_service_personnel(),
        })
    }

    /// Commit landed: `terms` -> `confirmation`, countdown armed
    pub fn commit_succeeded(&mut self) -> Result<(), WizardError> {
        if self.step != Step::Terms || !self.commit_pending {
            return Err(WizardError::InvalidTransition { step: self.step });
        }
        self.commit_pending = false;
        self.countdown = self.options.countdown_ticks;
        self.step = Step::Confirmation;
        Ok(())
    }

    /// Commit failed: stay in `terms`, re-enable the submit control
    pub fn commit_failed(&mut self) {
        self.commit_pending = false;
    }

    /// One countdown second elapsed on the confirmation screen.
    /// Returns true when the wizard auto-dismissed back to `type-selection`.
    pub fn tick(&mut self) -> bool {
        if self.step != Step::Confirmation {
            return false;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.reset();
            true
        } else {
            false
        }
    }

    /// Explicit dismissal of the confirmation screen
    pub fn close(&mut self) -> Result<(), WizardError> {
        if self.step != Step::Confirmation {
            return Err(WizardError::InvalidTransition { step: self.step });
        }
        self.reset();
        Ok(())
    }

    /// Backward navigation. From `visitor-info` this clears all draft
    /// state and returns to `type-selection`.
    pub fn back(&mut self) -> Result<(), WizardError> {
        match self.step {
            Step::VisitorInfo => {
                self.reset();
                Ok(())
            }
            Step::HostSelection => {
                self.step = Step::VisitorInfo;
                Ok(())
            }
            Step::Terms => {
                self.step = Step::HostSelection;
                Ok(())
            }
            _ => Err(WizardError::InvalidTransition { step: self.step }),
        }
    }

    /// Enter the check-out flow, bypassing the check-in steps
    pub fn start_check_out(&mut self) -> Result<(), WizardError> {
        if self.step != Step::TypeSelection {
            return Err(WizardError::InvalidTransition { step: self.step });
        }
        self.step = Step::CheckOut;
        Ok(())
    }

    /// Abandon check-out and return to `type-selection`
    pub fn cancel_check_out(&mut self) -> Result<(), WizardError> {
        if self.step != Step::CheckOut {
            return Err(WizardError::InvalidTransition { step: self.step });
        }
        self.reset();
        Ok(())
    }

    /// A check-out record was selected and the commit is being issued
    pub fn begin_check_out(&mut self) -> Result<(), WizardError> {
        if self.step != Step::CheckOut {
            return Err(WizardError::InvalidTransition { step: self.step });
        }
        if self.commit_pending {
            return Err(WizardError::CommitInFlight);
        }
        self.commit_pending = true;
        Ok(())
    }

    /// Check-out commit landed: back to `type-selection`
    pub fn check_out_succeeded(&mut self) {
        self.reset();
    }

    /// Check-out commit failed: stay in `check-out`
    pub fn check_out_failed(&mut self) {
        self.commit_pending = false;
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new(WizardOptions::default())
    }
}
