// src/wizard.rs
//! Linear onboarding wizard for one dashboard visit.

use crate::profile_store::StructuredProfileStore;

/// Fixed step sequence. Order matters; navigation is bounded at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Upload,
    Profile,
    Story,
    Services,
    Budget,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Upload,
        WizardStep::Profile,
        WizardStep::Story,
        WizardStep::Services,
        WizardStep::Budget,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Upload => "Upload CV",
            WizardStep::Profile => "Your Name",
            WizardStep::Story => "Your Story",
            WizardStep::Services => "Services",
            WizardStep::Budget => "Budget",
        }
    }
}

/// Per-step field values. They survive back/forward navigation within one
/// visit and are dropped with the controller.
#[derive(Debug, Default, Clone)]
pub struct WizardFields {
    pub full_name: String,
    pub story: String,
    pub services: String,
    pub budget: String,
}

/// Gate consulted when leaving the upload step.
pub trait AdvanceGate {
    fn next_ready(&self) -> bool;
}

impl AdvanceGate for StructuredProfileStore {
    fn next_ready(&self) -> bool {
        StructuredProfileStore::next_ready(self)
    }
}

/// Gate that always allows advancing. Used when no upload pipeline is
/// active for the visit.
pub struct AlwaysReady;

impl AdvanceGate for AlwaysReady {
    fn next_ready(&self) -> bool {
        true
    }
}

pub struct WizardController {
    step_index: usize,
    pub fields: WizardFields,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardController {
    pub fn new() -> Self {
        Self {
            step_index: 0,
            fields: WizardFields::default(),
        }
    }

    pub fn current_step(&self) -> WizardStep {
        WizardStep::ALL[self.step_index]
    }

    /// 1-based position for display next to [`WizardStep::ALL`].
    pub fn step_number(&self) -> usize {
        self.step_index + 1
    }

    pub fn is_first(&self) -> bool {
        self.step_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.step_index == WizardStep::ALL.len() - 1
    }

    /// Move forward one step. No-op on the last step; leaving the upload
    /// step additionally requires the gate to report readiness. Returns
    /// whether the step changed.
    pub fn advance(&mut self, gate: &dyn AdvanceGate) -> bool {
        if self.is_last() {
            return false;
        }
        if self.current_step() == WizardStep::Upload && !gate.next_ready() {
            return false;
        }
        self.step_index += 1;
        true
    }

    /// Move back one step. No-op on the first step. Returns whether the
    /// step changed.
    pub fn retreat(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.step_index -= 1;
        true
    }
}
