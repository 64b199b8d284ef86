//! The per-orchestrator attempt phase machine.

use crate::error::MintgateError;

/// Phase of the current action attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttemptPhase {
    #[default]
    Idle,
    /// Snapshot-level entry guards are being evaluated.
    Validating,
    /// The read-only pre-flight (and for mints, the submission-time re-read)
    /// is running.
    DryRun,
    /// The transaction sits in the user's wallet awaiting their signature.
    AwaitingSignature,
    /// The transaction was submitted and awaits one confirmation.
    AwaitingConfirmation,
    Succeeded,
    Failed,
}

impl AttemptPhase {
    /// Whether an attempt in this phase still holds the orchestrator's
    /// exclusivity.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Validating | Self::DryRun | Self::AwaitingSignature | Self::AwaitingConfirmation
        )
    }
}

/// One check-in or mint attempt. At most one non-idle attempt exists per
/// orchestrator per session; exclusivity is enforced by the phase check in
/// [`ActionAttempt::begin`], not a lock primitive, since the runtime is
/// cooperative.
#[derive(Debug, Clone, Default)]
pub struct ActionAttempt {
    pub phase: AttemptPhase,
    pub error: Option<MintgateError>,
}

impl ActionAttempt {
    /// Claims the orchestrator for a new attempt, rejecting if one is
    /// already in flight. A terminal attempt (succeeded/failed) is replaced.
    pub fn begin(&mut self) -> Result<(), MintgateError> {
        if self.phase.is_in_flight() {
            return Err(MintgateError::AttemptInFlight);
        }
        self.phase = AttemptPhase::Validating;
        self.error = None;
        Ok(())
    }

    pub fn advance(&mut self, phase: AttemptPhase) {
        self.phase = phase;
    }

    pub fn succeed(&mut self) {
        self.phase = AttemptPhase::Succeeded;
        self.error = None;
    }

    pub fn fail(&mut self, error: MintgateError) {
        self.phase = AttemptPhase::Failed;
        self.error = Some(error);
    }
}
