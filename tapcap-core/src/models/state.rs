use super::error::CaptureError;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → version-checked → configured → metadata-read → sense-checked
///      → [waiting-for-stop] → waiting-for-play → capturing → finished
/// ```
/// `Aborted` and `Failed` are terminal. The orchestrator polls the shared
/// abort flag before every transition; a set flag short-circuits straight
/// to `Aborted` without starting the next step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    VersionChecked,
    Configured,
    MetadataRead,
    SenseChecked,
    WaitingForStop,
    WaitingForPlay,
    Capturing,
    Finished,
    Aborted,
    Failed(CaptureError),
}

impl SessionPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Aborted | Self::Failed(_))
    }

    /// The error carried by a failed session, if any.
    pub fn failure(&self) -> Option<&CaptureError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_phases() {
        assert!(SessionPhase::Finished.is_terminal());
        assert!(SessionPhase::Aborted.is_terminal());
        assert!(SessionPhase::Failed(CaptureError::UserAbort).is_terminal());
        assert!(!SessionPhase::Capturing.is_terminal());
        assert!(!SessionPhase::Idle.is_terminal());
    }

    #[test]
    fn failure_extraction() {
        let phase = SessionPhase::Failed(CaptureError::InvalidPrecision);
        assert_eq!(phase.failure(), Some(&CaptureError::InvalidPrecision));
        assert_eq!(SessionPhase::Finished.failure(), None);
    }
}
