use std::str::FromStr;

use super::domain::PermitStatus;

/// Which status changes an admin review may make.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any status may be set from any status.
    #[default]
    Unrestricted,
    /// PENDING -> VERIFIED | REJECTED, VERIFIED -> APPROVED | REJECTED.
    /// Re-applying the current status is always allowed.
    Guarded,
}

impl TransitionPolicy {
    pub fn allows(self, from: PermitStatus, to: PermitStatus) -> bool {
        use PermitStatus::*;

        match self {
            TransitionPolicy::Unrestricted => true,
            TransitionPolicy::Guarded => {
                from == to
                    || matches!(
                        (from, to),
                        (Pending, Verified)
                            | (Pending, Rejected)
                            | (Verified, Approved)
                            | (Verified, Rejected)
                    )
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown transition policy '{0}' (expected 'unrestricted' or 'guarded')")]
pub struct UnknownTransitionPolicy(String);

impl FromStr for TransitionPolicy {
    type Err = UnknownTransitionPolicy;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "unrestricted" => Ok(TransitionPolicy::Unrestricted),
            "guarded" => Ok(TransitionPolicy::Guarded),
            _ => Err(UnknownTransitionPolicy(raw.to_string())),
        }
    }
}
