//! Approval evaluation over session status responses
//!
//! Pure functions: the gateway response goes in, a pass/fail decision and
//! the user-facing confirmation code come out. Which payment attempt is
//! authoritative is a named, overridable policy.

use crate::payments::types::{PaymentAttempt, SessionInfo};

const APPROVED: &str = "APPROVED";

/// Which attempt in `SessionInfo.payment` decides the outcome.
///
/// `FirstAttempt` mirrors the storefront's historical behavior: only
/// `payment[0]` counts, so a session the gateway records as
/// failed-then-retried-successfully does not approve. The gateway does not
/// document the ordering of the list; `AnyApproved` is the escape hatch if
/// a deployment needs retries honored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApprovalPolicy {
    #[default]
    FirstAttempt,
    AnyApproved,
}

impl ApprovalPolicy {
    fn select<'a>(&self, attempts: &'a [PaymentAttempt]) -> Option<&'a PaymentAttempt> {
        match self {
            ApprovalPolicy::FirstAttempt => attempts.first(),
            ApprovalPolicy::AnyApproved => attempts
                .iter()
                .find(|attempt| attempt.status.status == APPROVED)
                .or_else(|| attempts.first()),
        }
    }
}

/// True iff the session status is APPROVED and the policy-selected payment
/// attempt is itself APPROVED.
pub fn is_approved(info: &SessionInfo, policy: ApprovalPolicy) -> bool {
    if info.status.status != APPROVED {
        return false;
    }
    info.payment
        .as_deref()
        .and_then(|attempts| policy.select(attempts))
        .map(|attempt| attempt.status.status == APPROVED)
        .unwrap_or(false)
}

/// The gateway-assigned authorization code of the approved attempt, used as
/// the buyer-facing confirmation number. `None` whenever the session is not
/// approved.
pub fn payment_reference(info: &SessionInfo, policy: ApprovalPolicy) -> Option<&str> {
    if !is_approved(info, policy) {
        return None;
    }
    info.payment
        .as_deref()
        .and_then(|attempts| policy.select(attempts))
        .and_then(|attempt| attempt.authorization.as_deref())
}
