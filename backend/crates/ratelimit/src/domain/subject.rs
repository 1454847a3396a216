//! Rate-limited subject

use kernel::identity::{Identity, PlanTier, Role};
use platform::client::anonymous_client_id;
use std::net::IpAddr;

/// Who a request is counted against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// Authenticated caller, counted per account
    Account {
        subject_id: String,
        role: Role,
        plan_tier: PlanTier,
    },
    /// Unauthenticated caller, counted per anonymized client id
    Anonymous { client_id: String },
}

impl Subject {
    pub fn from_identity(identity: &Identity) -> Self {
        Subject::Account {
            subject_id: identity.subject_id.clone(),
            role: identity.role,
            plan_tier: identity.plan_tier,
        }
    }

    pub fn anonymous(ip: Option<IpAddr>, salt: &[u8]) -> Self {
        Subject::Anonymous {
            client_id: anonymous_client_id(ip, salt),
        }
    }

    /// Key segment used in counter keys
    pub fn key(&self) -> String {
        match self {
            Subject::Account { subject_id, .. } => format!("user:{subject_id}"),
            Subject::Anonymous { client_id } => client_id.clone(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Subject::Anonymous { .. })
    }
}
