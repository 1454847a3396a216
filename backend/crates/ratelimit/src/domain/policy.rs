//! Policy Catalog
//!
//! Named policies, each with a quota per plan tier plus a stricter
//! anonymous quota, sharing one window length.

use kernel::identity::PlanTier;
use platform::rate_limit::{PolicyError, RateLimitPolicy};
use std::collections::HashMap;

use crate::domain::subject::Subject;

/// Requests allowed per window, by caller class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanQuotas {
    pub anonymous: u32,
    pub free: u32,
    pub pro: u32,
    pub business: u32,
    pub enterprise: u32,
}

/// One named policy resolved for every caller class
#[derive(Debug, Clone)]
pub struct PolicySet {
    name: String,
    anonymous: RateLimitPolicy,
    free: RateLimitPolicy,
    pro: RateLimitPolicy,
    business: RateLimitPolicy,
    enterprise: RateLimitPolicy,
}

impl PolicySet {
    pub fn new(
        name: impl Into<String>,
        window_seconds: u64,
        quotas: PlanQuotas,
    ) -> Result<Self, PolicyError> {
        let name = name.into();
        let policy = |max| RateLimitPolicy::new(name.clone(), max, window_seconds);
        Ok(Self {
            anonymous: policy(quotas.anonymous)?,
            free: policy(quotas.free)?,
            pro: policy(quotas.pro)?,
            business: policy(quotas.business)?,
            enterprise: policy(quotas.enterprise)?,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn for_plan(&self, plan: PlanTier) -> &RateLimitPolicy {
        match plan {
            PlanTier::Free => &self.free,
            PlanTier::Pro => &self.pro,
            PlanTier::Business => &self.business,
            PlanTier::Enterprise => &self.enterprise,
        }
    }

    /// Admins get the top-tier quota whatever their plan.
    pub fn resolve(&self, subject: &Subject) -> &RateLimitPolicy {
        match subject {
            Subject::Anonymous { .. } => &self.anonymous,
            Subject::Account { role, .. } if role.is_admin() => &self.enterprise,
            Subject::Account { plan_tier, .. } => self.for_plan(*plan_tier),
        }
    }
}

/// Every policy the route layer can name
#[derive(Debug, Clone)]
pub struct PolicyCatalog {
    fallback: PolicySet,
    sets: HashMap<String, PolicySet>,
}

impl PolicyCatalog {
    /// General API traffic
    pub const API: &'static str = "api";
    /// Mutating endpoints (feedback submission, votes, webhook tests)
    pub const WRITE: &'static str = "write";

    const WINDOW_SECONDS: u64 = 60;

    /// Catalog whose unknown names resolve to `fallback`
    pub fn new(fallback: PolicySet) -> Self {
        Self {
            fallback,
            sets: HashMap::new(),
        }
    }

    pub fn with_set(mut self, set: PolicySet) -> Self {
        if set.name() == self.fallback.name() {
            self.fallback = set;
        } else {
            self.sets.insert(set.name().to_string(), set);
        }
        self
    }

    /// Default `api` and `write` policies on a 60s window
    pub fn standard() -> Result<Self, PolicyError> {
        let api = PolicySet::new(
            Self::API,
            Self::WINDOW_SECONDS,
            PlanQuotas {
                anonymous: 30,
                free: 120,
                pro: 600,
                business: 1500,
                enterprise: 5000,
            },
        )?;
        let write = PolicySet::new(
            Self::WRITE,
            Self::WINDOW_SECONDS,
            PlanQuotas {
                anonymous: 5,
                free: 30,
                pro: 120,
                business: 300,
                enterprise: 1000,
            },
        )?;
        Ok(Self::new(api).with_set(write))
    }

    pub fn set(&self, policy_name: &str) -> &PolicySet {
        self.sets.get(policy_name).unwrap_or(&self.fallback)
    }

    pub fn resolve(&self, policy_name: &str, subject: &Subject) -> &RateLimitPolicy {
        self.set(policy_name).resolve(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::identity::Role;

    fn account(role: Role, plan_tier: PlanTier) -> Subject {
        Subject::Account {
            subject_id: "u1".into(),
            role,
            plan_tier,
        }
    }

    #[test]
    fn test_standard_catalog_quotas() {
        let catalog = PolicyCatalog::standard().unwrap();
        let anon = Subject::Anonymous {
            client_id: "anon:abc".into(),
        };

        assert_eq!(catalog.resolve("api", &anon).max_requests(), 30);
        assert_eq!(
            catalog
                .resolve("api", &account(Role::Member, PlanTier::Free))
                .max_requests(),
            120
        );
        assert_eq!(
            catalog
                .resolve("write", &account(Role::Member, PlanTier::Pro))
                .max_requests(),
            120
        );
        assert_eq!(catalog.resolve("write", &anon).window_seconds(), 60);
    }

    #[test]
    fn test_admin_gets_enterprise_quota() {
        let catalog = PolicyCatalog::standard().unwrap();
        let admin = account(Role::Admin, PlanTier::Free);
        assert_eq!(catalog.resolve("api", &admin).max_requests(), 5000);
    }

    #[test]
    fn test_unknown_policy_falls_back_to_api() {
        let catalog = PolicyCatalog::standard().unwrap();
        let policy = catalog.resolve("surveys", &account(Role::Member, PlanTier::Business));
        assert_eq!(policy.name(), "api");
        assert_eq!(policy.max_requests(), 1500);
    }

    #[test]
    fn test_invalid_quota_fails_fast() {
        let err = PolicySet::new(
            "broken",
            60,
            PlanQuotas {
                anonymous: 0,
                free: 1,
                pro: 1,
                business: 1,
                enterprise: 1,
            },
        )
        .unwrap_err();
        assert_eq!(err, PolicyError::ZeroMaxRequests("broken".into()));
    }

    #[test]
    fn test_with_set_replaces_fallback() {
        let quotas = PlanQuotas {
            anonymous: 1,
            free: 2,
            pro: 3,
            business: 4,
            enterprise: 5,
        };
        let catalog = PolicyCatalog::standard()
            .unwrap()
            .with_set(PolicySet::new("api", 10, quotas).unwrap());
        let policy = catalog.resolve("anything", &account(Role::Member, PlanTier::Pro));
        assert_eq!(policy.max_requests(), 3);
        assert_eq!(policy.window_seconds(), 10);
    }
}
