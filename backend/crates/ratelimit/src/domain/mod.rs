//! Domain Layer
//!
//! - Rate-limited subjects (accounts and anonymized clients)
//! - Policy catalog resolving `(policy name, role, plan)` to a concrete policy

pub mod policy;
pub mod subject;
