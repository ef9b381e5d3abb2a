//! Admin authorization, first-admin bootstrap, and the account endpoints
//! that front the identity provider.

pub mod router;
pub mod service;

pub use router::access_router;
pub use service::{AccessControl, AccessError, AdminCheck, AdminGrant, GrantOutcome, ADMIN_PREFIX};
