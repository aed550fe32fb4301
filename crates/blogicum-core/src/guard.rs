//! Ownership check gating every update and delete.
//!
//! A requester who does not own the resource is sent back to a read-only
//! view instead of getting an error page.

use uuid::Uuid;

use crate::navigation::Destination;

/// Outcome of an ownership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResult {
    Allowed,
    DeniedRedirect(Destination),
}

impl AuthorizationResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthorizationResult::Allowed)
    }
}

/// Allow the mutation only when `requester` is `owner`, otherwise redirect to
/// `fallback`.
pub fn authorize(owner: Uuid, requester: Uuid, fallback: Destination) -> AuthorizationResult {
    if owner == requester {
        AuthorizationResult::Allowed
    } else {
        tracing::info!(%owner, %requester, redirect = %fallback, "Mutation denied to non-author");
        AuthorizationResult::DeniedRedirect(fallback)
    }
}
