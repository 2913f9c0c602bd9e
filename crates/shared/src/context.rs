//! Explicit per-call tenant and user context.

use serde::{Deserialize, Serialize};

use crate::types::{TenantId, UserId};

/// Identifies who is acting and inside which tenant.
///
/// Every repository operation takes this by value or reference; nothing is
/// read from ambient request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestContext {
    /// Tenant that owns every row touched by the call.
    pub tenant_id: TenantId,
    /// User recorded as the creator of any posted rows.
    pub user_id: UserId,
}

impl RequestContext {
    /// Creates a new request context.
    #[must_use]
    pub const fn new(tenant_id: TenantId, user_id: UserId) -> Self {
        Self { tenant_id, user_id }
    }
}
