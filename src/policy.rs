//! Authorization policy: who may act on which owned resource.

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    models::Role,
};

/// Canonical string form of an identifier: lowercase, hyphenated UUID. Returns `None` for
/// anything that is not an identifier.
pub fn canonical_id(raw: &str) -> Option<String> {
    Uuid::parse_str(raw.trim())
        .ok()
        .map(|id| id.hyphenated().to_string())
}

/// True iff the claim's subject and the owner id denote the same identifier. Both sides are
/// compared in canonical string form, so `{UUID}`, simple and uppercase spellings of the
/// same id match.
pub fn is_owner(user: &AuthUser, owner_id: &Uuid) -> bool {
    canonical_id(&user.id).is_some_and(|subject| subject == owner_id.hyphenated().to_string())
}

/// Rejects callers whose token was issued to a different kind of party.
pub fn ensure_role(user: &AuthUser, role: Role, message: &str) -> ApiResult<()> {
    if user.role == role {
        Ok(())
    } else {
        tracing::warn!(subject = %user.id, expected = role.as_str(), "role mismatch");
        Err(ApiError::Forbidden(message.to_string()))
    }
}

/// Owner-only rule: the caller must hold `role` and be the owning entity itself.
pub fn ensure_owner(user: &AuthUser, role: Role, owner_id: &Uuid, message: &str) -> ApiResult<()> {
    ensure_role(user, role, message)?;
    if is_owner(user, owner_id) {
        Ok(())
    } else {
        tracing::warn!(subject = %user.id, owner = %owner_id, "ownership check failed");
        Err(ApiError::Forbidden(message.to_string()))
    }
}
