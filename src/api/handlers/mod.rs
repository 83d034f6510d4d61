//! HTTP request handlers, grouped by resource

pub mod ideas;
pub mod sources;
pub mod system;
pub mod users;

use crate::auth::Claims;
use crate::core::error::{Error, Result};

/// Reject requests that touch a per-user resource belonging to someone else
pub(crate) fn authorize_self(claims: &Claims, user_id: &str) -> Result<()> {
    if claims.user_id != user_id {
        return Err(Error::forbidden(
            "You are not authorized to view this resource",
        ));
    }
    Ok(())
}
