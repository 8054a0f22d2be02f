//! Identity resolution for incoming requests.
//!
//! The archive itself never authenticates anyone: an external resolver
//! maps request credentials to an opaque user identifier, and the
//! stores use that identifier purely as a partition key.

use crate::error::{CarelogError, Result};
use async_trait::async_trait;

/// Rejects user identifiers that could escape a per-user storage root.
///
/// The stores join the identifier into filesystem paths, so a resolver
/// bug must never be able to smuggle path separators or `..` past
/// them.
///
/// # Errors
///
/// Returns `CarelogError::Unauthorized` for empty identifiers or ones
/// containing `/`, `\` or `..`.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty()
        || user_id.contains('/')
        || user_id.contains('\\')
        || user_id.contains("..")
    {
        return Err(CarelogError::unauthorized(format!(
            "invalid user id '{}'",
            user_id
        )));
    }
    Ok(())
}

/// Maps request credentials to a stable user identifier.
///
/// Implementations may verify tokens, consult an OAuth provider, or
/// return a constant for single-user deployments. The archive only
/// requires that the returned identifier is stable per user.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolves the user identifier for the given credential string.
    ///
    /// # Errors
    ///
    /// Returns `CarelogError::Unauthorized` if the credentials cannot
    /// be resolved to a user.
    async fn resolve(&self, credentials: &str) -> Result<String>;
}

/// Resolver that returns a fixed user identifier for every request.
///
/// Suitable for single-user or demo deployments. Production services
/// should implement [`IdentityResolver`] against their token verifier.
#[derive(Debug, Clone)]
pub struct StaticIdentityResolver {
    user_id: String,
}

impl StaticIdentityResolver {
    /// Creates a resolver that always yields `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

impl Default for StaticIdentityResolver {
    fn default() -> Self {
        Self::new("demo_user")
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, _credentials: &str) -> Result<String> {
        if self.user_id.is_empty() {
            return Err(CarelogError::unauthorized("no user configured"));
        }
        Ok(self.user_id.clone())
    }
}
