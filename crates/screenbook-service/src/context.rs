//! Request context carrying the authenticated caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of the authenticated caller.
///
/// Identity and role come from the trusted upstream proxy; this service
/// only distinguishes regular users from operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular authenticated user.
    User,
    /// Operator with override privileges.
    Admin,
}

impl std::str::FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(()),
        }
    }
}

/// Context for the current authenticated request.
///
/// Extracted by the API layer and passed into service methods so that
/// every operation knows *who* is acting and *when* the request arrived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// The user's role as asserted by the identity layer.
    pub role: UserRole,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: Uuid, role: UserRole, request_time: DateTime<Utc>) -> Self {
        Self {
            user_id,
            role,
            request_time,
        }
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("user".parse::<UserRole>(), Ok(UserRole::User));
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert!("manager".parse::<UserRole>().is_err());
    }
}
