// Authorization Port
//
// Authentication lives outside the engine. The engine only trusts the
// two booleans handed back for the caller's credential.

use crate::error::{AppError, Result};
use std::collections::HashSet;

/// What the caller is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperatorIdentity {
    pub is_operator: bool,
    pub is_elevated: bool,
}

impl OperatorIdentity {
    /// Anonymous viewer: read-only
    pub const VIEWER: Self = Self {
        is_operator: false,
        is_elevated: false,
    };

    pub const OPERATOR: Self = Self {
        is_operator: true,
        is_elevated: false,
    };

    pub const ELEVATED: Self = Self {
        is_operator: true,
        is_elevated: true,
    };

    pub fn require_operator(&self) -> Result<()> {
        if self.is_operator || self.is_elevated {
            Ok(())
        } else {
            Err(AppError::Unauthorized("operator role required".to_string()))
        }
    }

    pub fn require_elevated(&self) -> Result<()> {
        if self.is_elevated {
            Ok(())
        } else {
            Err(AppError::Unauthorized("elevated role required".to_string()))
        }
    }
}

/// Resolves a caller credential into an identity
pub trait Authorizer: Send + Sync {
    fn identify(&self, credential: Option<&str>) -> OperatorIdentity;
}

/// Fixed sets of bearer tokens; an admin token also grants operator rights
pub struct StaticTokenAuthorizer {
    operator_tokens: HashSet<String>,
    admin_tokens: HashSet<String>,
}

impl StaticTokenAuthorizer {
    pub fn new(
        operator_tokens: impl IntoIterator<Item = String>,
        admin_tokens: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            operator_tokens: token_set(operator_tokens),
            admin_tokens: token_set(admin_tokens),
        }
    }
}

impl Authorizer for StaticTokenAuthorizer {
    fn identify(&self, credential: Option<&str>) -> OperatorIdentity {
        match credential.map(str::trim) {
            Some(token) if self.admin_tokens.contains(token) => OperatorIdentity::ELEVATED,
            Some(token) if self.operator_tokens.contains(token) => OperatorIdentity::OPERATOR,
            _ => OperatorIdentity::VIEWER,
        }
    }
}

fn token_set(tokens: impl IntoIterator<Item = String>) -> HashSet<String> {
    tokens
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Grants every caller elevated rights (local development only)
pub struct AllowAllAuthorizer;

impl Authorizer for AllowAllAuthorizer {
    fn identify(&self, _credential: Option<&str>) -> OperatorIdentity {
        OperatorIdentity::ELEVATED
    }
}
