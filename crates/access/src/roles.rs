use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crewgate_core::AccessError;

/// The three resolvable roles, in descending order of power.
///
/// Exactly one of these survives resolution for any authenticated principal.
/// There is deliberately no default and no "member of several" form; callers
/// that need a role must name one explicitly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform-wide operator. Scope is the whole platform, never one workspace.
    PlatformOperator,
    /// Administrator of exactly one workspace.
    WorkspaceAdmin,
    /// Invited employee of exactly one workspace.
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PlatformOperator => "platform_operator",
            Role::WorkspaceAdmin => "workspace_admin",
            Role::Staff => "staff",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "platform_operator" => Ok(Role::PlatformOperator),
            "workspace_admin" => Ok(Role::WorkspaceAdmin),
            "staff" => Ok(Role::Staff),
            other => Err(AccessError::validation(format!("unknown role: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrips_through_str() {
        for role in [Role::PlatformOperator, Role::WorkspaceAdmin, Role::Staff] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn role_parse_is_case_sensitive() {
        assert!("Staff".parse::<Role>().is_err());
        assert!("PLATFORM_OPERATOR".parse::<Role>().is_err());
    }

    #[test]
    fn role_parse_rejects_unknown() {
        let err = "owner".parse::<Role>().unwrap_err();
        assert!(matches!(err, AccessError::Validation(_)));
    }

    #[test]
    fn role_serializes_as_snake_case() {
        let json = serde_json::to_string(&Role::WorkspaceAdmin).unwrap();
        assert_eq!(json, "\"workspace_admin\"");
    }
}
