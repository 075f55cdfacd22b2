use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workflow stage tag on a submission. Advisory only: the ledger does not
/// enforce A -> B -> C ordering, it just versions whatever arrives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A — architect handing over drawings
    Drafter,
    /// B — engineer auditing the drawings
    Reviewer,
    /// C — cost engineer producing the BOQ
    CostEngineer,
    /// D — scope of work provider
    ScopeProvider,
}

impl Role {
    /// Single-letter tag as stored in the ledger.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Role::Drafter => "A",
            Role::Reviewer => "B",
            Role::CostEngineer => "C",
            Role::ScopeProvider => "D",
        }
    }

    /// Accepts both the letter tags and the long names.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "a" | "drafter" | "architect" => Some(Role::Drafter),
            "b" | "reviewer" | "engineer" => Some(Role::Reviewer),
            "c" | "cost_engineer" | "cost" => Some(Role::CostEngineer),
            "d" | "scope_provider" | "scope" => Some(Role::ScopeProvider),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// One versioned role-handoff record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub project_id: Uuid,
    pub role: Role,
    pub filename: String,
    pub metadata: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// Response DTO for submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub role: Role,
    pub filename: String,
    pub metadata: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        Self {
            id: s.id,
            project_id: s.project_id,
            role: s.role,
            filename: s.filename,
            metadata: s.metadata,
            version: s.version,
            created_at: s.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tags_round_trip() {
        for role in [
            Role::Drafter,
            Role::Reviewer,
            Role::CostEngineer,
            Role::ScopeProvider,
        ] {
            assert_eq!(Role::parse(role.as_tag()), Some(role));
        }
    }

    #[test]
    fn role_parse_accepts_long_names() {
        assert_eq!(Role::parse("architect"), Some(Role::Drafter));
        assert_eq!(Role::parse("COST"), Some(Role::CostEngineer));
        assert_eq!(Role::parse("x"), None);
    }
}
