//! Conversation log entries

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Fixed ID of the searching indicator; at most one exists per log
pub const SEARCHING_INDICATOR_ID: &str = "searching";

/// Placeholder text shown while the backend searches
pub const SEARCHING_INDICATOR_TEXT: &str = "Searching through your materials...";

/// Who (or what) a log entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Question typed by the user
    Human,
    /// Final answer from the backend
    Ai,
    /// Search plan announced by the backend before answering
    Strategy,
    /// Transient "searching..." placeholder
    Searching,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Ai => "ai",
            Role::Strategy => "strategy",
            Role::Searching => "searching",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(Role::Human),
            "ai" => Ok(Role::Ai),
            "strategy" => Ok(Role::Strategy),
            "searching" => Ok(Role::Searching),
            other => Err(ModelError::UnknownRole(other.to_string())),
        }
    }
}

/// One search the backend plans to run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStep {
    /// Query text
    #[serde(default)]
    pub search: String,
    /// What the backend intends to extract from the results
    #[serde(default)]
    pub instructions: String,
}

/// Search plan attached to strategy messages and the answer they precede
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyPlan {
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub searches: Vec<SearchStep>,
}

impl StrategyPlan {
    /// One-line summary, e.g. `Searching: rust ownership, borrow checker`
    pub fn summary(&self) -> String {
        let queries: Vec<&str> = self.searches.iter().map(|s| s.search.as_str()).collect();
        format!("Searching: {}", queries.join(", "))
    }
}

/// One entry in the visible conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque unique identifier
    pub id: String,
    /// Entry kind
    #[serde(rename = "type")]
    pub role: Role,
    /// Text body (may be empty)
    pub content: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Search plan, for strategy entries and the answer that follows them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyPlan>,
}

impl Message {
    /// Create an entry with a fresh UUID
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            strategy: None,
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    /// Final answer, carrying the plan that led to it (if any)
    pub fn ai(content: impl Into<String>, strategy: Option<StrategyPlan>) -> Self {
        Self {
            strategy,
            ..Self::new(Role::Ai, content)
        }
    }

    /// Strategy entry summarising the planned searches
    pub fn strategy(plan: StrategyPlan) -> Self {
        Self {
            content: plan.summary(),
            strategy: Some(plan),
            ..Self::new(Role::Strategy, String::new())
        }
    }

    /// The transient searching placeholder
    pub fn searching() -> Self {
        Self {
            id: SEARCHING_INDICATOR_ID.to_string(),
            ..Self::new(Role::Searching, SEARCHING_INDICATOR_TEXT)
        }
    }

    pub fn is_indicator(&self) -> bool {
        self.role == Role::Searching
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(queries: &[&str]) -> StrategyPlan {
        StrategyPlan {
            reasoning: "because".into(),
            searches: queries
                .iter()
                .map(|q| SearchStep {
                    search: q.to_string(),
                    instructions: "i".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_strategy_summary_lists_queries() {
        let msg = Message::strategy(plan(&["a", "b"]));
        assert_eq!(msg.role, Role::Strategy);
        assert_eq!(msg.content, "Searching: a, b");
        assert_eq!(msg.strategy.unwrap().searches.len(), 2);
    }

    #[test]
    fn test_searching_indicator_has_fixed_id() {
        let a = Message::searching();
        let b = Message::searching();
        assert_eq!(a.id, SEARCHING_INDICATOR_ID);
        assert_eq!(a.id, b.id);
        assert!(a.is_indicator());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Message::human("q");
        let b = Message::human("q");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_role_serialization() {
        let msg = Message::ai("answer", None);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "ai");
        assert!(json.get("strategy").is_none());
        assert_eq!("searching".parse::<Role>().unwrap(), Role::Searching);
        assert!("bot".parse::<Role>().is_err());
    }

    #[test]
    fn test_plan_fields_default_when_missing() {
        let plan: StrategyPlan = serde_json::from_str(r#"{"searches":[{"search":"x"}]}"#).unwrap();
        assert_eq!(plan.reasoning, "");
        assert_eq!(plan.searches[0].instructions, "");
    }
}
