//! Search and non-streaming ask models

use serde::{Deserialize, Serialize};

/// Default result count for vector search
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
/// Default similarity cut-off for vector search
pub const DEFAULT_MINIMUM_SCORE: f64 = 0.2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Text,
    Vector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(rename = "type")]
    pub search_type: SearchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_sources: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_notes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_score: Option<f64>,
}

impl SearchRequest {
    /// Plain text search over sources and notes
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_type: SearchType::Text,
            limit: None,
            search_sources: Some(true),
            search_notes: Some(true),
            minimum_score: None,
        }
    }

    /// Semantic search over sources and notes
    pub fn vector(query: impl Into<String>, limit: u32, minimum_score: f64) -> Self {
        Self {
            query: query.into(),
            search_type: SearchType::Vector,
            limit: Some(limit),
            search_sources: Some(true),
            search_notes: Some(true),
            minimum_score: Some(minimum_score),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchResultKind {
    Source,
    Note,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
    #[serde(rename = "type")]
    pub kind: SearchResultKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub search_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}
