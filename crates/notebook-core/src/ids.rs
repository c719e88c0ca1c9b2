//! Record ID normalization
//!
//! The backend addresses records as `<table>:<key>`. Callers (host pages,
//! URL parameters, CLI users) usually only know the bare key, so every ID is
//! normalized before it goes on the wire.

use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Backend tables that are addressed by prefixed record IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Notebook,
    Source,
    Note,
    ChatSession,
    Episode,
    Insight,
}

impl RecordKind {
    const ALL: [RecordKind; 6] = [
        RecordKind::Notebook,
        RecordKind::Source,
        RecordKind::Note,
        RecordKind::ChatSession,
        RecordKind::Episode,
        RecordKind::Insight,
    ];

    /// Table name used as the ID prefix
    pub fn table(self) -> &'static str {
        match self {
            RecordKind::Notebook => "notebook",
            RecordKind::Source => "source",
            RecordKind::Note => "note",
            RecordKind::ChatSession => "chat_session",
            RecordKind::Episode => "episode",
            RecordKind::Insight => "source_insight",
        }
    }

    /// Ensure `id` carries this table's prefix.
    ///
    /// Empty IDs are returned unchanged so that "no ID" stays recognisable.
    pub fn normalize(self, id: &str) -> String {
        if id.is_empty() || self.has_prefix(id) {
            id.to_string()
        } else {
            format!("{}:{}", self.table(), id)
        }
    }

    /// Like [`normalize`](Self::normalize), but rejects IDs that already
    /// carry the prefix of another known table.
    pub fn checked(self, id: &str) -> ModelResult<String> {
        if let Some(other) = Self::ALL
            .iter()
            .find(|k| **k != self && k.has_prefix(id))
        {
            return Err(ModelError::WrongRecordKind {
                expected: self.table(),
                actual: format!("{} ({})", id, other),
            });
        }
        Ok(self.normalize(id))
    }

    fn has_prefix(self, id: &str) -> bool {
        id.strip_prefix(self.table())
            .is_some_and(|rest| rest.starts_with(':'))
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}
