//! Identifier generation for tasks, workspaces and templates
//!
//! Generated ids are `{millis}-{5-char-hash}`: the decimal millisecond
//! timestamp followed by a blake3 hash of the seed text and a nanosecond
//! tiebreak. Ids therefore sort roughly by creation time and two entities
//! created in the same millisecond still get distinct ids.
//!
//! Ids are otherwise opaque: deserialization accepts any non-empty string,
//! since imported documents may carry ids minted by other generators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::StoreError;

/// Generates a fresh id from a seed text and timestamp
fn mint(seed: &str, timestamp: DateTime<Utc>) -> String {
    let nanos = timestamp.timestamp_nanos_opt().unwrap_or(0);
    let hash = blake3::hash(format!("{}{}", seed, nanos).as_bytes());
    format!("{}-{}", timestamp.timestamp_millis(), &hash.to_hex()[..5])
}

fn validate(value: &str, kind: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{} id cannot be empty", kind)));
    }
    Ok(())
}

/// Unique task identifier, immutable after creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Mints a new id from the task text and creation time
    pub fn generate(text: &str, timestamp: DateTime<Utc>) -> Self {
        Self(mint(text, timestamp))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        validate(s, "task")?;
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for TaskId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

/// Unique workspace identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn generate(name: &str, timestamp: DateTime<Utc>) -> Self {
        Self(mint(name, timestamp))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WorkspaceId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        validate(s, "workspace")?;
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for WorkspaceId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WorkspaceId> for String {
    fn from(id: WorkspaceId) -> Self {
        id.0
    }
}

/// Unique saved-task template identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TemplateId(String);

impl TemplateId {
    pub fn generate(text: &str, timestamp: DateTime<Utc>) -> Self {
        Self(mint(text, timestamp))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TemplateId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        validate(s, "template")?;
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for TemplateId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TemplateId> for String {
    fn from(id: TemplateId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_for_same_text() {
        let ts1 = Utc::now();
        let ts2 = ts1 + chrono::Duration::nanoseconds(1);

        let id1 = TaskId::generate("Same text", ts1);
        let id2 = TaskId::generate("Same text", ts2);

        assert_ne!(id1, id2);
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let ts1 = Utc::now();
        let ts2 = ts1 + chrono::Duration::milliseconds(5);

        let id1 = TaskId::generate("a", ts1);
        let id2 = TaskId::generate("b", ts2);

        assert!(id1 < id2);
    }

    #[test]
    fn parse_accepts_opaque_strings() {
        // Ids from other generators (e.g. bare epoch millis) must round-trip
        let id: TaskId = "1712345678901".parse().unwrap();
        assert_eq!(id.as_str(), "1712345678901");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!("".parse::<TaskId>().is_err());
        assert!("   ".parse::<TaskId>().is_err());
        assert!("".parse::<WorkspaceId>().is_err());
        assert!("".parse::<TemplateId>().is_err());
    }

    #[test]
    fn parse_trims_whitespace() {
        let id: TaskId = "  abc-123  ".parse().unwrap();
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn serde_roundtrip() {
        let id = TaskId::generate("Test", Utc::now());
        let json = serde_json::to_string(&id).unwrap();
        let parsed: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_rejects_empty_string() {
        assert!(serde_json::from_str::<TaskId>("\"\"").is_err());
    }
}
