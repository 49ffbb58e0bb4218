use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Pipeline step that produced a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Configuration,
    LabelAnalysis,
    MappingRequest,
    MappingDecision,
    LabelReplacement,
    SafeguardStart,
    SafeguardIteration,
    ToolCallsRequested,
    ToolCall,
    UtteranceCorrected,
    UtteranceNotFound,
    CorrectionError,
    SafeguardComplete,
    SafeguardError,
    SafeguardEnd,
    Error,
}

/// One structured entry in the classification log
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub step: Step,
    /// RFC 3339 UTC timestamp
    pub ts: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogEntry {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Ordered, append-only audit log of a single classification run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ClassificationLog {
    entries: Vec<LogEntry>,
}

impl ClassificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. `fields` should be a JSON object; any other value is
    /// stored under `"value"`.
    pub fn push(&mut self, step: Step, fields: Value) {
        let fields = match fields {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };

        debug!(step = ?step, "log entry");

        self.entries.push(LogEntry {
            step,
            ts: chrono::Utc::now().to_rfc3339(),
            fields,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    pub fn steps(&self) -> Vec<Step> {
        self.entries.iter().map(|e| e.step).collect()
    }

    /// First entry for the given step
    pub fn find(&self, step: Step) -> Option<&LogEntry> {
        self.entries.iter().find(|e| e.step == step)
    }

    pub fn count(&self, step: Step) -> usize {
        self.entries.iter().filter(|e| e.step == step).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
