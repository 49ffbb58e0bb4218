use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Label to role assignments returned by the reasoning service
pub type RoleMapping = BTreeMap<String, String>;

/// Keep only the entries whose label is in `labels`
pub fn restrict_mapping(mapping: &RoleMapping, labels: &BTreeSet<String>) -> RoleMapping {
    mapping
        .iter()
        .filter(|(label, _)| labels.contains(*label))
        .map(|(label, role)| (label.clone(), role.clone()))
        .collect()
}

/// Arguments of the `correct_speaker_role` tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectSpeakerRole {
    /// Role currently (and allegedly wrongly) on the line
    pub current_role: String,
    /// First words of the utterance text, used to locate the line
    pub utterance_prefix: String,
    /// Role the line should carry
    pub correct_role: String,
    /// Free-text rationale from the reviewer
    pub reason: String,
}

/// A single applied safeguard edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub line_index: usize,
    pub current_role: String,
    pub correct_role: String,
    pub utterance_prefix: String,
    pub reason: String,
}

impl Correction {
    pub fn applied(line_index: usize, args: CorrectSpeakerRole) -> Self {
        Self {
            line_index,
            current_role: args.current_role,
            correct_role: args.correct_role,
            utterance_prefix: args.utterance_prefix,
            reason: args.reason,
        }
    }
}
