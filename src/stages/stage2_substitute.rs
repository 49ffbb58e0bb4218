use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::models::{ClassificationLog, RoleMapping, Step};

/// A label replaced throughout the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
    pub occurrences: usize,
}

/// Execute Stage 2: rewrite `<label>:` to `<role>:` for every mapped label
///
/// Labels are processed in descending lexicographic order so a label that is a
/// prefix of another ("Speaker 1" / "Speaker 10") never clobbers the longer one.
/// Every textual occurrence of `<label>:` is replaced, including mid-line ones.
pub fn substitute_labels(
    transcript: &str,
    mapping: &RoleMapping,
    log: &mut ClassificationLog,
) -> String {
    let mut result = transcript.to_string();
    let mut replacements = Vec::new();

    for (label, role) in mapping.iter().rev() {
        let old_pattern = format!("{}:", label);
        let new_pattern = format!("{}:", role);

        let occurrences = result.matches(old_pattern.as_str()).count();
        if occurrences == 0 {
            debug!("Label {:?} not present, skipping", label);
            continue;
        }

        result = result.replace(&old_pattern, &new_pattern);
        replacements.push(Replacement {
            from: label.clone(),
            to: role.clone(),
            occurrences,
        });
    }

    info!(
        "Stage 2: {} labels replaced, {} occurrences",
        replacements.len(),
        replacements.iter().map(|r| r.occurrences).sum::<usize>()
    );

    log.push(Step::LabelReplacement, json!({ "replacements": replacements }));

    result
}
