use std::collections::BTreeSet;

use crate::error::{ClassifierError, ClassifierResult};
use crate::models::{extract_labels, non_target_labels, RoleMapping, TargetRoles};

/// Validate a mapping against the transcript's labels.
///
/// 1. Every non-target label must be a key of the mapping.
/// 2. Every key of the mapping must be a label that occurs in the transcript.
pub fn validate_mapping(
    transcript: &str,
    mapping: &RoleMapping,
    roles: &TargetRoles,
) -> ClassifierResult<()> {
    let required = non_target_labels(transcript, roles);
    let unmapped: BTreeSet<&str> = required
        .iter()
        .filter(|label| !mapping.contains_key(label.as_str()))
        .map(String::as_str)
        .collect();

    if !unmapped.is_empty() {
        return Err(ClassifierError::MissingSpeakerMapping(format!(
            "Not all speakers are mapped. Missing: {}",
            join_sorted(unmapped)
        )));
    }

    let all_labels = extract_labels(transcript);
    let extra: BTreeSet<&str> = mapping
        .keys()
        .filter(|label| !all_labels.contains(label.as_str()))
        .map(String::as_str)
        .collect();

    if !extra.is_empty() {
        return Err(ClassifierError::SpeakerNotFound(format!(
            "Mapped speakers not found in transcript: {}",
            join_sorted(extra)
        )));
    }

    Ok(())
}

fn join_sorted(labels: BTreeSet<&str>) -> String {
    labels.into_iter().collect::<Vec<_>>().join(", ")
}
