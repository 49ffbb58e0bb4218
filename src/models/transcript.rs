use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{ClassifierError, ClassifierResult};

/// A transcript line of the form `<label>: <text>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utterance<'a> {
    /// Index of the line in the transcript (split on `\n`)
    pub line_index: usize,
    /// Everything before the first colon, trimmed
    pub label: &'a str,
    /// Everything after the first colon, trimmed
    pub text: &'a str,
}

/// Split a single line into label and text.
///
/// Blank lines and lines without a colon after at least one character are not utterances.
pub fn parse_utterance_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (label, text) = trimmed.split_once(':')?;
    if label.is_empty() {
        return None;
    }
    Some((label.trim(), text.trim()))
}

/// Iterate the utterances of a transcript in document order
pub fn utterances(transcript: &str) -> impl Iterator<Item = Utterance<'_>> {
    transcript
        .split('\n')
        .enumerate()
        .filter_map(|(line_index, line)| {
            parse_utterance_line(line).map(|(label, text)| Utterance {
                line_index,
                label,
                text,
            })
        })
}

/// The set of distinct labels used by the transcript's utterances
pub fn extract_labels(transcript: &str) -> BTreeSet<String> {
    utterances(transcript)
        .map(|u| u.label.to_string())
        .collect()
}

/// Labels present in the transcript that are not already a target role
pub fn non_target_labels(transcript: &str, roles: &TargetRoles) -> BTreeSet<String> {
    extract_labels(transcript)
        .into_iter()
        .filter(|label| !roles.contains(label))
        .collect()
}

/// Number of utterances per label
pub fn label_counts(transcript: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for utterance in utterances(transcript) {
        *counts.entry(utterance.label.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Ordered list of role names the transcript should be labeled with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TargetRoles(Vec<String>);

impl TargetRoles {
    /// Validate and build a role list.
    ///
    /// Names are trimmed; at least two distinct, non-empty names are required.
    pub fn new<I, S>(roles: I) -> ClassifierResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for role in roles {
            let role: String = role.into();
            let role = role.trim();
            if role.is_empty() {
                return Err(ClassifierError::Configuration(
                    "target roles must not be empty".to_string(),
                ));
            }
            if names.iter().any(|existing| existing == role) {
                return Err(ClassifierError::Configuration(format!(
                    "duplicate target role: {}",
                    role
                )));
            }
            names.push(role.to_string());
        }

        if names.len() < 2 {
            return Err(ClassifierError::Configuration(format!(
                "at least two target roles are required, got {}",
                names.len()
            )));
        }

        Ok(Self(names))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|role| role == name)
    }

    /// "Agent and Customer"
    pub fn describe(&self) -> String {
        self.0.join(" and ")
    }

    /// `"Agent", "Customer"`
    pub fn quoted(&self) -> String {
        self.0
            .iter()
            .map(|role| format!("\"{}\"", role))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for TargetRoles {
    fn default() -> Self {
        Self(vec!["Agent".to_string(), "Customer".to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_labels() {
        let transcript = "Speaker 0: Hello there.\n\nSpeaker 1: Hi.\n  Unknown : Who is this?\nno colon here\nSpeaker 0: Again: with colon";
        let labels = extract_labels(transcript);

        let expected: BTreeSet<String> = ["Speaker 0", "Speaker 1", "Unknown"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_extract_labels_empty() {
        assert!(extract_labels("").is_empty());
        assert!(extract_labels("\n\n   \njust words").is_empty());
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let labels = extract_labels("agent: hi\nAgent: hello");
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn test_leading_colon_is_not_a_label() {
        assert_eq!(parse_utterance_line(": nothing"), None);
        assert_eq!(
            parse_utterance_line("  Agent:  hi there "),
            Some(("Agent", "hi there"))
        );
    }

    #[test]
    fn test_non_target_labels() {
        let roles = TargetRoles::default();
        let transcript = "Agent: Hello\nSpeaker 1: Hi\nUnknown: hm";
        let labels = non_target_labels(transcript, &roles);

        assert_eq!(labels.len(), 2);
        assert!(labels.contains("Speaker 1"));
        assert!(labels.contains("Unknown"));
    }

    #[test]
    fn test_utterance_line_indices() {
        let transcript = "Speaker 0: a\n\nSpeaker 1: b";
        let found: Vec<_> = utterances(transcript).collect();

        assert_eq!(found.len(), 2);
        assert_eq!(found[1].line_index, 2);
        assert_eq!(found[1].label, "Speaker 1");
        assert_eq!(found[1].text, "b");
    }

    #[test]
    fn test_label_counts() {
        let counts = label_counts("A: 1\nB: 2\nA: 3");
        assert_eq!(counts["A"], 2);
        assert_eq!(counts["B"], 1);
    }

    #[test]
    fn test_target_roles_validation() {
        assert!(TargetRoles::new(["Agent"]).is_err());
        assert!(TargetRoles::new(["Agent", " Agent "]).is_err());
        assert!(TargetRoles::new(["Agent", ""]).is_err());

        let roles = TargetRoles::new(["Doctor", "Patient", "Nurse"]).unwrap();
        assert_eq!(roles.as_slice().len(), 3);
        assert_eq!(roles.describe(), "Doctor and Patient and Nurse");
        assert_eq!(roles.quoted(), "\"Doctor\", \"Patient\", \"Nurse\"");
    }
}
