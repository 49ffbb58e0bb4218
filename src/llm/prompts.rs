use std::collections::BTreeSet;

use crate::models::TargetRoles;

/// System prompt for the label-to-role mapping request
pub fn build_mapping_system_prompt(roles: &TargetRoles) -> String {
    format!(
        "You are a conversation transcript analyzer. Always respond with valid JSON mapping speaker labels to these roles: {}",
        roles.describe()
    )
}

/// Build the user prompt asking for a label-to-role mapping
pub fn build_mapping_prompt(
    transcript: &str,
    roles: &TargetRoles,
    labels_to_map: &BTreeSet<String>,
) -> String {
    let labels: Vec<&str> = labels_to_map.iter().map(String::as_str).collect();
    let names = roles.as_slice();

    let mut prompt = String::new();

    prompt.push_str(
        "You are analyzing a conversation transcript. Your task is to identify which speaker has which role.\n\n",
    );
    prompt.push_str(&format!("The valid roles are: {}\n\n", roles.describe()));

    prompt.push_str("Here is the transcript:\n\n");
    prompt.push_str(transcript);
    prompt.push_str("\n\n");

    prompt.push_str(&format!(
        "The following speaker labels need to be mapped to roles: {}\n\n",
        labels.join(", ")
    ));

    prompt.push_str(
        "Analyze the conversation and determine which speaker label corresponds to which role.\n\n",
    );
    prompt.push_str(&format!(
        "Respond with a single flat JSON object mapping each speaker label listed above to its role. \
         Use exactly the role names provided as values: {}. Do not nest objects or add other keys.\n\n",
        roles.quoted()
    ));

    // Example keys are drawn from labels_to_map only
    let example: Vec<String> = labels
        .iter()
        .take(2)
        .zip(names.iter().cycle())
        .map(|(label, role)| format!("  \"{}\": \"{}\"", label, role))
        .collect();

    prompt.push_str("Example format:\n{\n");
    prompt.push_str(&example.join(",\n"));
    prompt.push_str("\n}");

    prompt
}
