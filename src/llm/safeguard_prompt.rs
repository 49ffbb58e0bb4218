use crate::llm::ToolDefinition;
use crate::models::TargetRoles;

pub const CORRECT_SPEAKER_ROLE: &str = "correct_speaker_role";

/// Build the system prompt for the safeguard review
pub fn build_safeguard_system_prompt(roles: &TargetRoles) -> String {
    format!(
        "You are a conversation analyst validating speaker role classifications. The valid roles are: {}. \
         Use the {} function to fix any misclassifications you identify.",
        roles.describe(),
        CORRECT_SPEAKER_ROLE
    )
}

/// First review of a freshly labeled transcript
pub fn build_review_prompt(transcript: &str, roles: &TargetRoles) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "You are validating speaker role classifications in a conversation transcript. The valid roles are: {}\n\n",
        roles.describe()
    ));
    prompt.push_str("Here is the classified transcript:\n\n");
    prompt.push_str(transcript);
    prompt.push_str("\n\n");

    prompt.push_str(
        "Review this transcript carefully. Look for any utterances that seem misclassified based on:\n",
    );
    prompt.push_str("- The content of what they're saying\n");
    prompt.push_str("- The conversational context and flow\n");
    prompt.push_str("- Typical patterns (e.g., agents greet customers, customers describe problems)\n\n");

    prompt.push_str(&format!(
        "If you find any misclassified utterances, use the {} function to fix them. \
         Provide the current (wrong) role, the first 5-10 words of the utterance, the correct role, and your reasoning.\n\n",
        CORRECT_SPEAKER_ROLE
    ));
    prompt.push_str("If everything looks correct, simply respond that the classification is accurate.");

    prompt
}

/// Follow-up review after corrections were applied
pub fn build_followup_prompt(transcript: &str, roles: &TargetRoles) -> String {
    let mut prompt = String::new();

    prompt.push_str("Here is the updated transcript after corrections:\n\n");
    prompt.push_str(transcript);
    prompt.push_str("\n\n");
    prompt.push_str(&format!("The valid roles are: {}\n\n", roles.describe()));
    prompt.push_str(
        "Review again. Are there any remaining misclassifications? If so, correct them. \
         If everything is now correct, confirm that the classification is accurate.",
    );

    prompt
}

/// Definition of the single correction tool offered to the reviewer
pub fn correct_speaker_role_tool(roles: &TargetRoles) -> ToolDefinition {
    let role_list = roles.as_slice().join(", ");

    ToolDefinition {
        name: CORRECT_SPEAKER_ROLE.to_string(),
        description: "Correct a single misclassified utterance by specifying its current (wrong) role and the beginning of the utterance text. \
                      Use this when you identify a speaker role that seems incorrect based on the conversation context."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "current_role": {
                    "type": "string",
                    "description": format!("The current (incorrect) role label on the utterance. Must be one of: {}", role_list)
                },
                "utterance_prefix": {
                    "type": "string",
                    "description": "The first 5-10 words of the utterance text (after the role label). This helps locate the specific utterance."
                },
                "correct_role": {
                    "type": "string",
                    "description": format!("The correct role this utterance should have. Must be one of: {}", role_list)
                },
                "reason": {
                    "type": "string",
                    "description": "Brief explanation of why this utterance is misclassified"
                }
            },
            "required": ["current_role", "utterance_prefix", "correct_role", "reason"]
        }),
    }
}
