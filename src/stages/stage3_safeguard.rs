use serde_json::json;
use tracing::{debug, info, warn};

use crate::llm::{
    build_followup_prompt, build_review_prompt, build_safeguard_system_prompt,
    correct_speaker_role_tool, ReasoningService, ResponseFormat, ServiceReply, ServiceRequest,
    ToolCall, CORRECT_SPEAKER_ROLE,
};
use crate::models::{ClassificationLog, CorrectSpeakerRole, Correction, Step, TargetRoles};

/// Hard ceiling on review round trips
pub const MAX_SAFEGUARD_ITERATIONS: usize = 3;

/// Configuration for the safeguard review loop
#[derive(Debug, Clone)]
pub struct SafeguardConfig {
    /// Review iterations, capped at `MAX_SAFEGUARD_ITERATIONS`
    pub max_iterations: usize,
    /// Leading words of an utterance compared against the supplied prefix
    pub max_prefix_words: usize,
}

impl Default for SafeguardConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_SAFEGUARD_ITERATIONS,
            max_prefix_words: 10,
        }
    }
}

/// Result of the safeguard review
#[derive(Debug, Clone)]
pub struct SafeguardResult {
    /// Best transcript obtained
    pub transcript: String,
    /// Corrections that were applied, in order
    pub corrections: Vec<Correction>,
}

/// Execute Stage 3: iterative LLM review with point corrections
///
/// Each iteration sends the current transcript with the `correct_speaker_role`
/// tool. A reply without tool calls ends the loop. Service failures end the loop
/// early; they are logged and never returned as errors.
pub async fn run_safeguard<S>(
    service: &S,
    transcript: &str,
    roles: &TargetRoles,
    config: &SafeguardConfig,
    log: &mut ClassificationLog,
) -> SafeguardResult
where
    S: ReasoningService + ?Sized,
{
    log.push(Step::SafeguardStart, json!({ "target_roles": roles }));

    let max_iterations = config.max_iterations.min(MAX_SAFEGUARD_ITERATIONS);
    let system = build_safeguard_system_prompt(roles);
    let tool = correct_speaker_role_tool(roles);

    let mut current = transcript.to_string();
    let mut corrections: Vec<Correction> = Vec::new();
    let mut prompt = build_review_prompt(&current, roles);

    for iteration in 0..max_iterations {
        log.push(Step::SafeguardIteration, json!({ "iteration": iteration + 1 }));
        info!("Stage 3: Safeguard iteration {} of {}", iteration + 1, max_iterations);

        let request = ServiceRequest {
            system: system.clone(),
            user: prompt,
            response_format: ResponseFormat::Text,
            tools: vec![tool.clone()],
        };

        let reply = match service.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Safeguard review failed: {}", e);
                log.push(Step::SafeguardError, json!({ "error": e.to_string() }));
                break;
            }
        };

        let calls = match reply {
            ServiceReply::ToolCalls(calls) if !calls.is_empty() => calls,
            _ => {
                let message = if corrections.is_empty() {
                    "No corrections needed"
                } else {
                    "All corrections completed"
                };
                log.push(
                    Step::SafeguardComplete,
                    json!({
                        "message": message,
                        "total_corrections": corrections.len(),
                    }),
                );
                break;
            }
        };

        log.push(Step::ToolCallsRequested, json!({ "count": calls.len() }));

        for call in calls {
            apply_tool_call(&mut current, call, config, log, &mut corrections);
        }

        if corrections.is_empty() || iteration + 1 >= max_iterations {
            break;
        }

        prompt = build_followup_prompt(&current, roles);
    }

    info!("Stage 3: {} corrections applied", corrections.len());

    log.push(
        Step::SafeguardEnd,
        json!({
            "corrections_made": corrections,
            "total_corrections": corrections.len(),
        }),
    );

    SafeguardResult {
        transcript: current,
        corrections,
    }
}

/// Handle one tool call, editing `transcript` in place when the target is found
fn apply_tool_call(
    transcript: &mut String,
    call: ToolCall,
    config: &SafeguardConfig,
    log: &mut ClassificationLog,
    corrections: &mut Vec<Correction>,
) {
    log.push(
        Step::ToolCall,
        json!({
            "id": call.id,
            "function": call.name,
            "arguments": call.arguments,
        }),
    );

    if call.name != CORRECT_SPEAKER_ROLE {
        debug!("Ignoring unknown tool {:?}", call.name);
        return;
    }

    let args: CorrectSpeakerRole = match serde_json::from_value(call.arguments) {
        Ok(args) => args,
        Err(e) => {
            warn!("Invalid {} arguments: {}", CORRECT_SPEAKER_ROLE, e);
            log.push(
                Step::CorrectionError,
                json!({ "error": format!("Invalid tool arguments: {}", e) }),
            );
            return;
        }
    };

    let Some((line_index, _)) = find_utterance_by_prefix(
        transcript,
        &args.current_role,
        &args.utterance_prefix,
        config.max_prefix_words,
    ) else {
        debug!(
            "No {} utterance starts with {:?}",
            args.current_role, args.utterance_prefix
        );
        log.push(
            Step::UtteranceNotFound,
            json!({
                "current_role": args.current_role,
                "prefix": args.utterance_prefix,
            }),
        );
        return;
    };

    match rewrite_line_role(transcript, line_index, &args.current_role, &args.correct_role) {
        Some((updated, old_line, new_line)) => {
            log.push(
                Step::UtteranceCorrected,
                json!({
                    "line_index": line_index,
                    "old_role": args.current_role,
                    "new_role": args.correct_role,
                    "old_line": old_line,
                    "new_line": new_line,
                }),
            );
            *transcript = updated;
            corrections.push(Correction::applied(line_index, args));
        }
        None => {
            log.push(
                Step::CorrectionError,
                json!({ "error": format!("Line index {} out of range", line_index) }),
            );
        }
    }
}

/// Locate an utterance by its role and the first words of its text.
///
/// Compares the leading whitespace-separated words case-insensitively, up to
/// `max_words`. The first matching line in document order wins; an empty
/// prefix matches the first line spoken by `current_role`.
pub fn find_utterance_by_prefix(
    transcript: &str,
    current_role: &str,
    utterance_prefix: &str,
    max_words: usize,
) -> Option<(usize, String)> {
    let prefix = utterance_prefix.to_lowercase();
    let prefix_words: Vec<&str> = prefix.split_whitespace().take(max_words).collect();

    let role_prefix = format!("{}:", current_role);

    for (index, line) in transcript.split('\n').enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(text) = line.strip_prefix(role_prefix.as_str()) else {
            continue;
        };

        let text = text.to_lowercase();
        let text_words: Vec<&str> = text.split_whitespace().take(prefix_words.len()).collect();

        if text_words == prefix_words {
            return Some((index, line.to_string()));
        }
    }

    None
}

/// Replace the first `<old_role>:` on one line; returns the new transcript and
/// the line before and after
fn rewrite_line_role(
    transcript: &str,
    line_index: usize,
    old_role: &str,
    new_role: &str,
) -> Option<(String, String, String)> {
    let lines: Vec<&str> = transcript.split('\n').collect();
    let old_line = lines.get(line_index)?.to_string();
    let new_line = old_line.replacen(&format!("{}:", old_role), &format!("{}:", new_role), 1);

    let updated = lines
        .iter()
        .enumerate()
        .map(|(i, line)| if i == line_index { new_line.as_str() } else { *line })
        .collect::<Vec<_>>()
        .join("\n");

    Some((updated, old_line, new_line))
}
