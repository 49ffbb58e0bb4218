use std::collections::BTreeSet;

use serde_json::json;
use tracing::{info, warn};

use crate::error::{ClassifierError, ClassifierResult};
use crate::llm::{
    build_mapping_prompt, build_mapping_system_prompt, ReasoningService, ResponseFormat,
    ServiceError, ServiceReply, ServiceRequest,
};
use crate::models::{ClassificationLog, RoleMapping, Step, TargetRoles};

/// Execute Stage 1: ask the reasoning service to map labels to roles
///
/// The mapping is returned as the service produced it; key coverage is checked
/// afterwards by `validate_mapping`. Any failure, whether the call itself or the
/// shape of the answer, becomes `InvalidJsonResponse`.
pub async fn request_role_mapping<S>(
    service: &S,
    transcript: &str,
    roles: &TargetRoles,
    labels_to_map: &BTreeSet<String>,
    log: &mut ClassificationLog,
) -> ClassifierResult<RoleMapping>
where
    S: ReasoningService + ?Sized,
{
    let request = ServiceRequest {
        system: build_mapping_system_prompt(roles),
        user: build_mapping_prompt(transcript, roles, labels_to_map),
        response_format: ResponseFormat::JsonObject,
        tools: vec![],
    };

    log.push(
        Step::MappingRequest,
        json!({
            "target_roles": roles,
            "labels_to_map": labels_to_map,
            "prompt_length": request.user.chars().count(),
        }),
    );

    info!(
        "Stage 1: Requesting role mapping for {} labels",
        labels_to_map.len()
    );

    let result = service
        .complete(&request)
        .await
        .and_then(mapping_from_reply);

    match result {
        Ok(mapping) => {
            log.push(Step::MappingDecision, json!({ "mapping": mapping }));
            info!("Stage 1: Received mapping for {} labels", mapping.len());
            Ok(mapping)
        }
        Err(ServiceError::Json(e)) => {
            warn!("Mapping response was not valid JSON: {}", e);
            log.push(Step::Error, json!({ "error": format!("JSON decode error: {}", e) }));
            Err(ClassifierError::InvalidJsonResponse(format!(
                "Failed to parse JSON response from API: {}",
                e
            )))
        }
        Err(ServiceError::EmptyResponse) => {
            warn!("Mapping response was empty");
            let message = ServiceError::EmptyResponse.to_string();
            log.push(Step::Error, json!({ "error": message }));
            Err(ClassifierError::InvalidJsonResponse(message))
        }
        Err(e) => {
            warn!("Mapping request failed: {}", e);
            log.push(Step::Error, json!({ "error": e.to_string() }));
            Err(ClassifierError::InvalidJsonResponse(format!(
                "API call failed: {}",
                e
            )))
        }
    }
}

/// Interpret a reply as a flat label -> role object
fn mapping_from_reply(reply: ServiceReply) -> Result<RoleMapping, ServiceError> {
    let value = match reply {
        ServiceReply::Json(value) => value,
        ServiceReply::Text(text) => {
            if text.trim().is_empty() {
                return Err(ServiceError::EmptyResponse);
            }
            serde_json::from_str(&text)?
        }
        ServiceReply::ToolCalls(calls) => {
            return Err(ServiceError::Other(format!(
                "expected a JSON object, got {} tool calls",
                calls.len()
            )));
        }
    };

    Ok(serde_json::from_value(value)?)
}
