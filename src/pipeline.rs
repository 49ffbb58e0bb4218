use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::error::ClassifierResult;
use crate::llm::{validate_mapping, ReasoningService};
use crate::models::{
    extract_labels, non_target_labels, restrict_mapping, ClassificationLog, Correction, Step,
    TargetRoles,
};
use crate::stages::{request_role_mapping, run_safeguard, substitute_labels, SafeguardConfig};

/// Configuration for one classification run
#[derive(Debug, Clone, Default)]
pub struct ClassifierConfig {
    /// Role names to label the transcript with
    pub target_roles: TargetRoles,
    /// Run the safeguard review after substitution
    pub enable_safeguard: bool,
    pub safeguard: SafeguardConfig,
}

impl ClassifierConfig {
    pub fn new(target_roles: TargetRoles, enable_safeguard: bool) -> Self {
        Self {
            target_roles,
            enable_safeguard,
            safeguard: SafeguardConfig::default(),
        }
    }
}

/// Output of a classification run
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    /// Relabeled transcript
    pub transcript: String,
    /// Ordered audit log of the run
    pub log: ClassificationLog,
    /// Safeguard corrections that were applied
    #[serde(skip)]
    pub corrections: Vec<Correction>,
}

/// Relabel speaker turns of `transcript` with the configured target roles
///
/// 1. Find labels that are not already target roles
/// 2. Ask the service for a mapping, validate it, substitute labels
/// 3. Optionally run the safeguard review
///
/// Mapping and validation errors propagate unchanged; the safeguard never fails.
pub async fn classify<S>(
    service: &S,
    transcript: &str,
    config: &ClassifierConfig,
) -> ClassifierResult<ClassificationResult>
where
    S: ReasoningService + ?Sized,
{
    let roles = &config.target_roles;
    let mut log = ClassificationLog::new();

    log.push(
        Step::Configuration,
        json!({
            "run_id": uuid::Uuid::new_v4().to_string(),
            "target_roles": roles,
            "enable_safeguard": config.enable_safeguard,
        }),
    );

    let all_labels = extract_labels(transcript);
    let labels_to_map = non_target_labels(transcript, roles);

    log.push(
        Step::LabelAnalysis,
        json!({
            "all_labels": all_labels,
            "target_roles": roles,
            "non_target_labels": labels_to_map,
        }),
    );

    info!(
        "Found {} labels, {} need mapping",
        all_labels.len(),
        labels_to_map.len()
    );

    let mut result_transcript = transcript.to_string();

    if !labels_to_map.is_empty() {
        let mapping =
            request_role_mapping(service, transcript, roles, &labels_to_map, &mut log).await?;
        validate_mapping(transcript, &mapping, roles)?;

        let mapping = restrict_mapping(&mapping, &labels_to_map);
        result_transcript = substitute_labels(transcript, &mapping, &mut log);
    } else {
        info!("All labels are already target roles, skipping mapping");
    }

    let mut corrections = Vec::new();

    if config.enable_safeguard {
        let safeguard = run_safeguard(
            service,
            &result_transcript,
            roles,
            &config.safeguard,
            &mut log,
        )
        .await;
        result_transcript = safeguard.transcript;
        corrections = safeguard.corrections;
    }

    Ok(ClassificationResult {
        transcript: result_transcript,
        log,
        corrections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifierError;
    use crate::llm::testing::{correction_call, ScriptedService};

    fn safeguarded() -> ClassifierConfig {
        ClassifierConfig::new(TargetRoles::default(), true)
    }

    #[tokio::test]
    async fn test_two_speaker_classification() {
        let service =
            ScriptedService::new().json(json!({"Speaker 0": "Agent", "Speaker 1": "Customer"}));

        let result = classify(
            &service,
            "Speaker 0: Good afternoon.\nSpeaker 1: Hi.",
            &ClassifierConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.transcript, "Agent: Good afternoon.\nCustomer: Hi.");
        assert_eq!(
            result.log.steps(),
            vec![
                Step::Configuration,
                Step::LabelAnalysis,
                Step::MappingRequest,
                Step::MappingDecision,
                Step::LabelReplacement
            ]
        );
        assert!(result.corrections.is_empty());
    }

    #[tokio::test]
    async fn test_already_labeled_passes_through() {
        let transcript = "Agent: Hello.\n\n  Customer: Hi there.\nAgent: Bye.\n";
        let service = ScriptedService::new();

        let result = classify(&service, transcript, &ClassifierConfig::default())
            .await
            .unwrap();

        assert_eq!(result.transcript, transcript);
        assert_eq!(service.request_count(), 0);
        assert_eq!(
            result.log.steps(),
            vec![Step::Configuration, Step::LabelAnalysis]
        );
    }

    #[tokio::test]
    async fn test_unknown_label_requires_mapping() {
        let transcript = "Speaker 0: Hello\nSpeaker 1: Hi\nUnknown: hm";
        let service =
            ScriptedService::new().json(json!({"Speaker 0": "Agent", "Speaker 1": "Customer"}));

        let err = classify(&service, transcript, &ClassifierConfig::default())
            .await
            .unwrap_err();

        match err {
            ClassifierError::MissingSpeakerMapping(msg) => assert!(msg.contains("Unknown")),
            other => panic!("unexpected error: {:?}", other),
        }

        let request = &service.requests()[0];
        assert!(request.user.contains("Speaker 0, Speaker 1, Unknown"));
    }

    #[tokio::test]
    async fn test_extraneous_speaker_rejected() {
        let service = ScriptedService::new().json(json!({
            "Speaker 0": "Agent",
            "Speaker 1": "Customer",
            "Speaker 5": "Customer"
        }));

        let err = classify(
            &service,
            "Speaker 0: Good afternoon.\nSpeaker 1: Hi.",
            &ClassifierConfig::default(),
        )
        .await
        .unwrap_err();

        match err {
            ClassifierError::SpeakerNotFound(msg) => assert!(msg.ends_with("Speaker 5")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_stops_pipeline() {
        let service = ScriptedService::new().text("this is not json");

        let err = classify(
            &service,
            "Speaker 0: Good afternoon.\nSpeaker 1: Hi.",
            &safeguarded(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ClassifierError::InvalidJsonResponse(_)));
        assert_eq!(service.request_count(), 1);
    }

    #[tokio::test]
    async fn test_partially_labeled_transcript() {
        let transcript = "Agent: Hello, how can I help?\nSpeaker 1: My card is blocked.";
        let service = ScriptedService::new().json(json!({"Speaker 1": "Customer"}));

        let result = classify(&service, transcript, &ClassifierConfig::default())
            .await
            .unwrap();

        assert_eq!(
            result.transcript,
            "Agent: Hello, how can I help?\nCustomer: My card is blocked."
        );
    }

    #[tokio::test]
    async fn test_mapping_of_target_label_is_not_applied() {
        let transcript = "Agent: Hello\nSpeaker 1: Hi";
        let service =
            ScriptedService::new().json(json!({"Agent": "Customer", "Speaker 1": "Customer"}));

        let result = classify(&service, transcript, &ClassifierConfig::default())
            .await
            .unwrap();

        assert_eq!(result.transcript, "Agent: Hello\nCustomer: Hi");
    }

    #[tokio::test]
    async fn test_custom_roles() {
        let roles = TargetRoles::new(["Doctor", "Patient", "Nurse"]).unwrap();
        let service = ScriptedService::new().json(json!({
            "Speaker 0": "Doctor",
            "Speaker 1": "Patient",
            "Speaker 2": "Nurse"
        }));

        let result = classify(
            &service,
            "Speaker 0: What brings you in?\nSpeaker 1: A cough.\nSpeaker 2: Vitals are normal.",
            &ClassifierConfig::new(roles, false),
        )
        .await
        .unwrap();

        assert_eq!(
            result.transcript,
            "Doctor: What brings you in?\nPatient: A cough.\nNurse: Vitals are normal."
        );
    }

    #[tokio::test]
    async fn test_safeguard_after_substitution() {
        let transcript = "Speaker 0: Thank you for calling, how can I help?\n\
Speaker 1: My internet is down.\n\
Speaker 1: Let me check your connection from here.";
        let service = ScriptedService::new()
            .json(json!({"Speaker 0": "Agent", "Speaker 1": "Customer"}))
            .tool_calls(vec![correction_call(
                "c1",
                "Customer",
                "Let me check your connection",
                "Agent",
            )])
            .text("Looks correct now.");

        let result = classify(&service, transcript, &safeguarded()).await.unwrap();

        assert_eq!(
            result.transcript,
            "Agent: Thank you for calling, how can I help?\n\
Customer: My internet is down.\n\
Agent: Let me check your connection from here."
        );
        assert_eq!(result.corrections.len(), 1);
        assert_eq!(result.log.count(Step::UtteranceCorrected), 1);
        let end = result.log.find(Step::SafeguardEnd).unwrap();
        assert_eq!(end.get("total_corrections"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_safeguard_runs_without_mapping() {
        let transcript = "Agent: Hello\nCustomer: Hi";
        let service = ScriptedService::new().text("All good.");

        let result = classify(&service, transcript, &safeguarded()).await.unwrap();

        assert_eq!(result.transcript, transcript);
        assert!(result.log.find(Step::MappingRequest).is_none());
        assert!(result.log.find(Step::LabelReplacement).is_none());
        assert_eq!(result.log.count(Step::SafeguardStart), 1);
    }

    #[tokio::test]
    async fn test_safeguard_failure_is_absorbed() {
        let service = ScriptedService::new()
            .json(json!({"Speaker 0": "Agent", "Speaker 1": "Customer"}))
            .fail(crate::llm::ServiceError::Other("timeout".to_string()));

        let result = classify(
            &service,
            "Speaker 0: Good afternoon.\nSpeaker 1: Hi.",
            &safeguarded(),
        )
        .await
        .unwrap();

        assert_eq!(result.transcript, "Agent: Good afternoon.\nCustomer: Hi.");
        assert_eq!(result.log.count(Step::SafeguardError), 1);
    }

    #[tokio::test]
    async fn test_label_analysis_entry() {
        let service = ScriptedService::new().json(json!({"Speaker 1": "Customer"}));

        let result = classify(
            &service,
            "Agent: Hello\nSpeaker 1: Hi",
            &ClassifierConfig::default(),
        )
        .await
        .unwrap();

        let analysis = result.log.find(Step::LabelAnalysis).unwrap();
        assert_eq!(analysis.get("all_labels"), Some(&json!(["Agent", "Speaker 1"])));
        assert_eq!(analysis.get("non_target_labels"), Some(&json!(["Speaker 1"])));

        let config = result.log.find(Step::Configuration).unwrap();
        assert_eq!(config.get("enable_safeguard"), Some(&json!(false)));
        assert!(config.get("run_id").is_some());
    }
}
