pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use error::{ClassifierError, ClassifierResult};
pub use io::{read_transcript, write_log_json, write_transcript};
pub use llm::{OpenAiClient, OpenAiConfig, ReasoningService, ServiceError, ServiceReply};
pub use models::{
    extract_labels, label_counts, non_target_labels, ClassificationLog, Correction, LogEntry,
    RoleMapping, Step, TargetRoles,
};
pub use pipeline::{classify, ClassificationResult, ClassifierConfig};
pub use stages::{
    find_utterance_by_prefix, request_role_mapping, run_safeguard, substitute_labels,
    SafeguardConfig, SafeguardResult, MAX_SAFEGUARD_ITERATIONS,
};
