use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{ReasoningService, ServiceError, ServiceReply, ServiceRequest, ToolCall};

/// In-memory service that replays queued replies and records requests
#[derive(Default)]
pub struct ScriptedService {
    replies: Mutex<VecDeque<Result<ServiceReply, ServiceError>>>,
    requests: Mutex<Vec<ServiceRequest>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, reply: ServiceReply) -> Self {
        self.replies.lock().unwrap().push_back(Ok(reply));
        self
    }

    pub fn fail(self, error: ServiceError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn json(self, value: Value) -> Self {
        self.reply(ServiceReply::Json(value))
    }

    pub fn text(self, text: &str) -> Self {
        self.reply(ServiceReply::Text(text.to_string()))
    }

    pub fn tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.reply(ServiceReply::ToolCalls(calls))
    }

    pub fn requests(&self) -> Vec<ServiceRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningService for ScriptedService {
    async fn complete(&self, request: &ServiceRequest) -> Result<ServiceReply, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Other("no scripted reply left".to_string())))
    }
}

/// A `correct_speaker_role` tool call
pub fn correction_call(id: &str, current: &str, prefix: &str, correct: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: "correct_speaker_role".to_string(),
        arguments: serde_json::json!({
            "current_role": current,
            "utterance_prefix": prefix,
            "correct_role": correct,
            "reason": "context"
        }),
    }
}
