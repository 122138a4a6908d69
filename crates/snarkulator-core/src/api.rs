//! Wire types shared by the gateway and its clients.

use crate::models::{AiResponse, Calculation};
use crate::persona::Environment;
use serde::{Deserialize, Serialize};

/// `POST /api/calculate` body. `result` is the client's own evaluation; the gateway
/// accepts it but stores the persona's answer instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// Stored response plus the presentation fields derived for the character panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponseView {
    #[serde(flatten)]
    pub stored: AiResponse,
    pub mood: String,
    pub activity: String,
    pub gif: String,
    pub environment: Environment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub calculation: Calculation,
    pub ai_response: AiResponseView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }
}
