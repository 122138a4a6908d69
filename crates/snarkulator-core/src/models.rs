//! Records kept by the store and returned over the API.
//! Field names go out camelCase (`calculationId`, `aiResult`) to match the web client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertUser {
    pub username: String,
    pub password: String,
}

/// A submitted expression and the result the persona gave for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub id: String,
    pub expression: String,
    pub result: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertCalculation {
    pub expression: String,
    pub result: String,
}

/// Persona comment stored against a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    pub id: String,
    pub calculation_id: Option<String>,
    pub response: String,
    pub emotion: String,
    pub ai_result: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAiResponse {
    #[serde(default)]
    pub calculation_id: Option<String>,
    pub response: String,
    pub emotion: String,
    pub ai_result: String,
}
