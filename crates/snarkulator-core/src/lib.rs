//! Snarkulator — Core library.
//! Keypad state machine, sarcastic persona, Gemini bridge and the in-memory store
//! behind the calculator gateway.

pub mod api;
pub mod calculator;
pub mod config;
pub mod gemini_bridge;
pub mod judge;
pub mod models;
pub mod persona;
pub mod session;
pub mod storage;

pub use api::{AiResponseView, CalculateRequest, CalculateResponse, ErrorBody};
pub use calculator::{calculate, format_number, parse_float, CalculatorState, Operator};
pub use config::GatewayConfig;
pub use gemini_bridge::{BridgeError, CommentaryProvider, GeminiBridge};
pub use judge::{judge_expression, JudgeError};
pub use models::{AiResponse, Calculation, InsertAiResponse, InsertCalculation, InsertUser, User};
pub use persona::{
    environment_for_mood, fallback_response, gif_for_emotion, Emotion, Environment, HistoryEntry,
    SarcasticResponse,
};
pub use session::Session;
pub use storage::{MemStorage, Storage};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
