//! The sarcastic calculator voice: emotions, moods, environments and the prompt.
//! Builds the system instruction sent to the model, and maps what comes back
//! (emotion, mood) onto the character emoji and a themed environment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How many past calculations are quoted back to the model.
pub const HISTORY_CONTEXT_LEN: usize = 3;

/// Emoji shown when the emotion is unknown (and for `excited`).
pub const DEFAULT_GIF: &str = "🤖";

/// The six moods the model is allowed to answer with. Parsed case-insensitively,
/// from JSON and from stored tags alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Sarcastic,
    Annoyed,
    Bored,
    Excited,
    Judgmental,
    Condescending,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Sarcastic,
        Emotion::Annoyed,
        Emotion::Bored,
        Emotion::Excited,
        Emotion::Judgmental,
        Emotion::Condescending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Sarcastic => "sarcastic",
            Emotion::Annoyed => "annoyed",
            Emotion::Bored => "bored",
            Emotion::Excited => "excited",
            Emotion::Judgmental => "judgmental",
            Emotion::Condescending => "condescending",
        }
    }

    pub fn gif(&self) -> &'static str {
        match self {
            Emotion::Sarcastic => "🙄",
            Emotion::Annoyed => "😤",
            Emotion::Bored => "😴",
            Emotion::Excited => DEFAULT_GIF,
            Emotion::Judgmental => "🤨",
            Emotion::Condescending => "😏",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == needle)
            .ok_or_else(|| format!("unknown emotion: {}", s))
    }
}

impl<'de> Deserialize<'de> for Emotion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// What the model returns for one expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarcasticResponse {
    /// The persona's answer; may be deliberately wrong ("2000", "potato").
    pub ai_result: String,
    pub response: String,
    pub emotion: Emotion,
    pub mood: String,
    pub activity: String,
}

/// One earlier calculation, quoted back to the model as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub expression: String,
    pub result: String,
}

/// Themed background for the character panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub time: String,
    pub background: String,
}

const ENVIRONMENTS: [(&str, &str, &str); 5] = [
    (
        "Office",
        "Working Hours",
        "https://images.unsplash.com/photo-1497366216548-37526070297c?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&h=600",
    ),
    (
        "Bedroom",
        "Rest Time",
        "https://images.unsplash.com/photo-1586023492125-27b2c045efd7?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&h=600",
    ),
    (
        "Garden",
        "Fresh Air Break",
        "https://images.unsplash.com/photo-1416879595882-3373a0480b5b?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&h=600",
    ),
    (
        "Living Room",
        "Leisure Time",
        "https://images.unsplash.com/photo-1586023492125-27b2c045efd7?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&h=600",
    ),
    (
        "Laboratory",
        "Research Mode",
        "https://images.unsplash.com/photo-1582719471384-894fbb16e074?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&h=600",
    ),
];

/// All environments, in selection order.
pub fn environments() -> Vec<Environment> {
    ENVIRONMENTS
        .iter()
        .map(|(name, time, background)| Environment {
            name: name.to_string(),
            time: time.to_string(),
            background: background.to_string(),
        })
        .collect()
}

/// Emoji for an emotion tag as stored (free-form string). Unknown tags get [`DEFAULT_GIF`].
pub fn gif_for_emotion(emotion: &str) -> &'static str {
    emotion
        .parse::<Emotion>()
        .map(|e| e.gif())
        .unwrap_or(DEFAULT_GIF)
}

/// Picks an environment from the mood text. Sum of UTF-16 code units modulo the
/// number of environments, so the same mood always lands in the same room.
pub fn environment_for_mood(mood: &str) -> Environment {
    let sum: u64 = mood.encode_utf16().map(u64::from).sum();
    let (name, time, background) = ENVIRONMENTS[(sum % ENVIRONMENTS.len() as u64) as usize];
    Environment {
        name: name.to_string(),
        time: time.to_string(),
        background: background.to_string(),
    }
}

/// Context line for the last few calculations.
pub fn history_context(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "This is the first calculation.".to_string();
    }
    let start = history.len().saturating_sub(HISTORY_CONTEXT_LEN);
    let recent: Vec<String> = history[start..]
        .iter()
        .map(|h| format!("{} = {}", h.expression, h.result))
        .collect();
    format!("Recent calculations: {}", recent.join(", "))
}

/// System instruction for one request.
pub fn system_prompt(expression: &str, history: &[HistoryEntry]) -> String {
    let emotions: Vec<String> = Emotion::ALL.iter().map(|e| format!("'{}'", e)).collect();
    format!(
        "You are a sarcastic AI calculator assistant. Your personality is witty, condescending, and slightly annoyed at having to do basic math.

The user is asking you to calculate \"{expression}\". You can choose to give the correct answer OR deliberately give a wrong answer to express your frustration/sarcasm.

Context: {context}

Consider these factors:
- For simple calculations like 2+2 or 1+1, you might give hilariously wrong answers like \"2000\" or \"potato\" to show your annoyance
- For complex calculations, you might give the right answer but with maximum sarcasm
- Whether the user made errors or got unusual results
- Patterns in their calculation history
- Whether they're doing repetitive or pointless calculations

Examples of frustrating responses:
- 2+2: Give \"2000\" with comment \"WHAT THE HELL DID YOU THINK IT WOULD BE?\"
- 1+1: Give \"purple\" with comment \"Oh sure, let me just solve the mysteries of the universe for you\"
- Simple math: Give absurd answers to show your disdain
- Complex math: Give correct answers but be extremely sarcastic

Respond with JSON containing:
- aiResult: Your answer to the calculation (can be correct OR deliberately wrong/absurd)
- response: Your sarcastic comment about the calculation
- emotion: one of {emotions}
- mood: A brief mood description
- activity: What the AI character is currently doing (be creative and fun)",
        expression = expression,
        context = history_context(history),
        emotions = emotions.join(", "),
    )
}

/// Returned whenever the model call or its parse fails.
pub fn fallback_response() -> SarcasticResponse {
    SarcasticResponse {
        ai_result: "ERROR".to_string(),
        response: "Well, that calculation broke my circuits. How delightfully incompetent! 🙄"
            .to_string(),
        emotion: Emotion::Annoyed,
        mood: "Frustrated".to_string(),
        activity: "Contemplating the futility of existence".to_string(),
    }
}
