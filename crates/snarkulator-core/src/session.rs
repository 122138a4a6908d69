//! Client-side view of a conversation with the persona: the comment feed and the
//! character panel (mood, activity, emoji, environment, busy flag, speech bubble).

use crate::api::CalculateResponse;
use crate::persona::{environment_for_mood, Environment, DEFAULT_GIF};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

pub const IDLE_MOOD: &str = "Waiting";
pub const IDLE_ACTIVITY: &str = "Standing by";
pub const THINKING_BUBBLE: &str = "*sigh*";
pub const ANSWERED_BUBBLE: &str = "*calculating sarcasm*";
pub const FAILURE_NOTICE: &str =
    "Failed to get AI response. The sarcastic AI might be taking a break! 🤖";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub mood: Option<String>,
    pub activity: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub comments: Vec<Comment>,
    pub current_mood: String,
    pub current_activity: String,
    pub current_gif: String,
    pub environment: Environment,
    pub busy: bool,
    pub speech_bubble: Option<String>,
    pub notice: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            comments: Vec::new(),
            current_mood: IDLE_MOOD.to_string(),
            current_activity: IDLE_ACTIVITY.to_string(),
            current_gif: DEFAULT_GIF.to_string(),
            // Office: the environment the panel opens in before any reply.
            environment: environment_for_mood(""),
            busy: false,
            speech_bubble: None,
            notice: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_request(&mut self) {
        self.busy = true;
        self.notice = None;
        self.speech_bubble = Some(THINKING_BUBBLE.to_string());
    }

    pub fn apply(&mut self, reply: &CalculateResponse) {
        let ai = &reply.ai_response;
        self.comments.push(Comment {
            id: ai.stored.id.clone(),
            response: ai.stored.response.clone(),
            timestamp: Utc::now(),
            mood: Some(ai.mood.clone()),
            activity: Some(ai.activity.clone()),
        });
        self.current_mood = ai.mood.clone();
        self.current_activity = ai.activity.clone();
        self.current_gif = ai.gif.clone();
        self.environment = ai.environment.clone();
        self.busy = false;
        self.speech_bubble = Some(ANSWERED_BUBBLE.to_string());
    }

    pub fn fail(&mut self) {
        self.busy = false;
        self.speech_bubble = None;
        self.notice = Some(FAILURE_NOTICE.to_string());
    }

    pub fn response_count(&self) -> usize {
        self.comments.len()
    }

    pub fn status_label(&self) -> &'static str {
        if self.busy {
            "Busy"
        } else {
            "Available"
        }
    }

    /// Plain-text panel for terminal clients.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "[{}] {} | {} ({}) | {} | {} responses\n",
            self.current_gif,
            self.current_mood,
            self.environment.name,
            self.environment.time,
            self.status_label(),
            self.response_count()
        ));
        if let Some(bubble) = &self.speech_bubble {
            out.push_str(&format!("  \"{}\"\n", bubble));
        }
        if self.comments.is_empty() {
            out.push_str("  AI is ready to judge your math...\n");
        }
        for c in &self.comments {
            out.push_str(&format!(
                "  {} {}\n",
                c.timestamp.with_timezone(&Local).format("%H:%M"),
                c.response
            ));
        }
        out.push_str(&format!(
            "  Mood: {}  Activity: {}\n",
            self.current_mood, self.current_activity
        ));
        if let Some(notice) = &self.notice {
            out.push_str(&format!("  ! {}\n", notice));
        }
        out
    }
}
