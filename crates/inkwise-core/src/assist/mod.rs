//! AI hints about the current drawing.
//!
//! A request is the topic's system instruction, the conversation so far and a
//! new user turn carrying a snapshot of the board. Backends turn it into text.

mod gemini;

pub use gemini::GeminiBackend;

use crate::scene::Snapshot;
use crate::storage::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prompt used when the user asks for a hint without typing anything.
pub const DEFAULT_PROMPT: &str = "Take a look at my drawing and give me a helpful hint.";

/// Failure of a generative backend. Network, auth and quota problems are not
/// told apart at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Assistant request failed: {message}")]
pub struct AssistError {
    pub message: String,
}

impl AssistError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type for assistant operations.
pub type AssistResult<T> = Result<T, AssistError>;

/// Subject persona the assistant answers as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    #[default]
    General,
    Math,
    Science,
    Writing,
    Art,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::General,
        Topic::Math,
        Topic::Science,
        Topic::Writing,
        Topic::Art,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Topic::General => "general",
            Topic::Math => "math",
            Topic::Science => "science",
            Topic::Writing => "writing",
            Topic::Art => "art",
        }
    }

    /// System instruction sent ahead of the conversation.
    pub fn instruction(&self) -> &'static str {
        match self {
            Topic::General => {
                "You are a friendly tutor looking at a student's whiteboard. Describe what you \
                 see and give one short, encouraging hint. Do not hand out full solutions."
            }
            Topic::Math => {
                "You are a patient math tutor looking at a student's whiteboard. Check the \
                 working shown, point at the first mistake if there is one, and suggest the \
                 next step without solving the whole problem."
            }
            Topic::Science => {
                "You are a science tutor looking at a student's whiteboard. Relate the sketch \
                 to the underlying concept, correct misconceptions, and ask one guiding question."
            }
            Topic::Writing => {
                "You are a writing coach looking at handwritten notes on a whiteboard. Comment \
                 on structure and clarity and suggest one concrete improvement."
            }
            Topic::Art => {
                "You are an art teacher looking at a sketch on a whiteboard. Comment on \
                 composition, proportion and line work, and suggest one thing to try next."
            }
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topic {
    type Err = AssistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Topic::ALL
            .into_iter()
            .find(|topic| topic.name() == wanted)
            .ok_or_else(|| AssistError::new(format!("unknown topic {s:?}")))
    }
}

/// Who wrote a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub text: String,
    pub sender: Sender,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
        }
    }
}

/// Chronological conversation log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// An image attached to a turn, ready for a text transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl From<&Snapshot> for ImageAttachment {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            mime_type: snapshot.format.mime_type().to_string(),
            data: snapshot.to_base64(),
        }
    }
}

/// A turn as sent to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTurn {
    pub sender: Sender,
    pub text: String,
    pub image: Option<ImageAttachment>,
}

/// Everything a backend needs for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistRequest {
    pub system_instruction: String,
    /// Oldest first; the last turn is the new user turn.
    pub turns: Vec<RequestTurn>,
}

impl AssistRequest {
    /// The turn being asked about.
    pub fn latest(&self) -> Option<&RequestTurn> {
        self.turns.last()
    }
}

/// Build a request. Only the new turn carries the image.
pub fn build_request(
    topic: Topic,
    prior_turns: &[ConversationTurn],
    latest_text: Option<&str>,
    snapshot: &Snapshot,
) -> AssistRequest {
    let mut turns: Vec<RequestTurn> = prior_turns
        .iter()
        .map(|turn| RequestTurn {
            sender: turn.sender,
            text: turn.text.clone(),
            image: None,
        })
        .collect();

    let text = latest_text
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_PROMPT);
    turns.push(RequestTurn {
        sender: Sender::User,
        text: text.to_string(),
        image: Some(ImageAttachment::from(snapshot)),
    });

    AssistRequest {
        system_instruction: topic.instruction().to_string(),
        turns,
    }
}

/// A generative model that answers assist requests.
pub trait AssistBackend: Send + Sync {
    fn generate<'a>(&'a self, request: &'a AssistRequest) -> BoxFuture<'a, AssistResult<String>>;
}
