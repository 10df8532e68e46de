use rand::seq::SliceRandom;
use serde_json::Value;

use crate::vendor::{ChatMessage, ChatRequest};

/// Topics the generated conversation instructions are drawn from
pub const TOPICS: [&str; 15] = [
    "travel",
    "cooking",
    "movies",
    "music",
    "books",
    "sports",
    "technology",
    "the weather",
    "pets",
    "hobbies",
    "food",
    "science",
    "history",
    "art",
    "nature",
];

/// Returned when the completion carries no usable content
pub const FALLBACK_INSTRUCTION: &str = "No instruction generated.";

const PROMPT_MODEL: &str = "gpt-3.5-turbo";
const PROMPT_MAX_TOKENS: u32 = 150;
const PROMPT_TEMPERATURE: f32 = 0.7;

/// Pick one topic uniformly at random
pub fn pick_topic() -> &'static str {
    TOPICS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(TOPICS[0])
}

/// Fixed prompt template with the topic substituted
pub fn build_prompt(topic: &str) -> String {
    format!(
        "Write a short instruction for a voice assistant that should start \
         a friendly spoken conversation about {}. Keep it to one or two \
         sentences and address the assistant directly.",
        topic
    )
}

/// Chat-completion request for one instruction
pub fn chat_request(topic: &str) -> ChatRequest {
    ChatRequest {
        model: PROMPT_MODEL.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: build_prompt(topic),
        }],
        max_tokens: PROMPT_MAX_TOKENS,
        temperature: PROMPT_TEMPERATURE,
        n: 1,
    }
}

/// Extract the first choice's message content, trimmed, falling back to
/// [`FALLBACK_INSTRUCTION`] when absent or empty
pub fn extract_instruction(body: &Value) -> String {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_INSTRUCTION.to_string())
}
