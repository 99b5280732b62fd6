//! Conversation transcript owned by an agent.

use std::collections::HashSet;

use thiserror::Error;

use crate::llm::ChatMessage;

/// A violation of the transcript ordering rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("system message at index {0}; it must be the first message")]
    MisplacedSystem(usize),

    #[error("tool result at index {index} answers unknown tool call '{id}'")]
    UnexpectedToolResult { index: usize, id: String },

    #[error("tool call '{id}' from the assistant message at index {index} was never answered")]
    UnansweredToolCall { index: usize, id: String },

    #[error("assistant message at index {0} requested tools but no assistant reply followed")]
    MissingReply(usize),
}

/// Ordered message history, seeded with the system prompt when one is set.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    system_prompt: Option<String>,
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new(system_prompt: Option<String>) -> Self {
        let mut transcript = Self {
            system_prompt: system_prompt.filter(|p| !p.is_empty()),
            messages: Vec::new(),
        };
        transcript.reset();
        transcript
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Drop all history, keeping only the system message.
    pub fn reset(&mut self) {
        self.messages.clear();
        if let Some(prompt) = &self.system_prompt {
            self.messages.push(ChatMessage::system(prompt.clone()));
        }
    }

    /// Check the ordering rules of a completed conversation.
    ///
    /// A system message may only appear first. Every tool result must answer
    /// a pending call of the preceding assistant message, and an assistant
    /// message that requested tools must be followed, once all of its calls
    /// are answered, by another assistant message.
    pub fn validate(&self) -> Result<(), TranscriptError> {
        let mut pending: HashSet<&str> = HashSet::new();
        let mut requester: Option<usize> = None;

        for (index, message) in self.messages.iter().enumerate() {
            match message {
                ChatMessage::System { .. } if index != 0 => {
                    return Err(TranscriptError::MisplacedSystem(index));
                }
                ChatMessage::System { .. } => {}
                ChatMessage::User { .. } => {
                    if let Some(at) = requester {
                        return Err(unanswered_or_missing(at, &pending));
                    }
                }
                ChatMessage::Tool { tool_call_id, .. } => {
                    if !pending.remove(tool_call_id.as_str()) {
                        return Err(TranscriptError::UnexpectedToolResult {
                            index,
                            id: tool_call_id.clone(),
                        });
                    }
                }
                ChatMessage::Assistant { tool_calls, .. } => {
                    if let Some(at) = requester {
                        if !pending.is_empty() {
                            return Err(unanswered_or_missing(at, &pending));
                        }
                    }
                    pending = tool_calls.iter().map(|c| c.id.as_str()).collect();
                    requester = (!tool_calls.is_empty()).then_some(index);
                }
            }
        }

        match requester {
            Some(at) => Err(unanswered_or_missing(at, &pending)),
            None => Ok(()),
        }
    }
}

fn unanswered_or_missing(index: usize, pending: &HashSet<&str>) -> TranscriptError {
    let mut ids: Vec<&str> = pending.iter().copied().collect();
    ids.sort_unstable();
    match ids.first() {
        Some(id) => TranscriptError::UnansweredToolCall {
            index,
            id: id.to_string(),
        },
        None => TranscriptError::MissingReply(index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatResponse, ToolCall};

    fn calls(ids: &[&str]) -> ChatMessage {
        ChatResponse::with_tool_calls(ids.iter().map(|id| ToolCall::new(*id, "t", "{}")).collect())
            .into_message()
    }

    fn result(id: &str) -> ChatMessage {
        ChatMessage::tool_result(&ToolCall::new(id, "t", "{}"), "ok")
    }

    fn transcript(messages: Vec<ChatMessage>) -> Transcript {
        let mut t = Transcript::new(None);
        for m in messages {
            t.push(m);
        }
        t
    }

    #[test]
    fn seeded_with_system_prompt() {
        let t = Transcript::new(Some("be nice".to_string()));
        assert_eq!(t.messages(), &[ChatMessage::system("be nice")]);
    }

    #[test]
    fn empty_prompt_is_no_prompt() {
        let t = Transcript::new(Some(String::new()));
        assert!(t.is_empty());
        assert_eq!(t.system_prompt(), None);
    }

    #[test]
    fn reset_keeps_only_system() {
        let mut t = Transcript::new(Some("sys".to_string()));
        t.push(ChatMessage::user("a"));
        t.push(ChatMessage::assistant("b"));
        t.reset();
        assert_eq!(t.messages(), &[ChatMessage::system("sys")]);

        let mut bare = Transcript::new(None);
        bare.push(ChatMessage::user("a"));
        bare.reset();
        assert!(bare.is_empty());
    }

    #[test]
    fn complete_tool_round_is_valid() {
        let t = transcript(vec![
            ChatMessage::user("q"),
            calls(&["1", "2"]),
            result("1"),
            result("2"),
            ChatMessage::assistant("done"),
        ]);
        assert_eq!(t.validate(), Ok(()));
    }

    #[test]
    fn misplaced_system_rejected() {
        let t = transcript(vec![ChatMessage::user("q"), ChatMessage::system("late")]);
        assert_eq!(t.validate(), Err(TranscriptError::MisplacedSystem(1)));
    }

    #[test]
    fn unknown_result_id_rejected() {
        let t = transcript(vec![ChatMessage::user("q"), calls(&["1"]), result("9")]);
        assert_eq!(
            t.validate(),
            Err(TranscriptError::UnexpectedToolResult {
                index: 2,
                id: "9".to_string()
            })
        );
    }

    #[test]
    fn unanswered_call_rejected() {
        let t = transcript(vec![
            ChatMessage::user("q"),
            calls(&["1", "2"]),
            result("1"),
            ChatMessage::assistant("done"),
        ]);
        assert_eq!(
            t.validate(),
            Err(TranscriptError::UnansweredToolCall {
                index: 1,
                id: "2".to_string()
            })
        );
    }

    #[test]
    fn missing_reply_rejected() {
        let t = transcript(vec![ChatMessage::user("q"), calls(&["1"]), result("1")]);
        assert_eq!(t.validate(), Err(TranscriptError::MissingReply(1)));
    }
}
