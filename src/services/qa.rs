//! Question answering over a transcript
//!
//! The transcript is embedded in the system prompt, followed by the running
//! conversation history and the new question.

use crate::models::QaMessage;
use crate::services::openai::{ChatMessage, OpenAiClient, OpenAiError};

const SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about a \
     YouTube video transcript. Use only the transcript content to answer. Be concise \
     and accurate.\n\nTranscript:\n";

pub async fn ask_question(
    client: &OpenAiClient,
    transcript: &str,
    question: &str,
    history: &[QaMessage],
) -> Result<String, OpenAiError> {
    let messages = build_messages(transcript, question, history);
    let outcome = client.chat(&messages, false).await?;
    Ok(outcome.content)
}

fn build_messages(transcript: &str, question: &str, history: &[QaMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(format!("{SYSTEM_PROMPT}{transcript}")));
    for message in history {
        messages.push(ChatMessage::new(&message.role, message.content.clone()));
    }
    messages.push(ChatMessage::user(question));
    messages
}
