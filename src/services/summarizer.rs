//! Transcript summarization
//!
//! Single chat call for transcripts that fit in one request; longer inputs
//! are split at word boundaries, each chunk summarized separately, and the
//! partials combined with a second prompt. Token counters aggregate across
//! every call made.

use crate::services::openai::{ChatMessage, ChatOutcome, OpenAiClient, OpenAiError};

// The model takes 128K input tokens; at ~4 chars per token this leaves
// headroom for the system prompt.
const MAX_CHARS_PER_CHUNK: usize = 400_000;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes YouTube video \
     transcripts. Provide a clear, concise summary that captures the key points and main \
     ideas. Use well-structured paragraphs. Do not include timestamps.";

const COMBINE_SYSTEM_PROMPT: &str = "You are a helpful assistant. Combine the following \
     partial summaries of a YouTube video transcript into one coherent, concise summary. \
     Remove redundancies and present the information clearly.";

/// A finished summary with token usage aggregated over all calls.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub content: String,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
}

fn length_instruction(transcript_word_count: usize, length_percent: i64) -> String {
    let target_words = transcript_word_count as i64 * length_percent / 100;
    format!(
        " Your summary should be approximately {target_words} words \
         (about {length_percent}% of the transcript)."
    )
}

/// Summarize a transcript, chunking when it exceeds the per-call limit.
pub async fn generate_summary(
    client: &OpenAiClient,
    transcript_text: &str,
    transcript_word_count: usize,
    length_percent: i64,
) -> Result<SummaryOutcome, OpenAiError> {
    let guidance = length_instruction(transcript_word_count, length_percent);
    let system_prompt = format!("{SYSTEM_PROMPT}{guidance}");

    if transcript_text.len() <= MAX_CHARS_PER_CHUNK {
        let outcome = call(client, &system_prompt, transcript_text).await?;
        return Ok(SummaryOutcome {
            content: outcome.content,
            prompt_tokens: outcome.prompt_tokens,
            completion_tokens: outcome.completion_tokens,
        });
    }

    let mut total_prompt = 0;
    let mut total_completion = 0;
    let mut partials = Vec::new();

    for chunk in split_into_chunks(transcript_text, MAX_CHARS_PER_CHUNK) {
        let outcome = call(client, &system_prompt, &chunk).await?;
        partials.push(outcome.content);
        total_prompt += outcome.prompt_tokens;
        total_completion += outcome.completion_tokens;
    }

    let combine_prompt = format!("{COMBINE_SYSTEM_PROMPT}{guidance}");
    let outcome = call(client, &combine_prompt, &partials.join("\n\n")).await?;
    total_prompt += outcome.prompt_tokens;
    total_completion += outcome.completion_tokens;

    Ok(SummaryOutcome {
        content: outcome.content,
        prompt_tokens: total_prompt,
        completion_tokens: total_completion,
    })
}

async fn call(
    client: &OpenAiClient,
    system_prompt: &str,
    user_content: &str,
) -> Result<ChatOutcome, OpenAiError> {
    let messages = [
        ChatMessage::system(system_prompt),
        ChatMessage::user(user_content),
    ];
    client.chat(&messages, false).await
}

/// Split text into chunks at word boundaries, each at most `max_chars` long.
fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_length = 0;

    for word in text.split_whitespace() {
        let word_len = word.len() + 1;
        if current_length + word_len > max_chars && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            current_length = 0;
        }
        current.push(word);
        current_length += word_len;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn length_instruction_targets_percentage_of_word_count() {
        let instruction = length_instruction(2000, 25);
        assert!(instruction.contains("approximately 500 words"));
        assert!(instruction.contains("25%"));
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(
            split_into_chunks("one two three", 100),
            vec!["one two three"]
        );
    }

    #[test]
    fn chunks_break_at_word_boundaries() {
        let chunks = split_into_chunks("aaa bbb ccc ddd eee", 8);

        assert_eq!(chunks, vec!["aaa bbb", "ccc ddd", "eee"]);
        assert!(chunks.iter().all(|c| c.len() <= 8));
    }

    #[test]
    fn chunking_preserves_every_word() {
        let text = "the quick brown fox jumps over the lazy dog";
        let rejoined = split_into_chunks(text, 12).join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn oversized_single_word_still_lands_in_a_chunk() {
        let chunks = split_into_chunks("supercalifragilistic", 5);
        assert_eq!(chunks, vec!["supercalifragilistic"]);
    }

    #[tokio::test]
    async fn short_transcript_summarizes_in_one_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "A tidy summary."}}],
                "usage": {"prompt_tokens": 300, "completion_tokens": 80}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::with_base_url("test-key", &server.uri());
        let outcome = generate_summary(&client, "some transcript text", 3, 25)
            .await
            .unwrap();

        assert_eq!(outcome.content, "A tidy summary.");
        assert_eq!(outcome.prompt_tokens, 300);
        assert_eq!(outcome.completion_tokens, 80);
    }
}
