//! External LLM provider streaming implementations.
//!
//! Each provider streams tokens via SSE from their respective APIs.
//! OpenAI uses `choices[0].delta.content`; Anthropic uses typed events.
//! `complete` drains a stream into a single completion.

use std::pin::Pin;

use docfeedback_core::{Error, Result};
use futures::Stream;
use reqwest::Client;
use serde_json::{json, Value};
use tokio_stream::StreamExt;
use tracing::{debug, error};

use crate::types::{ChatMessage, Completion, LLMProvider};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Boxed stream type for returning different stream implementations.
pub type BoxedStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// A single streamed token or error.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Token(String),
    Done { tokens_used: usize },
    Error(String),
}

/// Stream tokens from the appropriate provider.
pub fn stream_llm(
    client: &Client,
    provider: LLMProvider,
    messages: Vec<ChatMessage>,
    model: &str,
    api_key: &str,
    temperature: f64,
    max_tokens: usize,
) -> BoxedStream {
    match provider {
        LLMProvider::OpenAI => Box::pin(stream_openai(
            client.clone(),
            openai_body(&messages, model, temperature, max_tokens),
            api_key.to_string(),
        )),
        LLMProvider::Anthropic => Box::pin(stream_anthropic(
            client.clone(),
            anthropic_body(&messages, model, temperature, max_tokens),
            api_key.to_string(),
        )),
    }
}

/// Run one completion and collect every token into a single string.
pub async fn complete(
    client: &Client,
    provider: LLMProvider,
    messages: Vec<ChatMessage>,
    model: &str,
    api_key: &str,
    temperature: f64,
    max_tokens: usize,
) -> Result<Completion> {
    let stream = stream_llm(client, provider, messages, model, api_key, temperature, max_tokens);
    collect_stream(stream).await
}

/// Drain a token stream. The first error chunk aborts the collection.
pub async fn collect_stream<S>(stream: S) -> Result<Completion>
where
    S: Stream<Item = StreamChunk>,
{
    tokio::pin!(stream);

    let mut text = String::new();
    let mut tokens_used = 0;

    while let Some(chunk) = stream.next().await {
        match chunk {
            StreamChunk::Token(token) => text.push_str(&token),
            StreamChunk::Done { tokens_used: t } => {
                tokens_used = t;
                break;
            }
            StreamChunk::Error(e) => return Err(Error::Generation(e)),
        }
    }

    if text.trim().is_empty() {
        return Err(Error::Generation("Provider returned an empty completion".into()));
    }

    Ok(Completion { text, tokens_used })
}

fn openai_body(messages: &[ChatMessage], model: &str, temperature: f64, max_tokens: usize) -> Value {
    let msgs: Vec<Value> = messages
        .iter()
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    json!({
        "model": model,
        "messages": msgs,
        "temperature": temperature,
        "max_tokens": max_tokens,
        "stream": true,
    })
}

fn anthropic_body(
    messages: &[ChatMessage],
    model: &str,
    temperature: f64,
    max_tokens: usize,
) -> Value {
    // Anthropic takes the system prompt as a top-level field
    let system_msg: Option<&str> = messages
        .iter()
        .find(|m| m.role == "system")
        .map(|m| m.content.as_str());

    let conv_msgs: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    let mut body = json!({
        "model": model,
        "messages": conv_msgs,
        "temperature": temperature,
        "max_tokens": max_tokens,
        "stream": true,
    });

    if let Some(sys) = system_msg {
        body["system"] = json!(sys);
    }
    body
}

/// Interpret one OpenAI SSE `data:` payload.
fn openai_event(data: &str, token_count: usize) -> Option<StreamChunk> {
    if data.trim() == "[DONE]" {
        return Some(StreamChunk::Done {
            tokens_used: token_count,
        });
    }
    let parsed: Value = serde_json::from_str(data).ok()?;
    parsed["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|c| !c.is_empty())
        .map(|c| StreamChunk::Token(c.to_string()))
}

/// Interpret one Anthropic SSE `data:` payload.
fn anthropic_event(data: &str, token_count: usize) -> Option<StreamChunk> {
    let parsed: Value = serde_json::from_str(data).ok()?;
    match parsed["type"].as_str() {
        Some("content_block_delta") => parsed["delta"]["text"]
            .as_str()
            .filter(|t| !t.is_empty())
            .map(|t| StreamChunk::Token(t.to_string())),
        Some("message_stop") => Some(StreamChunk::Done {
            tokens_used: token_count,
        }),
        Some("error") => {
            let msg = parsed["error"]["message"]
                .as_str()
                .unwrap_or("Unknown error");
            error!("Anthropic error: {}", msg);
            Some(StreamChunk::Error(msg.to_string()))
        }
        _ => None,
    }
}

fn stream_openai(
    client: Client,
    body: Value,
    api_key: String,
) -> impl Stream<Item = StreamChunk> + Send + 'static {
    async_stream::stream! {
        debug!("Streaming from OpenAI with model {}", body["model"]);

        let request = client
            .post(OPENAI_CHAT_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body);

        for await chunk in sse_events(request, openai_event) {
            yield chunk;
        }
    }
}

fn stream_anthropic(
    client: Client,
    body: Value,
    api_key: String,
) -> impl Stream<Item = StreamChunk> + Send + 'static {
    async_stream::stream! {
        debug!("Streaming from Anthropic with model {}", body["model"]);

        let request = client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body);

        for await chunk in sse_events(request, anthropic_event) {
            yield chunk;
        }
    }
}

/// Send the request and turn its SSE body into chunks using `interpret`.
fn sse_events(
    request: reqwest::RequestBuilder,
    interpret: fn(&str, usize) -> Option<StreamChunk>,
) -> impl Stream<Item = StreamChunk> + Send + 'static {
    async_stream::stream! {
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                yield StreamChunk::Error(format!("Request failed: {}", e));
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            yield StreamChunk::Error(format!("API error {}: {}", status, body));
            return;
        }

        let mut stream = response.bytes_stream();
        // Bytes, not text: a multi-byte character can straddle two chunks.
        let mut buffer: Vec<u8> = Vec::new();
        let mut token_count = 0usize;

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(b) => b,
                Err(e) => {
                    yield StreamChunk::Error(format!("Stream read error: {}", e));
                    return;
                }
            };

            buffer.extend_from_slice(&bytes);

            // Process complete SSE lines
            while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                let line = String::from_utf8_lossy(&raw).trim().to_string();

                if line.is_empty() || line.starts_with(':') {
                    continue;
                }

                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };

                match interpret(data, token_count) {
                    Some(StreamChunk::Token(text)) => {
                        token_count += 1;
                        yield StreamChunk::Token(text);
                    }
                    Some(terminal @ (StreamChunk::Done { .. } | StreamChunk::Error(_))) => {
                        yield terminal;
                        return;
                    }
                    None => {}
                }
            }
        }

        yield StreamChunk::Done { tokens_used: token_count };
    }
}

/// Test an API key by making a minimal request.
pub async fn test_api_key(provider: &str, api_key: &str) -> std::result::Result<(), String> {
    let client = Client::new();

    match provider {
        "openai" => {
            let resp = client
                .get("https://api.openai.com/v1/models")
                .header("Authorization", format!("Bearer {}", api_key))
                .send()
                .await
                .map_err(|e| e.to_string())?;
            if resp.status().is_success() {
                Ok(())
            } else {
                Err(format!("API returned status {}", resp.status()))
            }
        }
        "anthropic" => {
            let resp = client
                .post(ANTHROPIC_MESSAGES_URL)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("Content-Type", "application/json")
                .json(&json!({
                    "model": "claude-3-5-haiku-20241022",
                    "max_tokens": 1,
                    "messages": [{"role": "user", "content": "Hi"}],
                }))
                .send()
                .await
                .map_err(|e| e.to_string())?;
            // 400 with a valid key is a quota/model issue, not an auth one
            if resp.status().is_success() || resp.status().as_u16() == 400 {
                Ok(())
            } else {
                Err(format!("API returned status {}", resp.status()))
            }
        }
        _ => Err(format!("Unknown provider: {}", provider)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("당신은 논설문 평가 전문가입니다."),
            ChatMessage::user("평가해주세요"),
        ]
    }

    #[test]
    fn test_openai_body_keeps_system_message_inline() {
        let body = openai_body(&messages(), "gpt-4o-mini", 0.7, 500);
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn test_anthropic_body_lifts_system_prompt() {
        let body = anthropic_body(&messages(), "claude-sonnet-4-20250514", 0.7, 3000);
        assert_eq!(body["system"], "당신은 논설문 평가 전문가입니다.");
        let msgs = body["messages"].as_array().unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0]["role"], "user");
    }

    #[test]
    fn test_openai_events() {
        let token = openai_event(r#"{"choices":[{"delta":{"content":"좋은"}}]}"#, 0);
        assert_eq!(token, Some(StreamChunk::Token("좋은".into())));

        let empty = openai_event(r#"{"choices":[{"delta":{}}]}"#, 3);
        assert_eq!(empty, None);

        let done = openai_event("[DONE]", 7);
        assert_eq!(done, Some(StreamChunk::Done { tokens_used: 7 }));
    }

    #[test]
    fn test_anthropic_events() {
        let token = anthropic_event(
            r#"{"type":"content_block_delta","delta":{"type":"text_delta","text":"글"}}"#,
            0,
        );
        assert_eq!(token, Some(StreamChunk::Token("글".into())));

        let stop = anthropic_event(r#"{"type":"message_stop"}"#, 4);
        assert_eq!(stop, Some(StreamChunk::Done { tokens_used: 4 }));

        let err = anthropic_event(r#"{"type":"error","error":{"message":"overloaded"}}"#, 0);
        assert_eq!(err, Some(StreamChunk::Error("overloaded".into())));

        assert_eq!(anthropic_event(r#"{"type":"ping"}"#, 0), None);
    }

    #[tokio::test]
    async fn test_collect_stream_joins_tokens() {
        let chunks = futures::stream::iter(vec![
            StreamChunk::Token("구조가 ".into()),
            StreamChunk::Token("명확합니다.".into()),
            StreamChunk::Done { tokens_used: 2 },
        ]);
        let completion = collect_stream(chunks).await.unwrap();
        assert_eq!(completion.text, "구조가 명확합니다.");
        assert_eq!(completion.tokens_used, 2);
    }

    #[tokio::test]
    async fn test_collect_stream_surfaces_error() {
        let chunks = futures::stream::iter(vec![
            StreamChunk::Token("partial".into()),
            StreamChunk::Error("API error 429: rate limited".into()),
        ]);
        let err = collect_stream(chunks).await.unwrap_err();
        assert!(matches!(err, Error::Generation(ref m) if m.contains("429")));
    }

    #[tokio::test]
    async fn test_collect_stream_rejects_empty_completion() {
        let chunks = futures::stream::iter(vec![StreamChunk::Done { tokens_used: 0 }]);
        assert!(collect_stream(chunks).await.is_err());
    }
}
