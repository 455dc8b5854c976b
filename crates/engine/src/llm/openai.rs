use serde::{Deserialize, Serialize};

use super::types::{LlmResponse, TokenUsage};
use super::LlmError;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: ChatUsage,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

/// Send a single chat completion request. One attempt — the caller (the
/// scoring worker) owns retry/backoff so job state transitions stay
/// externally visible (§4.5, §4.8).
pub async fn send_chat_completion(
    http: &reqwest::Client,
    api_key: &str,
    model: &str,
    prompt: &str,
    timeout: std::time::Duration,
) -> Result<LlmResponse, LlmError> {
    let start = std::time::Instant::now();

    let request = ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
    };

    let response = http
        .post(OPENAI_CHAT_URL)
        .bearer_auth(api_key)
        .timeout(timeout)
        .json(&request)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Http(e.to_string())
            }
        })?;

    let status = response.status();
    let latency = start.elapsed().as_secs_f64();
    metrics::histogram!("llm.api.latency", "provider" => "openai", "model" => model.to_string())
        .record(latency);

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Auth(format!("{}: {}", status, body)));
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(LlmError::RateLimited { retry_after });
    }

    if status.is_server_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::ServerError(format!("{}: {}", status, body)));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let msg = serde_json::from_str::<OpenAiError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(LlmError::BadRequest(format!("{}: {}", status, msg)));
    }

    let body: ChatResponse = response
        .json()
        .await
        .map_err(|e| LlmError::Parse(format!("failed to parse OpenAI response: {}", e)))?;

    let text = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    metrics::counter!("llm.api.input_tokens", "provider" => "openai")
        .increment(body.usage.prompt_tokens);
    metrics::counter!("llm.api.output_tokens", "provider" => "openai")
        .increment(body.usage.completion_tokens);

    Ok(LlmResponse {
        text,
        usage: TokenUsage {
            input_tokens: body.usage.prompt_tokens,
            output_tokens: body.usage.completion_tokens,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_completion() {
        let json = r#"{
            "choices": [{"message": {"content": "{\"score\": 8}"}}],
            "usage": {"prompt_tokens": 42, "completion_tokens": 9}
        }"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("{\"score\": 8}"));
        assert_eq!(resp.usage.prompt_tokens, 42);
    }
}
