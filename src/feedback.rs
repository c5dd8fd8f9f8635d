//! One-line coaching feedback from a chat-completions endpoint.
//!
//! The generator is best effort: any failure is logged and replaced by one of
//! the built-in encouragement lines so insights are never held back by it.

use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{FocusInsights, FocusTrack, FocusWindow};

pub const DEFAULT_FEEDBACKS: [&str; 10] = [
    "Great work! Keep it up and the results will follow 😊",
    "You gave it your best today! Let's make tomorrow even better!",
    "Nice! Your effort is going to pay off!",
    "You're doing well! Don't forget to take short breaks!",
    "Your focus is seriously impressive! Keep going!",
    "You've done great so far! Keep pushing!",
    "Small steps add up to big growth!",
    "Love how focused you are! Keep the streak alive!",
    "A round of applause for your effort! We're cheering for you!",
    "Today's progress matters too! Looking forward to tomorrow!",
];

const SYSTEM_PROMPT: &str = "You are a productivity coach grounded in psychology. \
Do not repeat the time ranges you are given. Write at most two friendly sentences: \
one about what likely drives the rises and dips in focus, and one concrete tip or \
cheer that includes a number. Use a warm tone and a few emoji.";

/// Inputs the generator sees.
#[derive(Debug, Clone)]
pub struct FeedbackRequest {
    pub best: FocusWindow,
    pub worst: FocusWindow,
    pub avg_duration_minutes: i64,
    pub track: FocusTrack,
}

impl FeedbackRequest {
    pub fn from_insights(insights: &FocusInsights) -> Self {
        Self {
            best: insights.best_window.clone(),
            worst: insights.worst_window.clone(),
            avg_duration_minutes: insights.avg_focus_duration_minutes,
            track: insights.focus_track.clone(),
        }
    }

    fn user_prompt(&self) -> String {
        format!(
            "Best focus window: {}~{} (average score {})\n\
             Worst focus window: {}~{} (average score {})\n\
             Average sustained focus: {} minutes\n\
             Hourly focus scores: {:?}\n\
             Using this data, and without mentioning times, write at most two \
             sentences covering likely causes and a practical tip or encouragement.",
            self.best.start,
            self.best.end,
            self.best.avg_focus_score,
            self.worst.start,
            self.worst.end,
            self.worst.avg_focus_score,
            self.avg_duration_minutes,
            self.track.scores,
        )
    }
}

#[allow(async_fn_in_trait)]
pub trait FeedbackSource {
    async fn generate(&self, request: &FeedbackRequest) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

pub struct ChatFeedbackClient {
    http_client: reqwest::Client,
    url: String,
    model: String,
}

impl ChatFeedbackClient {
    pub fn new(config: FeedbackConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {api_key}"))
                    .map_err(|e| Error::Feedback(format!("invalid api key: {e}")))?,
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            url: format!("{}/v1/chat/completions", config.endpoint.trim_end_matches('/')),
            model: config.model,
        })
    }
}

impl FeedbackSource for ChatFeedbackClient {
    async fn generate(&self, request: &FeedbackRequest) -> Result<String> {
        let user_prompt = request.user_prompt();
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            max_tokens: 4096,
            temperature: 0.3,
        };

        tracing::debug!(url = %self.url, model = %self.model, "Requesting focus feedback");
        let response = self.http_client.post(&self.url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(Error::Feedback(format!("API error ({status}): {error_text}")));
        }

        let parsed: ChatResponse = response.json().await?;
        extract_content(parsed)
    }
}

fn extract_content(response: ChatResponse) -> Result<String> {
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(Error::Feedback("empty completion".to_string()));
    }
    Ok(content)
}

pub fn default_feedback() -> &'static str {
    DEFAULT_FEEDBACKS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(DEFAULT_FEEDBACKS[0])
}

/// Ask the source for feedback, falling back to a default line on any failure
/// or when no source is configured.
pub async fn feedback_or_default<S: FeedbackSource>(
    source: Option<&S>,
    request: &FeedbackRequest,
) -> String {
    let Some(source) = source else {
        tracing::warn!("No feedback generator configured, using default");
        return default_feedback().to_string();
    };

    match source.generate(request).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, "Feedback generation failed, using default");
            default_feedback().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging;

    struct FixedSource(String);

    impl FeedbackSource for FixedSource {
        async fn generate(&self, _request: &FeedbackRequest) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl FeedbackSource for FailingSource {
        async fn generate(&self, _request: &FeedbackRequest) -> Result<String> {
            Err(Error::Feedback("upstream timed out".to_string()))
        }
    }

    fn request() -> FeedbackRequest {
        let window = |start: &str, end: &str, score| FocusWindow {
            start: start.to_string(),
            end: end.to_string(),
            avg_focus_score: score,
        };
        FeedbackRequest {
            best: window("09:00", "11:00", 91),
            worst: window("15:00", "17:00", 32),
            avg_duration_minutes: 14,
            track: FocusTrack {
                labels: (0..24).map(|h| format!("{h:02}")).collect(),
                scores: vec![0; 24],
            },
        }
    }

    #[tokio::test]
    async fn uses_generated_text_when_available() {
        let source = FixedSource("Keep a steady sleep schedule 😴".to_string());
        let text = feedback_or_default(Some(&source), &request()).await;
        assert_eq!(text, "Keep a steady sleep schedule 😴");
    }

    #[tokio::test]
    async fn failure_falls_back_to_a_default_line() {
        logging::init_test();
        let text = feedback_or_default(Some(&FailingSource), &request()).await;
        assert!(DEFAULT_FEEDBACKS.contains(&text.as_str()));
    }

    #[tokio::test]
    async fn missing_source_falls_back_to_a_default_line() {
        logging::init_test();
        let text = feedback_or_default(None::<&FailingSource>, &request()).await;
        assert!(DEFAULT_FEEDBACKS.contains(&text.as_str()));
    }

    #[test]
    fn prompt_carries_windows_and_duration() {
        let prompt = request().user_prompt();
        assert!(prompt.contains("09:00~11:00 (average score 91)"));
        assert!(prompt.contains("15:00~17:00 (average score 32)"));
        assert!(prompt.contains("14 minutes"));
    }

    #[test]
    fn extracts_trimmed_first_choice() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Take a walk 🔋\n"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(parsed).unwrap(), "Take a walk 🔋");
    }

    #[test]
    fn empty_completion_is_an_error() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(extract_content(parsed), Err(Error::Feedback(_))));
    }

    fn client_for(server: &mockito::Server) -> ChatFeedbackClient {
        ChatFeedbackClient::new(FeedbackConfig {
            endpoint: format!("{}/", server.url()),
            api_key: Some("test-key".to_string()),
            model: "coach-small".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn client_posts_chat_request_and_returns_trimmed_content() {
        let reply = r#"{"choices":[{"message":{"content":"  Stretch every 50 minutes 🧘\n"}}]}"#;
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "coach-small",
                "max_tokens": 4096,
                "temperature": 0.3,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply)
            .create_async()
            .await;

        let text = client_for(&server).generate(&request()).await.unwrap();

        assert_eq!(text, "Stretch every 50 minutes 🧘");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_reported_and_replaced_by_default() {
        logging::init_test();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("overloaded")
            .expect(2)
            .create_async()
            .await;
        let client = client_for(&server);

        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(&err, Error::Feedback(msg) if msg.contains("overloaded")));

        let text = feedback_or_default(Some(&client), &request()).await;
        assert!(DEFAULT_FEEDBACKS.contains(&text.as_str()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_reply_is_a_transport_error_and_replaced_by_default() {
        logging::init_test();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("not json")
            .expect(2)
            .create_async()
            .await;
        let client = client_for(&server);

        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));

        let text = feedback_or_default(Some(&client), &request()).await;
        assert!(DEFAULT_FEEDBACKS.contains(&text.as_str()));
        mock.assert_async().await;
    }
}
