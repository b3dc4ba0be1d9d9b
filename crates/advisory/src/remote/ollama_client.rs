use std::time::Duration;

use async_trait::async_trait;
use common::config::AdvisorySettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::traits::{AdvisoryError, AdvisoryService};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for a local Ollama server (`/api/generate`, non-streaming).
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(settings: &AdvisorySettings) -> Result<Self, AdvisoryError> {
        let client = Client::builder()
            .user_agent("binance_advisory_bot/0.1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    /// True when the server answers its model listing.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(HEALTH_CHECK_TIMEOUT).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!("Ollama health check answered {}", resp.status());
                false
            }
            Err(e) => {
                warn!("Ollama unreachable at {}: {}", self.base_url, e);
                false
            }
        }
    }
}

#[async_trait]
impl AdvisoryService for OllamaClient {
    async fn ask(&self, prompt: &str, timeout: Duration) -> Result<String, AdvisoryError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        debug!("Asking {} ({} prompt chars)", self.model, prompt.len());

        let resp = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdvisoryError::Timeout(timeout)
                } else {
                    AdvisoryError::Transport(e)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await?;
            error!("Ollama generate failed with {}: {}", status, body);
            return Err(AdvisoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply = resp.json::<GenerateResponse>().await?;
        Ok(reply.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OllamaClient {
        OllamaClient::new(&AdvisorySettings {
            enabled: true,
            base_url: server.uri(),
            model: "deepseek-r1:14b".to_string(),
            temperature: 0.3,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn returns_raw_response_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-r1:14b",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "deepseek-r1:14b",
                "response": "<think>\nlooks fine\n</think>\n\nBUY",
                "done": true
            })))
            .mount(&server)
            .await;

        let reply = client(&server).ask("prompt", Duration::from_secs(5)).await.unwrap();
        assert_eq!(reply, "<think>\nlooks fine\n</think>\n\nBUY");
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "HOLD"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let result = client(&server).ask("prompt", Duration::from_millis(100)).await;
        assert!(matches!(result, Err(AdvisoryError::Timeout(_))));
    }

    #[tokio::test]
    async fn health_check_reports_availability() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
            .mount(&server)
            .await;

        assert!(client(&server).is_available().await);
    }
}
