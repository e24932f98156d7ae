//! Panel-side client for the control API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::errors::BotError;
use crate::domain::traits::{BotControl, BotStatus};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for a running bot's control API
#[derive(Clone)]
pub struct PanelClient {
    client: Client,
    api_url: String,
}

impl PanelClient {
    /// `api_url` is the API root, e.g. `http://localhost:3001/api`
    pub fn new(api_url: impl Into<String>) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BotError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }
}

#[async_trait]
impl BotControl for PanelClient {
    async fn status(&self) -> Result<BotStatus, BotError> {
        let response = self.client
            .get(self.api_url("status"))
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("Control API error: {}", response.status())));
        }

        response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))
    }

    async fn send_message(&self, phone: &str, message: &str) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct Request<'a> {
            phone: &'a str,
            message: &'a str,
        }

        #[derive(Deserialize)]
        struct Failure {
            error: String,
            details: Option<String>,
        }

        let response = self.client
            .post(self.api_url("send-message"))
            .json(&Request { phone, message })
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let reason = match response.json::<Failure>().await {
            Ok(Failure { error, details: Some(details) }) => format!("{}: {}", error, details),
            Ok(Failure { error, details: None }) => error,
            Err(_) => format!("Control API error: {}", status),
        };
        Err(BotError::Provider(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn status_reads_pairing_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "connected": false,
                "qrCode": "2@pairing"
            })))
            .mount(&server)
            .await;

        let client = PanelClient::new(format!("{}/api/", server.uri())).unwrap();
        let status = client.status().await.unwrap();
        assert_eq!(
            status,
            BotStatus { connected: false, qr_code: Some("2@pairing".to_string()) }
        );
    }

    #[tokio::test]
    async fn send_message_surfaces_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/send-message"))
            .and(body_json(json!({ "phone": "595981234567", "message": "hola" })))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "WhatsApp no esta conectado"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PanelClient::new(format!("{}/api", server.uri())).unwrap();
        match client.send_message("595981234567", "hola").await {
            Err(BotError::Provider(msg)) => assert_eq!(msg, "WhatsApp no esta conectado"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
