//! Oracle APEX REST client
//!
//! One client serves the customer directory used by the bot, the panel
//! login and the article report. All paths hang off `apex.base-url`
//! except login, which has its own URL.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::errors::{BotError, DirectoryError};
use crate::domain::entities::{Article, ArticleQuery, CustomerProfile};
use crate::domain::traits::{ArticleSource, AuthGrant, Authenticator, CustomerDirectory};
use crate::infrastructure::config::ApexConfig;

/// APEX REST client
#[derive(Clone)]
pub struct ApexClient {
    client: Client,
    base_url: String,
    auth_url: String,
}

impl ApexClient {
    pub fn new(config: &ApexConfig) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BotError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_url: config.auth_url.clone(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl CustomerDirectory for ApexClient {
    async fn lookup(&self, phone: &str) -> Result<Option<CustomerProfile>, DirectoryError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(default)]
            success: bool,
            #[serde(flatten)]
            profile: CustomerProfile,
        }

        let url = self.api_url(&format!("clientes/{}", phone));
        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        // The payload decides, not the status code
        let data: Response = response
            .json()
            .await
            .map_err(|e| DirectoryError::Decode(e.to_string()))?;

        Ok(data.success.then_some(data.profile))
    }

    async fn update_discount(&self, phone: &str, discount: f64) -> Result<bool, DirectoryError> {
        #[derive(Serialize)]
        struct Request<'a> {
            telefono: &'a str,
            descuento: f64,
        }

        #[derive(Deserialize)]
        struct Response {
            #[serde(default)]
            success: bool,
        }

        let url = self.api_url("clientes/descuento");
        let response = self.client
            .post(&url)
            .json(&Request { telefono: phone, descuento: discount })
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        let data: Response = response
            .json()
            .await
            .map_err(|e| DirectoryError::Decode(e.to_string()))?;

        Ok(data.success)
    }
}

#[async_trait]
impl Authenticator for ApexClient {
    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthGrant, BotError> {
        #[derive(Serialize)]
        struct Request<'a> {
            username: &'a str,
            password: &'a str,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            #[serde(default)]
            success: bool,
            token: Option<String>,
            expires_in: Option<i64>,
            message: Option<String>,
        }

        let response = self.client
            .post(&self.auth_url)
            .json(&Request { username, password })
            .send()
            .await
            .map_err(|e| BotError::Network(format!("Connection error, check the APEX API: {}", e)))?;

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        if !data.success {
            let reason = data.message.unwrap_or_else(|| "Login failed".to_string());
            return Err(BotError::Auth(reason));
        }

        match (data.token, data.expires_in) {
            (Some(token), Some(expires_in)) if !token.is_empty() => Ok(AuthGrant { token, expires_in }),
            _ => Err(BotError::Parse("login response without token or expiresIn".to_string())),
        }
    }
}

#[async_trait]
impl ArticleSource for ApexClient {
    async fn fetch_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, BotError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(default)]
            items: Vec<Article>,
        }

        let mut params = vec![("P_COD_EMPRESA", query.company.clone())];
        if let Some(date) = query.date_param() {
            params.push(("P_FECHA", date));
        }

        let url = self.api_url("ventas/articulos");
        tracing::debug!("Fetching articles from {} with {:?}", url, params);

        let response = self.client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("APEX API error: {}", response.status())));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        tracing::info!("Fetched {} articles", data.items.len());
        Ok(data.items)
    }
}
