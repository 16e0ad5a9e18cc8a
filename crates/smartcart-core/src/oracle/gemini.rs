//! Gemini oracle -- item questions via the Generative Language API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{keyring_store, Oracle};
use crate::error::OracleError;
use crate::model::Category;
use crate::storage::OracleConfig;

/// Keyring entry holding the API key.
pub const API_KEY_ENTRY: &str = "gemini_api_key";

/// Environment variables checked, in order, before the keyring.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Where an API key was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment(&'static str),
    Keyring,
}

pub struct GeminiOracle {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiOracle {
    pub fn new(api_key: impl Into<String>, config: &OracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }

    /// Build a client from the stored API key.
    ///
    /// # Errors
    /// Returns [`OracleError::NotConfigured`] if no key is available.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let (api_key, _) = find_api_key().ok_or_else(|| {
            OracleError::NotConfigured(
                "no Gemini API key; set GEMINI_API_KEY or run `smartcart auth gemini login`".into(),
            )
        })?;
        Self::new(api_key, config)
    }

    /// Persist an API key to the OS keyring.
    pub fn store_api_key(api_key: &str) -> Result<(), OracleError> {
        keyring_store::set(API_KEY_ENTRY, api_key)?;
        Ok(())
    }

    /// Remove the stored API key from the OS keyring.
    pub fn forget_api_key() -> Result<(), OracleError> {
        keyring_store::delete(API_KEY_ENTRY)?;
        Ok(())
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Send a single-turn prompt and return the trimmed response text.
    pub async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: body.chars().take(512).collect(),
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(OracleError::InvalidResponse(String::new()));
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn categorize(&self, item_name: &str) -> Result<Category, OracleError> {
        let text = self.generate(&categorize_prompt(item_name)).await?;
        parse_category(&text)
    }

    async fn estimate_lifespan_days(&self, item_name: &str) -> Result<u32, OracleError> {
        let text = self.generate(&lifespan_prompt(item_name)).await?;
        parse_lifespan(&text)
    }
}

/// Locate an API key: environment first, then the keyring.
pub fn find_api_key() -> Option<(String, KeySource)> {
    for var in API_KEY_ENV_VARS {
        if let Ok(key) = std::env::var(var) {
            if !key.trim().is_empty() {
                return Some((key.trim().to_string(), KeySource::Environment(var)));
            }
        }
    }
    match keyring_store::get(API_KEY_ENTRY) {
        Ok(Some(key)) if !key.trim().is_empty() => Some((key, KeySource::Keyring)),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("keyring lookup failed: {e}");
            None
        }
    }
}

pub fn categorize_prompt(item_name: &str) -> String {
    let labels: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
    format!(
        "Categorize the following shopping item: \"{item_name}\". Respond with only one of the following categories: {}.",
        labels.join(", ")
    )
}

pub fn lifespan_prompt(item_name: &str) -> String {
    format!(
        "What is the typical shelf life of \"{item_name}\" in days after purchase or opening? \
         Respond with only a single integer representing the average number of days. \
         For example, for \"Milk\", you should respond with \"7\"."
    )
}

/// Accept only an exact category label.
pub fn parse_category(text: &str) -> Result<Category, OracleError> {
    Category::from_label(text).ok_or_else(|| OracleError::InvalidResponse(text.to_string()))
}

/// Parse a leading integer the way a lenient number reader would: optional
/// sign, then digits; anything after the digits is ignored. Only positive
/// values are accepted.
pub fn parse_lifespan(text: &str) -> Result<u32, OracleError> {
    let invalid = || OracleError::InvalidResponse(text.to_string());
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() || negative {
        return Err(invalid());
    }
    match digits.parse::<u32>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(server: &mockito::Server) -> OracleConfig {
        OracleConfig {
            endpoint: server.url(),
            ..OracleConfig::default()
        }
    }

    fn answer(text: &str) -> String {
        json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    #[test]
    fn parse_lifespan_reads_leading_integer() {
        assert_eq!(parse_lifespan("7").unwrap(), 7);
        assert_eq!(parse_lifespan(" 14 days\n").unwrap(), 14);
        assert_eq!(parse_lifespan("3.5").unwrap(), 3);
        assert_eq!(parse_lifespan("+21").unwrap(), 21);
    }

    #[test]
    fn parse_lifespan_rejects_non_positive_and_text() {
        assert!(parse_lifespan("0").is_err());
        assert!(parse_lifespan("-4").is_err());
        assert!(parse_lifespan("about a week").is_err());
        assert!(parse_lifespan("").is_err());
        assert!(parse_lifespan("99999999999").is_err());
    }

    #[test]
    fn parse_category_requires_exact_label() {
        assert_eq!(parse_category("Frozen Foods\n").unwrap(), Category::FrozenFoods);
        assert!(parse_category("frozen").is_err());
        assert!(parse_category("Category: Produce").is_err());
    }

    #[test]
    fn categorize_prompt_lists_every_label() {
        let prompt = categorize_prompt("Oat Milk");
        assert!(prompt.contains("\"Oat Milk\""));
        for category in Category::ALL {
            assert!(prompt.contains(category.label()));
        }
    }

    #[tokio::test]
    async fn categorize_parses_model_answer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(answer("Dairy & Eggs\n"))
            .create_async()
            .await;

        let oracle = GeminiOracle::new("test-key", &config_for(&server)).unwrap();
        assert_eq!(oracle.categorize("Milk").await.unwrap(), Category::DairyEggs);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn lifespan_parses_model_answer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(answer("10"))
            .create_async()
            .await;

        let oracle = GeminiOracle::new("k", &config_for(&server)).unwrap();
        assert_eq!(oracle.estimate_lifespan_days("Bread").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", mockito::Matcher::Any)
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let oracle = GeminiOracle::new("k", &config_for(&server)).unwrap();
        let err = oracle.categorize("Milk").await.unwrap_err();
        assert!(matches!(err, OracleError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn empty_candidates_are_invalid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let oracle = GeminiOracle::new("k", &config_for(&server)).unwrap();
        assert!(matches!(
            oracle.estimate_lifespan_days("Milk").await,
            Err(OracleError::InvalidResponse(_))
        ));
    }
}
