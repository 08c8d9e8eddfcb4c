use crate::core::entity_validation::VALIDATE_ENTITIES_PATH;
use crate::domain::ports::{ApiResponse, EntityReport, EntityValidator, ImportApi};
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Thin JSON client over the import backend.
#[derive(Debug, Clone)]
pub struct HttpImportApi {
    client: Client,
    base_url: Url,
}

impl HttpImportApi {
    pub fn new(base_url: &str, timeout_seconds: Option<u64>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(seconds) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        // 確保 base_url 以 / 結尾，join 時才不會吃掉最後一段路徑
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| ImportError::InvalidConfigValueError {
            field: "server.base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ImportError::ProcessingError {
                message: format!("cannot build URL for '{}': {}", path, e),
            })
    }
}

#[async_trait]
impl ImportApi for HttpImportApi {
    async fn post(&self, path: &str, payload: &serde_json::Value) -> Result<ApiResponse> {
        let url = self.endpoint(path)?;
        tracing::debug!("Making API request to: {}", url);

        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImportError::ApiError {
                step: path.to_string(),
                message: if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    format!("HTTP {}: {}", status, body.trim())
                },
            });
        }

        Ok(response.json::<ApiResponse>().await?)
    }
}

#[derive(Debug, Default, Deserialize)]
struct UnmatchedEntities {
    #[serde(default)]
    unmatched: Vec<String>,
}

/// Entity-name validation backed by `/entityIsoNames/validateData`.
#[derive(Debug, Clone)]
pub struct HttpEntityValidator {
    api: HttpImportApi,
}

impl HttpEntityValidator {
    pub fn new(api: HttpImportApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl EntityValidator for HttpEntityValidator {
    async fn validate_entities(&self, names: &[String]) -> Result<EntityReport> {
        let payload = serde_json::json!({ "entities": names });
        let response = self
            .api
            .post(VALIDATE_ENTITIES_PATH, &payload)
            .await
            .map_err(|e| match e {
                ImportError::ApiError { message, .. } => ImportError::ApiError {
                    step: "validateEntities".to_string(),
                    message,
                },
                other => other,
            })?;

        if !response.success {
            return Err(ImportError::ApiError {
                step: "validateEntities".to_string(),
                message: "server could not validate entity names".to_string(),
            });
        }

        let parsed: UnmatchedEntities = if response.data.is_null() {
            UnmatchedEntities::default()
        } else {
            serde_json::from_value(response.data)?
        };
        Ok(EntityReport {
            checked: names.len(),
            unmatched: parsed.unmatched,
        })
    }
}
