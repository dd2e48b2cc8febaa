use crate::api_types::{BaseData, NextDepartTimes, PatternPathsResponse};
use async_trait::async_trait;
use compact_str::CompactString;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use thiserror::Error;

const TOKEN_HEADER: &str = "__RequestVerificationToken";

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="__RequestVerificationToken"\s+type="hidden"\s+value="([^"]+)""#)
        .expect("token regex is valid")
});

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("no verification token in landing page")]
    MissingToken,

    #[error("{endpoint} response did not match schema: {source}")]
    Schema {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Backend the tracker reads from. The live implementation is [`SpiritClient`].
#[async_trait]
pub trait TransitApi: Send + Sync {
    async fn get_authentication(&self) -> Result<CompactString, ApiError>;

    async fn get_base_data(&self, token: &str) -> Result<BaseData, ApiError>;

    async fn get_pattern_paths(
        &self,
        route_keys: &[CompactString],
        token: &str,
    ) -> Result<PatternPathsResponse, ApiError>;

    async fn get_next_departure_times(
        &self,
        route_key: &str,
        direction_keys: &[CompactString],
        stop_code: &str,
        token: &str,
    ) -> Result<NextDepartTimes, ApiError>;
}

pub struct SpiritClient {
    base_url: String,
    http: reqwest::Client,
}

impl SpiritClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        // The anti-forgery token is only accepted together with its cookie.
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        form: &[(String, String)],
        token: &str,
    ) -> Result<T, ApiError> {
        let url = format!("{}/RouteMap/{}/", self.base_url, endpoint);
        let response = self
            .http
            .post(url)
            .header(TOKEN_HEADER, token)
            .form(form)
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { endpoint, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;
        serde_json::from_str(&body).map_err(|source| ApiError::Schema { endpoint, source })
    }
}

#[async_trait]
impl TransitApi for SpiritClient {
    async fn get_authentication(&self) -> Result<CompactString, ApiError> {
        let endpoint = "landing page";
        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { endpoint, status });
        }

        let html = response
            .text()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;
        extract_token(&html).ok_or(ApiError::MissingToken)
    }

    async fn get_base_data(&self, token: &str) -> Result<BaseData, ApiError> {
        self.post_form("GetBaseData", &[], token).await
    }

    async fn get_pattern_paths(
        &self,
        route_keys: &[CompactString],
        token: &str,
    ) -> Result<PatternPathsResponse, ApiError> {
        self.post_form("GetPatternPaths", &pattern_paths_form(route_keys), token)
            .await
    }

    async fn get_next_departure_times(
        &self,
        route_key: &str,
        direction_keys: &[CompactString],
        stop_code: &str,
        token: &str,
    ) -> Result<NextDepartTimes, ApiError> {
        let form = departure_times_form(route_key, direction_keys, stop_code);
        self.post_form("GetNextDepartTimes", &form, token).await
    }
}

pub fn extract_token(html: &str) -> Option<CompactString> {
    TOKEN_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| CompactString::from(m.as_str()))
}

fn pattern_paths_form(route_keys: &[CompactString]) -> Vec<(String, String)> {
    route_keys
        .iter()
        .map(|k| ("routeKeys[]".to_string(), k.to_string()))
        .collect()
}

fn departure_times_form(
    route_key: &str,
    direction_keys: &[CompactString],
    stop_code: &str,
) -> Vec<(String, String)> {
    let mut form = Vec::with_capacity(direction_keys.len() * 2 + 1);
    for (i, direction_key) in direction_keys.iter().enumerate() {
        form.push((
            format!("routeDirectionKeys[{}][routeKey]", i),
            route_key.to_string(),
        ));
        form.push((
            format!("routeDirectionKeys[{}][directionKey]", i),
            direction_key.to_string(),
        ));
    }
    form.push(("stopCode".to_string(), stop_code.to_string()));
    form
}
