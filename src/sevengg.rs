use std::{num::NonZeroU32, sync::Arc, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    RetryIf,
};
use tracing::{debug, instrument, warn};

use crate::emote::{EmoteSet, User};

pub const SEVENTV_URL: &str = "https://7tv.io/v3";

const ADD_EMOTE_MUTATION: &str = r#"
    mutation ChangeEmoteInSet($id: ObjectID! $action: ListItemAction! $emote_id: ObjectID!, $name: String) {
        emoteSet(id: $id) {
            emotes(id: $emote_id action: $action, name: $name) {
                id
                name
            }
        }
    }
"#;

const CREATE_EMOTE_SET_MUTATION: &str = r#"
    mutation CreateEmoteSet($user_id: ObjectID!, $data: CreateEmoteSetInput!) {
        createEmoteSet(user_id: $user_id, data: $data) {
            id
            name
            capacity
        }
    }
"#;

const UPDATE_EMOTE_SET_MUTATION: &str = r#"
    mutation UpdateEmoteSet($id: ObjectID!, $data: UpdateEmoteSetInput!) {
        emoteSet(id: $id) {
            update(data: $data) {
                id
                name
            }
        }
    }
"#;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request to 7TV failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("7TV responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("7TV rejected the request: {0}")]
    GraphQl(String),

    #[error("could not decode 7TV response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected 7TV response: {0}")]
    UnexpectedResponse(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_timeout() || e.is_connect(),
            ApiError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// Whether a mutation can be sent again. Only true when the server never
    /// ran the first attempt.
    pub fn is_replay_safe(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_connect(),
            ApiError::Status { status, .. } => *status == StatusCode::TOO_MANY_REQUESTS,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Operations the copy flow needs from 7TV.
#[async_trait]
pub trait EmoteApi: Send + Sync {
    async fn emote_set(&self, id: &str) -> Result<Option<EmoteSet>>;

    async fn user(&self, id: &str) -> Result<Option<User>>;

    async fn add_emote(&self, emote_set_id: &str, emote_id: &str, name: &str) -> Result<()>;

    /// Create an empty set owned by `user_id` and return its id.
    async fn create_emote_set(&self, user_id: &str, name: &str) -> Result<String>;

    async fn update_emote_set(&self, emote_set_id: &str, name: &str, capacity: u32) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the v3 API
    pub base_url: String,
    /// Bearer token used for mutations
    pub token: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Requests per second (default: 5)
    pub rate_limit_per_sec: u32,
    /// Retry attempts for transient failures (default: 3)
    pub max_retries: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: SEVENTV_URL.to_string(),
            token: String::new(),
            timeout_secs: 30,
            rate_limit_per_sec: 5,
            max_retries: 3,
        }
    }
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit_per_sec: u32) -> Self {
        self.rate_limit_per_sec = rate_limit_per_sec;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SevenTvClient {
    client: Client,
    config: ClientConfig,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl SevenTvClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let rate = NonZeroU32::new(config.rate_limit_per_sec)
            .ok_or_else(|| ApiError::Config("rate limit must be greater than 0".to_string()))?;
        let rate_limiter = Arc::new(DefaultDirectRateLimiter::direct(Quota::per_second(rate)));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn attempt<F>(&self, build: &F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        self.rate_limiter.until_ready().await;

        let res = build().send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        if status != StatusCode::NOT_FOUND {
            warn!("7TV responded with {}", status);
        }
        Err(ApiError::Status { status, body })
    }

    /// Send a request, retrying with backoff while `retryable` allows it.
    async fn send<F>(&self, build: F, retryable: fn(&ApiError) -> bool) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(100)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        RetryIf::spawn(strategy, || self.attempt(&build), retryable).await
    }

    async fn get_optional<T>(&self, path: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("GET {}", url);

        let res = match self.send(|| self.client.get(&url), ApiError::is_transient).await {
            Ok(res) => res,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let text = res.text().await?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let url = self.url("gql");
        let body = json!({
            "query": query,
            "variables": variables,
        });

        let res = self
            .send(
                || {
                    self.client
                        .post(&url)
                        .bearer_auth(&self.config.token)
                        .json(&body)
                },
                ApiError::is_replay_safe,
            )
            .await?;

        let json = res.json::<Value>().await?;
        match graphql_error(&json) {
            Some(message) => Err(ApiError::GraphQl(message)),
            None => Ok(json),
        }
    }
}

#[async_trait]
impl EmoteApi for SevenTvClient {
    #[instrument(skip(self))]
    async fn emote_set(&self, id: &str) -> Result<Option<EmoteSet>> {
        self.get_optional(&format!("emote-sets/{id}")).await
    }

    #[instrument(skip(self))]
    async fn user(&self, id: &str) -> Result<Option<User>> {
        self.get_optional(&format!("users/{id}")).await
    }

    #[instrument(skip(self))]
    async fn add_emote(&self, emote_set_id: &str, emote_id: &str, name: &str) -> Result<()> {
        self.graphql(ADD_EMOTE_MUTATION, add_emote_variables(emote_set_id, emote_id, name))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_emote_set(&self, user_id: &str, name: &str) -> Result<String> {
        let variables = json!({
            "data": { "name": name },
            "user_id": user_id,
        });
        let res = self.graphql(CREATE_EMOTE_SET_MUTATION, variables).await?;

        res["data"]["createEmoteSet"]["id"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| ApiError::UnexpectedResponse("created emote set has no id".to_string()))
    }

    #[instrument(skip(self))]
    async fn update_emote_set(&self, emote_set_id: &str, name: &str, capacity: u32) -> Result<()> {
        self.graphql(
            UPDATE_EMOTE_SET_MUTATION,
            update_emote_set_variables(emote_set_id, name, capacity),
        )
        .await?;
        Ok(())
    }
}

fn add_emote_variables(emote_set_id: &str, emote_id: &str, name: &str) -> Value {
    json!({
        "id": emote_set_id,
        "action": "ADD",
        "emote_id": emote_id,
        "name": name,
    })
}

fn update_emote_set_variables(emote_set_id: &str, name: &str, capacity: u32) -> Value {
    json!({
        "data": { "name": name, "capacity": capacity, "origins": null },
        "id": emote_set_id,
    })
}

/// First error message of a GraphQL response, if it carries any errors.
pub fn graphql_error(json: &Value) -> Option<String> {
    let errors = json["errors"].as_array()?;
    let first = errors.first()?;
    Some(
        first["message"]
            .as_str()
            .map(str::to_owned)
            .unwrap_or_else(|| first.to_string()),
    )
}
