//! HTTP client shared by the catalog adapters
//!
//! Wraps `reqwest` with a per-call timeout, an optional governor token bucket,
//! the centralized retry policy and a mandatory cooldown after HTTP 429.

use super::retry_policy::{RateLimitInfo, RetryPolicy};
use crate::modules::provider::domain::{SourceError, SourceResult};
use crate::shared::config::{ImportProfile, IngestConfig};
use crate::shared::utils::logger::LogContext;
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

type DirectRateLimiter = GovernorRateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
    governor::middleware::NoOpMiddleware,
>;

/// Everything needed to build a [`RateLimitClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub provider_name: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// `None` disables the token bucket.
    pub requests_per_second: Option<f64>,
    pub burst: u32,
    /// Fallback cooldown after a 429 without a usable Retry-After header.
    pub rate_limit_cooldown: Duration,
    pub retry_policy: RetryPolicy,
}

impl ClientSettings {
    pub fn shikimori(config: &IngestConfig, profile: &ImportProfile) -> Self {
        Self {
            provider_name: "Shikimori".to_string(),
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout,
            requests_per_second: profile.requests_per_second,
            // Shikimori allows 5 rps with short bursts
            burst: 5,
            rate_limit_cooldown: profile.rate_limit_cooldown,
            retry_policy: RetryPolicy::shikimori(),
        }
    }

    pub fn anilist(config: &IngestConfig) -> Self {
        Self {
            provider_name: "AniList".to_string(),
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout,
            // AniList: 30 req/min in its degraded state
            requests_per_second: Some(0.5),
            burst: 2,
            rate_limit_cooldown: Duration::from_secs(60),
            retry_policy: RetryPolicy::anilist(),
        }
    }
}

pub struct RateLimitClient {
    client: Client,
    rate_limiter: Option<DirectRateLimiter>,
    retry_policy: RetryPolicy,
    user_agent: String,
    provider_name: String,
    rate_limit_cooldown: Duration,
    cooldown_until: Mutex<Option<Instant>>,
}

impl RateLimitClient {
    pub fn new(settings: ClientSettings) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to build HTTP client: {}", e)))?;

        let rate_limiter = settings
            .requests_per_second
            .and_then(|rps| Self::create_rate_limiter(rps, settings.burst));

        Ok(Self {
            client,
            rate_limiter,
            retry_policy: settings.retry_policy,
            user_agent: settings.user_agent,
            provider_name: settings.provider_name,
            rate_limit_cooldown: settings.rate_limit_cooldown,
            cooldown_until: Mutex::new(None),
        })
    }

    /// Token bucket for `requests_per_second`; a non-positive rate disables it.
    fn create_rate_limiter(requests_per_second: f64, burst_size: u32) -> Option<DirectRateLimiter> {
        if requests_per_second <= 0.0 || !requests_per_second.is_finite() {
            return None;
        }

        let period = Duration::from_secs_f64(1.0 / requests_per_second);
        let burst = NonZeroU32::new(burst_size.max(1)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(period)?.allow_burst(burst);

        Some(GovernorRateLimiter::direct(quota))
    }

    /// GET a JSON document. A 404 is reported as `Ok(None)`.
    pub async fn get<T>(&self, url: &str) -> SourceResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        self.request_with_retries(Method::GET, url, None).await
    }

    /// POST a JSON body and decode the JSON reply.
    pub async fn post_json<T>(&self, url: &str, body: &Value) -> SourceResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.request_with_retries(Method::POST, url, Some(body))
            .await?
            .ok_or(SourceError::Http { status: 404 })
    }

    async fn request_with_retries<T>(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> SourceResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut attempt = 0;

        loop {
            match self.execute_once(&method, url, body).await {
                Ok(result) => return Ok(result),
                Err(error) if self.retry_policy.should_retry(&error, attempt) => {
                    let delay = self.retry_policy.calculate_delay(attempt, None);
                    log::warn!(
                        "{} request failed (attempt {}/{}): {}. Retrying in {:?}",
                        self.provider_name,
                        attempt + 1,
                        self.retry_policy.max_retries + 1,
                        error,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn execute_once<T>(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
    ) -> SourceResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        self.wait_for_cooldown().await;

        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let started = Instant::now();
        let response = self.build_and_send_request(method, url, body).await?;
        let status = response.status();

        LogContext::api_call(
            &self.provider_name,
            url,
            status.as_str(),
            Some(started.elapsed().as_millis() as u64),
        );

        match status {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::TOO_MANY_REQUESTS => {
                let info = RateLimitInfo::from_headers(response.headers());
                let retry_after = info.recommended_delay();
                self.enter_cooldown(retry_after).await;
                Err(SourceError::RateLimited { retry_after })
            }
            s if s.is_success() => self.parse_response(response).await.map(Some),
            s => Err(SourceError::Http { status: s.as_u16() }),
        }
    }

    async fn build_and_send_request(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
    ) -> SourceResult<Response> {
        let mut request_builder = self
            .client
            .request(method.clone(), url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json");

        if let Some(json_body) = body {
            request_builder = request_builder.json(json_body);
        }

        request_builder.send().await.map_err(SourceError::from)
    }

    async fn parse_response<T>(&self, response: Response) -> SourceResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = response.bytes().await.map_err(SourceError::from)?;

        serde_json::from_slice(&bytes).map_err(|e| {
            let preview = String::from_utf8_lossy(&bytes);
            let preview: String = preview.chars().take(200).collect();
            SourceError::Decode(format!(
                "Failed to parse {} response: {}. Response: {}",
                self.provider_name, e, preview
            ))
        })
    }

    async fn wait_for_cooldown(&self) {
        let until = *self.cooldown_until.lock().await;
        if let Some(until) = until {
            let now = Instant::now();
            if until > now {
                sleep(until - now).await;
            }
        }
    }

    async fn enter_cooldown(&self, retry_after: Option<Duration>) {
        let cooldown = retry_after
            .map(|d| d.min(self.retry_policy.max_delay.max(self.rate_limit_cooldown)))
            .unwrap_or(self.rate_limit_cooldown);
        let until = Instant::now() + cooldown;

        let mut guard = self.cooldown_until.lock().await;
        if guard.map_or(true, |current| current < until) {
            *guard = Some(until);
        }

        log::warn!(
            "{} rate limited, pausing all requests for {:?}",
            self.provider_name,
            cooldown
        );
    }

    /// Time left before this client will issue another request.
    pub async fn cooldown_remaining(&self) -> Option<Duration> {
        let until = (*self.cooldown_until.lock().await)?;
        until.checked_duration_since(Instant::now())
    }

    /// Check if a request can be made now (for testing/debugging)
    pub fn can_make_request_now(&self) -> bool {
        self.rate_limiter
            .as_ref()
            .map_or(true, |limiter| limiter.check().is_ok())
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }
}
