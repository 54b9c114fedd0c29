use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    models::{
        ApiResponse, Confirmation, ConfirmationMetrics, CreateConfirmationRequest,
        EndSessionRequest, FollowupAnalytics, SessionHandle, StartSessionRequest, TimeRange,
        TrackEventRequest,
    },
    settings::TrackerSettings,
};

use super::TelemetryTransport;

/// REST transport for the follow-up backend.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid API base URL {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("API base URL {base_url} cannot carry a path");
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn from_settings(settings: &TrackerSettings) -> Result<Self> {
        Self::new(
            &settings.api_base_url,
            Duration::from_millis(settings.request_timeout_ms),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;
        decode(response).await
    }

    async fn post_without_reply<B>(&self, segments: &[&str], body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments);
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;
        ensure_success(response).await.map(|_| ())
    }

    async fn get<T>(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        decode(response).await
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
        .ok()
        .and_then(|envelope| envelope.error)
        .map(|err| format!("{}: {}", err.code, err.message))
        .unwrap_or(body);

    Err(anyhow!("{url} returned {status}: {detail}"))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response).await?;
    let url = response.url().clone();
    let envelope: ApiResponse<T> = response
        .json()
        .await
        .with_context(|| format!("failed to decode response from {url}"))?;
    envelope.into_data()
}

#[async_trait]
impl TelemetryTransport for HttpTransport {
    async fn open_session(&self, request: StartSessionRequest) -> Result<SessionHandle> {
        self.post(&["api", "analytics", "sessions", "start"], &request)
            .await
    }

    async fn track_event(&self, request: TrackEventRequest) -> Result<()> {
        self.post_without_reply(&["api", "analytics", "events"], &request)
            .await
    }

    async fn end_session(&self, request: EndSessionRequest) -> Result<()> {
        self.post_without_reply(&["api", "analytics", "sessions", "end"], &request)
            .await
    }

    async fn create_confirmation(
        &self,
        page_slug: &str,
        request: CreateConfirmationRequest,
    ) -> Result<Confirmation> {
        self.post(&["api", "confirmations", page_slug], &request)
            .await
    }

    async fn fetch_followup_analytics(
        &self,
        page_id: &str,
        range: TimeRange,
    ) -> Result<FollowupAnalytics> {
        self.get(
            &["api", "analytics", "followups", page_id],
            &[("timeRange", range.as_str())],
        )
        .await
    }

    async fn fetch_confirmation_metrics(&self, page_id: &str) -> Result<ConfirmationMetrics> {
        self.get(&["api", "confirmations", "followup", page_id, "metrics"], &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_extend_the_base_path() {
        let transport =
            HttpTransport::new("https://api.example.com/v2/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            transport
                .endpoint(&["api", "confirmations", "acme q3"])
                .as_str(),
            "https://api.example.com/v2/api/confirmations/acme%20q3"
        );
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(HttpTransport::new("not a url", Duration::from_secs(5)).is_err());
        assert!(HttpTransport::new("mailto:team@example.com", Duration::from_secs(5)).is_err());
    }
}
