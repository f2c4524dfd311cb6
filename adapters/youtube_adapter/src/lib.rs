use reqwest::blocking::Client;
use tracing::debug;
use trending_core::config::{ApiKey, FetchSettings};
use trending_core::domain::{RawPayload, TrendingQuery};
use trending_core::error::PipelineError;
use trending_core::ports::{Result, TrendingSource};
use trending_core::validation::error_envelope_message;

/// `videos.list` parts we need for a record
const PARTS: &str = "snippet,statistics";
const CHART: &str = "mostPopular";

/// YouTube Data API v3 implementation of the TrendingSource trait
pub struct YouTubeTrendingSource {
    client: Client,
    endpoint: String,
    api_key: ApiKey,
}

impl YouTubeTrendingSource {
    /// Creates a new YouTubeTrendingSource for the given key and endpoint settings
    pub fn new(api_key: ApiKey, settings: &FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("yt-trending/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: settings.videos_endpoint(),
            api_key,
        })
    }

    /// Query string for one trending request, without the key
    pub fn query_params(query: &TrendingQuery) -> Vec<(&'static str, String)> {
        vec![
            ("part", PARTS.to_string()),
            ("chart", CHART.to_string()),
            ("regionCode", query.region.to_string()),
            ("maxResults", query.max_results.to_string()),
        ]
    }
}

impl TrendingSource for YouTubeTrendingSource {
    fn fetch_trending(&self, query: &TrendingQuery) -> Result<RawPayload> {
        let params = Self::query_params(query);
        debug!(endpoint = %self.endpoint, ?params, "requesting trending chart");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .query(&[("key", self.api_key.expose())])
            .send()
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let body = response.text().map_err(network_error)?;
        debug!(status, bytes = body.len(), "response received");

        payload_from_response(status, &body)
    }
}

/// Maps a status and body into a payload or the matching error
pub fn payload_from_response(status: u16, body: &str) -> Result<RawPayload> {
    if status != 200 {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|document| error_envelope_message(&document))
            .unwrap_or_else(|| body.trim().to_string());
        return Err(PipelineError::Api { status, message });
    }

    serde_json::from_str(body)
        .map(RawPayload)
        .map_err(|e| PipelineError::MalformedPayload(format!("response is not JSON: {e}")))
}

// The request URL carries the key, so it never goes into the message.
fn network_error(error: reqwest::Error) -> PipelineError {
    let error = error.without_url();
    if error.is_timeout() {
        PipelineError::Network(format!("request timed out: {error}"))
    } else {
        PipelineError::Network(error.to_string())
    }
}
