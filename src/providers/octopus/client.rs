use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use url::Url;

use super::cache::{Cached, ResponseCache, RELEASE_TTL};
use crate::auth::ApiKey;
use crate::error::{DeployLensError, Result};

const API_KEY_HEADER: &str = "X-Octopus-ApiKey";

pub struct OctopusClient {
    client: Client,
    api_url: Url,
    api_key: Option<ApiKey>,
    space_id: Option<String>,
    cache: Mutex<ResponseCache>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReleaseDto {
    id: String,
    #[serde(default)]
    version: String,
    assembled: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub id: String,
    pub version: String,
    pub assembled: DateTime<Utc>,
}

impl TryFrom<ReleaseDto> for Release {
    type Error = DeployLensError;

    fn try_from(dto: ReleaseDto) -> Result<Self> {
        let assembled = DateTime::parse_from_rfc3339(&dto.assembled)
            .map_err(|e| DeployLensError::Timestamp(format!("{:?}: {e}", dto.assembled)))?
            .with_timezone(&Utc);

        Ok(Self {
            id: dto.id,
            version: dto.version,
            assembled,
        })
    }
}

impl OctopusClient {
    pub fn new(server: &str, api_key: Option<ApiKey>, space_id: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("DeployLens/0.1.0")
            .timeout(Duration::from_secs(100))
            .build()
            .map_err(|e| DeployLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base = if server.ends_with('/') {
            server.to_string()
        } else {
            format!("{server}/")
        };
        let api_url = Url::parse(&base)
            .map_err(|e| DeployLensError::Config(format!("Invalid server URL: {e}")))?
            .join("api/")
            .map_err(|e| DeployLensError::Config(format!("Invalid API URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            api_key,
            space_id: space_id.filter(|s| !s.trim().is_empty()),
            cache: Mutex::new(ResponseCache::new()),
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(api_key) = &self.api_key {
            request.header(API_KEY_HEADER, api_key.as_str())
        } else {
            request
        }
    }

    /// Space-scoped API root, or the server-wide one without a space.
    fn space_url(&self) -> Result<Url> {
        match &self.space_id {
            Some(space_id) => self
                .api_url
                .join(&format!("{space_id}/"))
                .map_err(|e| DeployLensError::Config(format!("Invalid space URL: {e}"))),
            None => Ok(self.api_url.clone()),
        }
    }

    pub fn release_url(&self, release_id: &str) -> Result<Url> {
        let mut url = self.space_url()?;
        url.path_segments_mut()
            .map_err(|()| DeployLensError::Config(format!("Cannot extend URL {}", self.api_url)))?
            .pop_if_empty()
            .push("releases")
            .push(release_id);
        Ok(url)
    }

    /// GET through the response cache. A cached failure fails fast without
    /// touching the network.
    async fn get_cached(&self, url: Url, ttl: Duration) -> Result<String> {
        let key = url.as_str().to_string();

        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key);
        match cached {
            Some(Cached::Body(body)) => {
                debug!("Cache hit on {key}");
                return Ok(body);
            }
            Some(Cached::KnownFailure) => {
                return Err(DeployLensError::Api(format!(
                    "Skipping {key}, it failed recently"
                )));
            }
            None => {}
        }

        debug!("GET request to {key}");
        let result = self.send(url).await;

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        match &result {
            Ok(body) => cache.insert(&key, body.clone(), ttl),
            Err(_) => cache.insert_failure(&key),
        }
        result
    }

    async fn send(&self, url: Url) -> Result<String> {
        let request = self.auth_request(self.client.get(url.clone()));
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeployLensError::Api(format!(
                "Response code to {url} was {status}"
            )));
        }

        Ok(response.text().await?)
    }

    pub async fn fetch_release(&self, release_id: &str) -> Result<Release> {
        let url = self.release_url(release_id)?;
        let body = self.get_cached(url, RELEASE_TTL).await?;
        let dto = serde_json::from_str::<ReleaseDto>(&body)?;
        Release::try_from(dto)
    }
}
