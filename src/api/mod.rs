pub mod genre;
pub mod movie;

pub use genre::GenreApi;
pub use movie::{apply_client_filter, MovieApi};

use crate::config::ApiConfig;
use crate::error::{ParityError, Result};
use serde_json::Value;

/// Endpoints probed by [`TmdbClient::sanity_check`], in order
pub const SANITY_ENDPOINTS: &[&str] = &[
    "/configuration",
    "/genre/movie/list",
    "/discover/movie",
    "/movie/popular",
];

const ERROR_BODY_LIMIT: usize = 300;

/// Thin HTTP client for the catalog REST API
#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// GET `{base}{path}` with the api key and `query`, returning the JSON body
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > ERROR_BODY_LIMIT {
                let mut cut = ERROR_BODY_LIMIT;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(ParityError::Http {
                status: status.as_u16(),
                url,
                body,
            });
        }

        Ok(response.json::<Value>().await?)
    }

    /// Return the first endpoint that answers successfully
    pub async fn sanity_check(&self) -> Result<&'static str> {
        let mut last_error = None;
        for endpoint in SANITY_ENDPOINTS {
            match self.get_json(endpoint, &[]).await {
                Ok(_) => {
                    log::info!("Sanity check succeeded on {}", endpoint);
                    return Ok(*endpoint);
                }
                Err(e) => {
                    log::warn!("Sanity check failed on {}: {}", endpoint, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ParityError::Other("no endpoints to probe".to_string())))
    }
}
