use crate::ports::outbound::{DatabaseError, VulnerabilityDatabase};
use crate::scanning::domain::CveRecord;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// NVD CVE API 2.0 client.
///
/// Distinguishes the outcomes that matter to the caching layers: an
/// exact-CPE 404 is a definitive `NotFound`, while 429/503 are transient
/// and must leave no trace in any cache.
pub struct NvdClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl NvdClient {
    const API_ENDPOINT: &'static str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
    const TIMEOUT_SECONDS: u64 = 30;
    /// Known vulnerable CPE (Log4Shell) used by the connectivity check.
    const PROBE_CPE: &'static str = "cpe:2.3:a:apache:log4j:2.14.1:*:*:*:*:*:*:*";

    pub fn new(api_key: Option<String>) -> crate::shared::Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let client = Client::builder()
            .timeout(Duration::from_secs(Self::TIMEOUT_SECONDS))
            .user_agent(format!("cpescan/{}", version))
            .build()?;

        Ok(Self {
            client,
            base_url: Self::API_ENDPOINT.to_string(),
            api_key,
        })
    }

    /// One direct query against a CPE known to have results, bypassing
    /// every cache. The only failure in a run that is fatal.
    pub async fn connectivity_check(&self) -> Result<usize, DatabaseError> {
        let records = self.search_by_cpe(Self::PROBE_CPE).await?;
        Ok(records.len())
    }

    async fn fetch(&self, query: &[(&str, String)]) -> Result<Vec<CveRecord>, DatabaseError> {
        let mut request = self.client.get(&self.base_url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header("apiKey", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                DatabaseError::Unavailable {
                    details: e.to_string(),
                }
            } else {
                DatabaseError::RequestFailed {
                    details: e.to_string(),
                }
            }
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(DatabaseError::NotFound {
                    cpe: query
                        .iter()
                        .find(|(k, _)| *k == "cpeName")
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default(),
                })
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(DatabaseError::RateLimited),
            StatusCode::SERVICE_UNAVAILABLE => {
                return Err(DatabaseError::Unavailable {
                    details: "service unavailable (503)".to_string(),
                })
            }
            status if !status.is_success() => {
                return Err(DatabaseError::RequestFailed {
                    details: format!("unexpected status {status}"),
                })
            }
            _ => {}
        }

        let body: CveApiResponse =
            response
                .json()
                .await
                .map_err(|e| DatabaseError::RequestFailed {
                    details: format!("invalid response body: {e}"),
                })?;

        debug!(results = body.vulnerabilities.len(), "NVD response parsed");
        Ok(body
            .vulnerabilities
            .into_iter()
            .map(|item| item.cve.into_record())
            .collect())
    }
}

#[async_trait]
impl VulnerabilityDatabase for NvdClient {
    async fn search_by_cpe(&self, cpe: &str) -> Result<Vec<CveRecord>, DatabaseError> {
        self.fetch(&[("cpeName", cpe.to_string())]).await
    }

    async fn search_modified_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CveRecord>, DatabaseError> {
        self.fetch(&[
            ("lastModStartDate", start.to_rfc3339()),
            ("lastModEndDate", end.to_rfc3339()),
        ])
        .await
    }
}

// NVD API response structures

#[derive(Debug, Deserialize)]
struct CveApiResponse {
    #[serde(default)]
    vulnerabilities: Vec<CveItem>,
}

#[derive(Debug, Deserialize)]
struct CveItem {
    cve: CveDetail,
}

#[derive(Debug, Deserialize)]
struct CveDetail {
    id: String,
    #[serde(default)]
    descriptions: Vec<CveDescription>,
    #[serde(default)]
    published: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CveDescription {
    lang: String,
    value: String,
}

impl CveDetail {
    fn into_record(self) -> CveRecord {
        let description = self
            .descriptions
            .iter()
            .find(|d| d.lang == "en")
            .or_else(|| self.descriptions.first())
            .map(|d| d.value.clone())
            .unwrap_or_else(|| "No description".to_string());

        let published = self.published.as_deref().and_then(parse_nvd_timestamp);
        if self.published.is_some() && published.is_none() {
            warn!(cve = %self.id, "unparseable published date");
        }

        CveRecord::new(self.id, description, published)
    }
}

/// NVD timestamps come without a zone designator ("2021-12-10T10:15:09.143"),
/// occasionally as full RFC 3339. Zoneless values are taken as UTC.
fn parse_nvd_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}
