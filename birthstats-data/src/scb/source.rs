use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, CONTENT_TYPE},
};
use url::Url;

use super::{DEFAULT_SCB_API_URL, FetchError, QueryDocument, QuerySelection, ScbResponse, StatisticsSource};

/// `User-Agent` sent to the statistics service unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = "birthstats-etl/0.1";
/// Whole-request timeout used unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest response body quoted in an HTTP error.
const ERROR_BODY_LIMIT: usize = 512;

/// Settings for [`HttpStatisticsSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSourceConfig {
    /// Table endpoint receiving the query.
    pub endpoint: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Dimension values to request.
    pub selection: QuerySelection,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SCB_API_URL.to_owned(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            selection: QuerySelection::default(),
        }
    }
}

impl HttpSourceConfig {
    /// Use `endpoint` instead of the live table.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the default user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Request a different set of dimension values.
    #[must_use]
    pub fn with_selection(mut self, selection: QuerySelection) -> Self {
        self.selection = selection;
        self
    }
}

/// HTTP implementation of [`StatisticsSource`].
#[derive(Debug)]
pub struct HttpStatisticsSource {
    client: Client,
    endpoint: Url,
    document: QueryDocument,
}

impl HttpStatisticsSource {
    /// Construct a source from `config`, validating the endpoint.
    pub fn new(config: HttpSourceConfig) -> Result<Self, FetchError> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|source| FetchError::InvalidEndpoint {
                url: config.endpoint.clone(),
                source,
            })?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|source| FetchError::Client { source })?;
        Ok(Self {
            client,
            endpoint,
            document: config.selection.to_document(),
        })
    }

    /// The query document posted on every fetch.
    #[must_use]
    pub const fn document(&self) -> &QueryDocument {
        &self.document
    }
}

#[async_trait]
impl StatisticsSource for HttpStatisticsSource {
    fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn fetch(&self) -> Result<ScbResponse, FetchError> {
        let url = self.endpoint.as_str();
        log::info!(
            "requesting birth statistics from {url} ({} regions)",
            self.document
                .query
                .first()
                .map_or(0, |dimension| dimension.selection.values.len())
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&self.document)
            .send()
            .await
            .map_err(|err| FetchError::from_reqwest(err, url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| FetchError::from_reqwest(err, url))?;
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: truncate(&body, ERROR_BODY_LIMIT),
            });
        }
        decode_response(&body, url)
    }
}

/// Decode a response body. PxWeb prefixes JSON with a UTF-8 byte order mark.
pub(super) fn decode_response(body: &str, url: &str) -> Result<ScbResponse, FetchError> {
    let response: ScbResponse = serde_json::from_str(body.trim_start_matches('\u{feff}'))
        .map_err(|source| FetchError::Decode {
            url: url.to_owned(),
            source,
        })?;
    log::debug!("received {} entries from {url}", response.data.len());
    Ok(response)
}

fn truncate(body: &str, limit: usize) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(limit) {
        Some((index, _)) => format!("{}…", &trimmed[..index]),
        None => trimmed.to_owned(),
    }
}
