use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::model::{Employee, EmployeeDraft, PageQuery, ResultPage, Suggestion};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The remote employee service.
///
/// Every call is an independent request; implementations hold no query
/// state. Futures are `Send` so a session can spawn them.
pub trait EmployeeApi: Send + Sync + 'static {
    fn fetch_page(
        &self,
        query: &PageQuery,
    ) -> impl Future<Output = Result<ResultPage, ClientError>> + Send;

    fn suggest(&self, text: &str)
        -> impl Future<Output = Result<Vec<Suggestion>, ClientError>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = Result<Employee, ClientError>> + Send;

    fn create(&self, draft: &EmployeeDraft) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn update(
        &self,
        id: &str,
        draft: &EmployeeDraft,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn export_csv(&self) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 10,
        }
    }
}

/// `reqwest` implementation of [`EmployeeApi`].
#[derive(Clone, Debug)]
pub struct HttpEmployeeApi {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpEmployeeApi {
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        let base_url = parse_base_url(&options.base_url)?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(concat!(
                "employee-desk/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(options.timeout_seconds.max(1)))
            .build()
            .map_err(|e| ClientError::HttpClientBuild { source: e })?;

        Ok(Self { client, base_url })
    }

    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let request = request.build().map_err(|e| ClientError::Request {
            url: self.base_url.to_string(),
            source: e,
        })?;
        let url = request.url().to_string();
        debug!(method = %request.method(), %url, "sending request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| ClientError::Request {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let url = response.url().to_string();
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode { url, source: e })
    }
}

impl EmployeeApi for HttpEmployeeApi {
    async fn fetch_page(&self, query: &PageQuery) -> Result<ResultPage, ClientError> {
        let url = self.url(&["employees"])?;
        self.send_json(self.client.get(url).query(&query.to_params()))
            .await
    }

    async fn suggest(&self, text: &str) -> Result<Vec<Suggestion>, ClientError> {
        let url = self.url(&["employees", "suggest"])?;
        self.send_json(self.client.get(url).query(&[("q", text)]))
            .await
    }

    async fn get(&self, id: &str) -> Result<Employee, ClientError> {
        let url = self.url(&["employees", id])?;
        let mut employee: Employee = self.send_json(self.client.get(url)).await?;
        if employee.id.is_empty() {
            employee.id = id.to_string();
        }
        Ok(employee)
    }

    async fn create(&self, draft: &EmployeeDraft) -> Result<(), ClientError> {
        let url = self.url(&["employees"])?;
        self.send(self.client.post(url).json(draft)).await?;
        Ok(())
    }

    async fn update(&self, id: &str, draft: &EmployeeDraft) -> Result<(), ClientError> {
        let url = self.url(&["employees", id])?;
        self.send(self.client.put(url).json(draft)).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let url = self.url(&["employees", id])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn export_csv(&self) -> Result<Vec<u8>, ClientError> {
        let url = self.url(&["employees", "export"])?;
        let response = self
            .send(
                self.client
                    .get(url)
                    .header(reqwest::header::ACCEPT, "text/csv"),
            )
            .await?;
        let url = response.url().to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Decode { url, source: e })?;
        Ok(bytes.to_vec())
    }
}

pub fn parse_base_url(raw: &str) -> Result<reqwest::Url, ClientError> {
    let trimmed = raw.trim();
    let url = reqwest::Url::parse(trimmed).map_err(|_| ClientError::InvalidBaseUrl {
        url: trimmed.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidBaseUrl {
            url: trimmed.to_string(),
        });
    }
    Ok(url)
}
