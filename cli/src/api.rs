//! HTTP side of the server: health check and the project document endpoint.

use frames::ProjectDocument;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};

use crate::CliError;

#[derive(Debug, Clone)]
pub(crate) struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub(crate) fn new(base_url: &str, token: Option<String>) -> Result<Self, CliError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(CliError::InvalidBaseUrl(base_url));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token.trim()))?);
        }
        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { base_url, client })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Websocket endpoint on the same host, authenticated by query token.
    pub(crate) fn ws_url(&self, token: &str) -> String {
        let (scheme, rest) = match self.base_url.strip_prefix("https://") {
            Some(rest) => ("wss", rest),
            None => ("ws", self.base_url.strip_prefix("http://").unwrap_or(&self.base_url)),
        };
        format!("{scheme}://{rest}/api/ws?token={token}")
    }

    pub(crate) async fn ping(&self) -> Result<(), CliError> {
        let response = self.client.get(self.url("/healthz")).send().await?;
        check_status(response).await.map(|_| ())
    }

    pub(crate) async fn get_document(&self, project_id: &str) -> Result<ProjectDocument, CliError> {
        let response = self.request(Method::GET, project_id).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    /// Like [`Self::get_document`], but a project that was never saved is `None`.
    pub(crate) async fn find_document(&self, project_id: &str) -> Result<Option<ProjectDocument>, CliError> {
        match self.get_document(project_id).await {
            Ok(doc) => Ok(Some(doc)),
            Err(CliError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn put_document(
        &self,
        project_id: &str,
        document: &ProjectDocument,
    ) -> Result<ProjectDocument, CliError> {
        let response = self.request(Method::PUT, project_id).json(document).send().await?;
        Ok(check_status(response).await?.json().await?)
    }

    fn request(&self, method: Method, project_id: &str) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(&document_path(project_id)))
    }
}

pub(crate) fn document_path(project_id: &str) -> String {
    format!("/api/projects/{project_id}/document")
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CliError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CliError::Status { status: status.as_u16(), body })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
