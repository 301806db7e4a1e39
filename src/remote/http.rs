use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use super::{FetchError, GazetteSource};
use crate::config::SourceOptions;
use crate::index::DraftSet;

const MARKDOWN_EXTENSION: &str = ".md";

#[derive(Debug, Deserialize)]
struct TreeListing {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(default)]
    url: Option<String>,
}

/// [`GazetteSource`] backed by the public CSV host, the repository tree API
/// and the document proxy.
#[derive(Clone)]
pub struct HttpGazetteSource {
    client: Client,
    options: SourceOptions,
}

impl HttpGazetteSource {
    pub fn new(options: SourceOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&options.user_agent)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client, options })
    }

    fn document_url(&self, file_name: &str) -> String {
        join_url(&self.options.proxy_base, file_name)
    }

    fn draft_markdown_url(&self, markdown_name: &str) -> String {
        let folder = join_url(&self.options.raw_content_base, &self.options.drafts_folder);
        join_url(&folder, markdown_name)
    }

    async fn listing(&self, url: &str) -> Result<TreeListing, FetchError> {
        let response = send_checked(self.client.get(url)).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl GazetteSource for HttpGazetteSource {
    async fn fetch_index_csv(&self) -> Result<String, FetchError> {
        let url = &self.options.index_csv_url;
        tracing::debug!(%url, "fetching index csv");
        let response = send_checked(self.client.get(url)).await?;
        Ok(response.text().await?)
    }

    async fn fetch_draft_set(&self) -> Result<DraftSet, FetchError> {
        let root = self.listing(&self.options.tree_url).await?;
        let folder = root
            .tree
            .into_iter()
            .find(|entry| entry.path == self.options.drafts_folder);
        let Some(folder_url) = folder.and_then(|entry| entry.url) else {
            tracing::info!(folder = %self.options.drafts_folder, "drafts folder not listed");
            return Ok(DraftSet::new());
        };

        let listing = self.listing(&folder_url).await?;
        let drafts: DraftSet = listing
            .tree
            .iter()
            .map(|entry| entry.path.as_str())
            .filter(|path| path.ends_with(MARKDOWN_EXTENSION))
            .collect();
        tracing::debug!(drafts = drafts.len(), "draft listing loaded");
        Ok(drafts)
    }

    async fn fetch_document(&self, file_name: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.document_url(file_name);
        tracing::debug!(%url, "fetching document through proxy");
        let mut request = self.client.get(&url);
        if !self.options.proxy_secret.is_empty() {
            request = request.header(
                self.options.secret_header.as_str(),
                self.options.proxy_secret.as_str(),
            );
        }
        let response = send_checked(request).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn fetch_draft_markdown(&self, markdown_name: &str) -> Result<String, FetchError> {
        let url = self.draft_markdown_url(markdown_name);
        tracing::debug!(%url, "fetching draft markdown");
        let response = send_checked(self.client.get(&url)).await?;
        Ok(response.text().await?)
    }
}

/// Sends the request and turns non-success statuses into [`FetchError::Http`]
/// carrying the response body text.
async fn send_checked(request: RequestBuilder) -> Result<Response, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            tracing::debug!(?err, "could not read error body");
            String::new()
        }
    };
    Err(FetchError::Http {
        status: status.as_u16(),
        body,
    })
}

fn join_url(base: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        segment.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options_for(server: &MockServer) -> SourceOptions {
        let base = server.uri();
        SourceOptions {
            index_csv_url: format!("{base}/data/ratchakitcha.csv"),
            tree_url: format!("{base}/git/trees/main"),
            raw_content_base: format!("{base}/raw"),
            drafts_folder: "entries".into(),
            proxy_base: format!("{base}/files"),
            secret_header: "x-proxy-secret".into(),
            proxy_secret: "s3cret".into(),
            user_agent: "ratchaview-test".into(),
        }
    }

    #[tokio::test]
    async fn document_fetch_sends_shared_secret() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/140A015N0000000000100.pdf"))
            .and(header("x-proxy-secret", "s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpGazetteSource::new(options_for(&server)).expect("client");
        let bytes = source
            .fetch_document("140A015N0000000000100.pdf")
            .await
            .expect("document");
        assert_eq!(bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn non_success_status_captures_body_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/missing.pdf"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let source = HttpGazetteSource::new(options_for(&server)).expect("client");
        let err = source.fetch_document("missing.pdf").await.unwrap_err();
        assert_matches!(&err, FetchError::Http { status: 404, body } if body == "not found");
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn draft_listing_follows_entries_folder() {
        let server = MockServer::start().await;
        let base = server.uri();
        Mock::given(method("GET"))
            .and(path("/git/trees/main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tree": [
                    { "path": "data", "url": format!("{base}/git/trees/data") },
                    { "path": "entries", "url": format!("{base}/git/trees/entries") },
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/git/trees/entries"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tree": [
                    { "path": "140A015N0000000000100.md", "url": "ignored" },
                    { "path": "README.txt" },
                ]
            })))
            .mount(&server)
            .await;

        let source = HttpGazetteSource::new(options_for(&server)).expect("client");
        let drafts = source.fetch_draft_set().await.expect("drafts");
        assert_eq!(drafts.len(), 1);
        assert!(drafts.contains("140A015N0000000000100"));
    }

    #[tokio::test]
    async fn missing_entries_folder_yields_empty_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/git/trees/main"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "tree": [{ "path": "data" }] })),
            )
            .mount(&server)
            .await;

        let source = HttpGazetteSource::new(options_for(&server)).expect("client");
        let drafts = source.fetch_draft_set().await.expect("drafts");
        assert!(drafts.is_empty());
    }

    #[tokio::test]
    async fn malformed_listing_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/git/trees/main"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
            .mount(&server)
            .await;

        let source = HttpGazetteSource::new(options_for(&server)).expect("client");
        assert_matches!(source.fetch_draft_set().await, Err(FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn draft_markdown_path_swaps_extension_under_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/raw/entries/140A015N0000000000100.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# ร่าง"))
            .mount(&server)
            .await;

        let source = HttpGazetteSource::new(options_for(&server)).expect("client");
        let markdown = source
            .fetch_draft_markdown("140A015N0000000000100.md")
            .await
            .expect("markdown");
        assert_eq!(markdown, "# ร่าง");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let mut options = SourceOptions::default();
        options.index_csv_url = "http://127.0.0.1:9/index.csv".into();
        let source = HttpGazetteSource::new(options).expect("client");
        assert_matches!(source.fetch_index_csv().await, Err(FetchError::Network(_)));
    }

    #[test]
    fn joins_without_duplicate_slashes() {
        assert_eq!(join_url("http://h/files/", "/a.pdf"), "http://h/files/a.pdf");
        assert_eq!(join_url("http://h", "entries"), "http://h/entries");
    }
}
