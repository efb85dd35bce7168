//! GitHub Releases API source

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, ETAG, IF_NONE_MATCH, RETRY_AFTER};
use tracing::{debug, warn};

use crate::config::DEFAULT_GITHUB_API_URL;
use crate::version::error::ReleaseError;
use crate::version::source::ReleaseSource;
use crate::version::types::{Release, ReleaseList};

/// Release source backed by `GET /repos/{slug}/releases`
pub struct GitHubReleases {
    client: reqwest::Client,
    base_url: String,
    slug: String,
}

impl GitHubReleases {
    /// Creates a source for `slug` (e.g. "owner/repo") on the public API
    pub fn new(slug: &str) -> Result<Self, ReleaseError> {
        Self::with_base_url(DEFAULT_GITHUB_API_URL, slug)
    }

    /// Creates a source against a custom API base URL (GitHub Enterprise, tests)
    pub fn with_base_url(base_url: &str, slug: &str) -> Result<Self, ReleaseError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("release-watch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url, slug))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, slug: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            slug: slug.to_string(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/repos/{}/releases", self.base_url, self.slug)
    }
}

#[async_trait::async_trait]
impl ReleaseSource for GitHubReleases {
    async fn fetch_releases(&self, etag: &str) -> Result<ReleaseList, ReleaseError> {
        let url = self.url();

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json");
        if !etag.is_empty() {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            if etag.is_empty() {
                return Err(ReleaseError::UnexpectedNotModified);
            }
            debug!("Releases unchanged for {}", self.slug);
            return Ok(ReleaseList::unchanged(etag));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ReleaseError::NotFound(self.slug.clone()));
        }

        let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN
                && response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .is_some_and(|v| v == "0"));
        if rate_limited {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(ReleaseError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status != StatusCode::OK {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(ReleaseError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let new_etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let releases: Vec<Release> = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub releases response: {}", e);
            ReleaseError::InvalidResponse(e.to_string())
        })?;

        debug!("Fetched {} releases for {}", releases.len(), self.slug);
        Ok(ReleaseList::new(releases, new_etag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn fetch_releases_returns_releases_and_etag() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/you/your-app/releases")
            .match_header("accept", "application/vnd.github+json")
            .match_header("if-none-match", Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("etag", r#""abc123""#)
            .with_body(
                r#"[
                    {"tag_name": "v1.1.0-rc.1", "draft": false, "prerelease": true},
                    {"tag_name": "v1.0.1", "draft": false, "prerelease": false},
                    {"tag_name": "v1.2.0", "draft": true, "prerelease": false}
                ]"#,
            )
            .create_async()
            .await;

        let source = GitHubReleases::with_base_url(&server.url(), "you/your-app").unwrap();
        let result = source.fetch_releases("").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            result,
            ReleaseList::new(
                vec![
                    Release::new("v1.1.0-rc.1").prerelease(),
                    Release::new("v1.0.1"),
                    Release::new("v1.2.0").draft(),
                ],
                r#""abc123""#
            )
        );
    }

    #[tokio::test]
    async fn fetch_releases_sends_etag_and_handles_not_modified() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/you/your-app/releases")
            .match_header("if-none-match", r#""some-etag""#)
            .with_status(304)
            .create_async()
            .await;

        let source = GitHubReleases::with_base_url(&server.url(), "you/your-app").unwrap();
        let result = source.fetch_releases(r#""some-etag""#).await.unwrap();

        mock.assert_async().await;
        assert!(result.is_unchanged());
        assert_eq!(result.etag, r#""some-etag""#);
    }

    #[tokio::test]
    async fn fetch_releases_rejects_not_modified_without_etag() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/you/your-app/releases")
            .with_status(304)
            .create_async()
            .await;

        let source = GitHubReleases::with_base_url(&server.url(), "you/your-app").unwrap();
        let result = source.fetch_releases("").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ReleaseError::UnexpectedNotModified)));
    }

    #[tokio::test]
    async fn fetch_releases_returns_not_found_for_missing_repo() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/nonexistent/repo/releases")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let source = GitHubReleases::with_base_url(&server.url(), "nonexistent/repo").unwrap();
        let result = source.fetch_releases("").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ReleaseError::NotFound(slug)) if slug == "nonexistent/repo"));
    }

    #[tokio::test]
    async fn fetch_releases_returns_rate_limited_for_429() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/you/your-app/releases")
            .with_status(429)
            .with_header("retry-after", "60")
            .with_body(r#"{"message": "API rate limit exceeded"}"#)
            .create_async()
            .await;

        let source = GitHubReleases::with_base_url(&server.url(), "you/your-app").unwrap();
        let result = source.fetch_releases("").await;

        mock.assert_async().await;
        assert!(matches!(
            result,
            Err(ReleaseError::RateLimited {
                retry_after_secs: Some(60)
            })
        ));
    }

    #[tokio::test]
    async fn fetch_releases_returns_rate_limited_for_exhausted_403() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/you/your-app/releases")
            .with_status(403)
            .with_header("x-ratelimit-remaining", "0")
            .create_async()
            .await;

        let source = GitHubReleases::with_base_url(&server.url(), "you/your-app").unwrap();
        let result = source.fetch_releases("").await;

        mock.assert_async().await;
        assert!(matches!(
            result,
            Err(ReleaseError::RateLimited {
                retry_after_secs: None
            })
        ));
    }

    #[tokio::test]
    async fn fetch_releases_returns_invalid_response_for_bad_body() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/you/your-app/releases")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"not": "a list"}"#)
            .create_async()
            .await;

        let source = GitHubReleases::with_base_url(&server.url(), "you/your-app").unwrap();
        let result = source.fetch_releases("").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ReleaseError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn fetch_releases_returns_invalid_response_for_server_error() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/you/your-app/releases")
            .with_status(502)
            .create_async()
            .await;

        let source = GitHubReleases::with_base_url(&server.url(), "you/your-app").unwrap();
        let result = source.fetch_releases("").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ReleaseError::InvalidResponse(_))));
    }

    #[test]
    fn url_joins_base_and_slug_without_double_slash() {
        let source = GitHubReleases::with_base_url("https://ghe.example.com/api/v3/", "a/b").unwrap();
        assert_eq!(source.url(), "https://ghe.example.com/api/v3/repos/a/b/releases");
    }
}
