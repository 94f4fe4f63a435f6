//! GitHub REST client: repository listing plus the per-repository unstar and
//! delete calls the bulk coordinator fans out to.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::bulk::RepoActions;
use crate::error::{GitHubError, Result};
use crate::models::{RepoView, Repository, StarredRepository};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const STAR_MEDIA_TYPE: &str = "application/vnd.github.star+json";

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

/// A fetched collection in one of its two record shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum RepoCollection {
    Owned(Vec<Repository>),
    Starred(Vec<StarredRepository>),
}

impl RepoCollection {
    pub fn view(&self) -> RepoView {
        match self {
            RepoCollection::Owned(_) => RepoView::Owned,
            RepoCollection::Starred(_) => RepoView::Starred,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RepoCollection::Owned(repos) => repos.len(),
            RepoCollection::Starred(repos) => repos.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RepoCollection {
    fn default() -> Self {
        RepoCollection::Owned(Vec::new())
    }
}

/// Splits `owner/repo`. Anything else is rejected.
pub fn split_full_name(full_name: &str) -> Result<(&str, &str)> {
    match full_name.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner, repo))
        }
        _ => Err(GitHubError::InvalidFullName(full_name.to_string())),
    }
}

#[derive(Clone)]
pub struct GitHubClient {
    token: String,
    base_url: String,
    client: Client,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    /// Client for GitHub Enterprise or any API-compatible host.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        while url.ends_with('/') {
            url.pop();
        }
        Self {
            token: token.into(),
            base_url: url,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self, accept: &'static str) -> Result<HeaderMap> {
        if self.token.is_empty() {
            return Err(GitHubError::AuthRequired);
        }
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|_| GitHubError::InvalidToken)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(USER_AGENT, HeaderValue::from_static("ghclean"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));
        Ok(headers)
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        self.request_accepting(method, endpoint, JSON_MEDIA_TYPE)
    }

    fn request_accepting(
        &self,
        method: Method,
        endpoint: &str,
        accept: &'static str,
    ) -> Result<RequestBuilder> {
        let url = format!("{}{}", self.base_url, endpoint);
        Ok(self.client.request(method, url).headers(self.headers(accept)?))
    }

    async fn send(request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GitHubError::Status { status, body });
        }
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = Self::send(self.request(Method::GET, endpoint)?).await?;
        Ok(response.json().await?)
    }

    /// The authenticated user.
    pub async fn current_user(&self) -> Result<User> {
        self.get("/user").await
    }

    /// One page of repositories the user has access to, most recently updated first.
    pub async fn list_repositories(&self, page: u32, per_page: u32) -> Result<Vec<Repository>> {
        let endpoint = format!("/user/repos?sort=updated&per_page={}&page={}", per_page, page);
        self.get(&endpoint).await
    }

    /// One page of starred repositories, each with its `starred_at`.
    pub async fn list_starred(&self, page: u32, per_page: u32) -> Result<Vec<StarredRepository>> {
        let endpoint = format!("/user/starred?per_page={}&page={}", per_page, page);
        let request = self.request_accepting(Method::GET, &endpoint, STAR_MEDIA_TYPE)?;
        let response = Self::send(request).await?;
        Ok(response.json().await?)
    }

    pub async fn fetch_all_repositories(
        &self,
        per_page: u32,
        max_pages: u32,
    ) -> Result<Vec<Repository>> {
        let mut all = Vec::new();
        for page in 1..=max_pages.max(1) {
            let repos = self.list_repositories(page, per_page).await?;
            let short = repos.len() < per_page as usize;
            all.extend(repos);
            if short {
                break;
            }
        }
        debug!(count = all.len(), "fetched repositories");
        Ok(all)
    }

    pub async fn fetch_all_starred(
        &self,
        per_page: u32,
        max_pages: u32,
    ) -> Result<Vec<StarredRepository>> {
        let mut all = Vec::new();
        for page in 1..=max_pages.max(1) {
            let repos = self.list_starred(page, per_page).await?;
            let short = repos.len() < per_page as usize;
            all.extend(repos);
            if short {
                break;
            }
        }
        debug!(count = all.len(), "fetched starred repositories");
        Ok(all)
    }

    pub async fn fetch(
        &self,
        view: RepoView,
        per_page: u32,
        max_pages: u32,
    ) -> Result<RepoCollection> {
        match view {
            RepoView::Owned => self
                .fetch_all_repositories(per_page, max_pages)
                .await
                .map(RepoCollection::Owned),
            RepoView::Starred => self
                .fetch_all_starred(per_page, max_pages)
                .await
                .map(RepoCollection::Starred),
        }
    }

    /// `DELETE /user/starred/{owner}/{repo}`
    pub async fn unstar_repository(&self, owner: &str, repo: &str) -> Result<()> {
        let endpoint = format!("/user/starred/{}/{}", owner, repo);
        Self::send(self.request(Method::DELETE, &endpoint)?).await?;
        info!(owner, repo, "unstarred");
        Ok(())
    }

    /// `DELETE /repos/{owner}/{repo}`. Needs the `delete_repo` scope.
    pub async fn delete_repository(&self, owner: &str, repo: &str) -> Result<()> {
        let endpoint = format!("/repos/{}/{}", owner, repo);
        Self::send(self.request(Method::DELETE, &endpoint)?).await?;
        info!(owner, repo, "deleted");
        Ok(())
    }
}

#[async_trait]
impl RepoActions for GitHubClient {
    async fn unstar(&self, owner: &str, repo: &str) -> Result<()> {
        self.unstar_repository(owner, repo).await
    }

    async fn delete(&self, owner: &str, repo: &str) -> Result<()> {
        self.delete_repository(owner, repo).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_full_name_accepts_owner_and_repo() {
        assert_eq!(split_full_name("octo/hello").unwrap(), ("octo", "hello"));
    }

    #[test]
    fn split_full_name_rejects_malformed_names() {
        for bad in ["hello", "/hello", "octo/", "a/b/c", ""] {
            assert!(matches!(split_full_name(bad), Err(GitHubError::InvalidFullName(_))), "{bad}");
        }
    }

    #[test]
    fn base_url_trailing_slashes_are_trimmed() {
        let client = GitHubClient::with_base_url("t", "https://ghe.example.com/api/v3//");
        assert_eq!(client.base_url(), "https://ghe.example.com/api/v3");
    }

    #[test]
    fn empty_token_requires_auth() {
        let client = GitHubClient::new("");
        assert!(matches!(client.headers(JSON_MEDIA_TYPE), Err(GitHubError::AuthRequired)));
    }

    #[test]
    fn repository_payload_deserializes() {
        let json = r#"{
            "id": 1296269,
            "name": "Hello-World",
            "full_name": "octocat/Hello-World",
            "description": null,
            "language": "Rust",
            "stargazers_count": 80,
            "updated_at": "2011-01-26T19:14:43Z",
            "html_url": "https://github.com/octocat/Hello-World",
            "private": false,
            "owner": {
                "login": "octocat",
                "avatar_url": "https://github.com/images/error/octocat_happy.gif"
            }
        }"#;
        let repo: Repository = serde_json::from_str(json).unwrap();
        assert_eq!(repo.full_name, "octocat/Hello-World");
        assert_eq!(repo.description, None);
        assert_eq!(repo.updated_at.to_rfc3339(), "2011-01-26T19:14:43+00:00");
    }

    #[test]
    fn starred_payload_deserializes_with_timestamp() {
        let json = r#"[{
            "starred_at": "2020-07-01T10:00:00Z",
            "repo": {
                "id": 7,
                "name": "tool",
                "full_name": "someone/tool",
                "description": "a tool",
                "language": null,
                "stargazers_count": 3,
                "updated_at": "2021-02-03T04:05:06Z",
                "owner": { "login": "someone" }
            }
        }]"#;
        let starred: Vec<StarredRepository> = serde_json::from_str(json).unwrap();
        assert_eq!(starred[0].repo.id, 7);
        assert_eq!(starred[0].starred_at.to_rfc3339(), "2020-07-01T10:00:00+00:00");
        assert_eq!(starred[0].repo.html_url, "");
    }

    #[test]
    fn malformed_updated_at_is_rejected() {
        let json = r#"{
            "id": 1, "name": "x", "full_name": "o/x", "description": null, "language": null,
            "stargazers_count": 0, "updated_at": "yesterday", "owner": { "login": "o" }
        }"#;
        assert!(serde_json::from_str::<Repository>(json).is_err());
    }

    /// Answers one scripted response per connection and returns the request heads it saw.
    fn serve(responses: Vec<(u16, String)>) -> (String, std::thread::JoinHandle<Vec<String>>) {
        use std::io::{Read, Write};
        use std::net::TcpListener;
        use std::time::Duration;

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let handle = std::thread::spawn(move || {
            let mut heads = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().expect("accept");
                stream.set_read_timeout(Some(Duration::from_secs(2))).expect("set_read_timeout");
                let mut buf = Vec::new();
                let mut tmp = [0u8; 4096];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut tmp) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&tmp[..n]),
                    }
                }
                heads.push(String::from_utf8_lossy(&buf).into_owned());
                let reason = match status {
                    200 => "OK",
                    204 => "No Content",
                    404 => "Not Found",
                    _ => "Error",
                };
                let response = format!(
                    concat!(
                        "HTTP/1.1 {} {}\r\n",
                        "Content-Type: application/json\r\n",
                        "Content-Length: {}\r\n",
                        "Connection: close\r\n\r\n{}",
                    ),
                    status,
                    reason,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).expect("write response");
                stream.flush().ok();
            }
            heads
        });
        (format!("http://{addr}"), handle)
    }

    fn repo_json(id: u64) -> String {
        format!(
            concat!(
                r#"{{"id":{id},"name":"r{id}","full_name":"octo/r{id}","#,
                r#""description":null,"language":null,"stargazers_count":0,"#,
                r#""updated_at":"2024-01-01T00:00:00Z","owner":{{"login":"octo"}}}}"#,
            ),
            id = id
        )
    }

    fn page(ids: &[u64]) -> String {
        format!("[{}]", ids.iter().map(|id| repo_json(*id)).collect::<Vec<_>>().join(","))
    }

    #[tokio::test]
    async fn pagination_stops_on_short_page() {
        let (url, server) = serve(vec![(200, page(&[1, 2])), (200, page(&[3]))]);
        let client = GitHubClient::with_base_url("t", url);

        let repos = client.fetch_all_repositories(2, 10).await.unwrap();
        assert_eq!(repos.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let heads = server.join().unwrap();
        assert_eq!(heads.len(), 2);
        for (i, head) in heads.iter().enumerate() {
            let line = format!("GET /user/repos?sort=updated&per_page=2&page={} ", i + 1);
            assert!(head.starts_with(&line), "{}", head);
        }
        assert!(heads[0].to_lowercase().contains("authorization: bearer t"));
    }

    #[tokio::test]
    async fn pagination_stops_at_max_pages() {
        let (url, server) = serve(vec![(200, page(&[1])), (200, page(&[2]))]);
        let client = GitHubClient::with_base_url("t", url);

        let repos = client.fetch_all_repositories(1, 2).await.unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(server.join().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn starred_listing_asks_for_star_media_type() {
        let body = format!(r#"[{{"starred_at":"2020-07-01T10:00:00Z","repo":{}}}]"#, repo_json(7));
        let (url, server) = serve(vec![(200, body)]);
        let client = GitHubClient::with_base_url("t", url);

        let collection = client.fetch(RepoView::Starred, 30, 5).await.unwrap();
        assert_eq!(collection.view(), RepoView::Starred);
        assert_eq!(collection.len(), 1);

        let heads = server.join().unwrap();
        assert!(heads[0].starts_with("GET /user/starred?per_page=30&page=1 "), "{}", heads[0]);
        assert!(heads[0].to_lowercase().contains("accept: application/vnd.github.star+json"));
    }

    #[tokio::test]
    async fn unstar_and_delete_hit_their_endpoints() {
        let (url, server) = serve(vec![(204, String::new()), (204, String::new())]);
        let client = GitHubClient::with_base_url("t", url);

        client.unstar_repository("octo", "hello").await.unwrap();
        client.delete_repository("octo", "hello").await.unwrap();

        let heads = server.join().unwrap();
        assert!(heads[0].starts_with("DELETE /user/starred/octo/hello "), "{}", heads[0]);
        assert!(heads[1].starts_with("DELETE /repos/octo/hello "), "{}", heads[1]);
    }

    #[tokio::test]
    async fn non_success_status_becomes_status_error() {
        let (url, server) = serve(vec![(404, r#"{"message":"Not Found"}"#.to_string())]);
        let client = GitHubClient::with_base_url("t", url);

        let err = client.delete_repository("octo", "gone").await.unwrap_err();
        server.join().unwrap();
        match &err {
            GitHubError::Status { status, body } => {
                assert_eq!(status.as_u16(), 404);
                assert!(body.contains("Not Found"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("GitHub API request failed (404 Not Found)"));
        assert!(!err.is_unauthorized());
    }
}
