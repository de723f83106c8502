//! REST client for the code-hosting API
//!
//! Bearer-token authenticated `reqwest` client. List endpoints are paged with
//! `per_page=100` until a short page comes back.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{
    Branch, GitHubApi, Repository, RunHistoryEntry, WorkflowDefinition, WorkflowRunWire,
};
use crate::config::GitHubConfig;
use crate::error::{FlowdeckError, Result};

const PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 10;
const RUN_HISTORY_SIZE: usize = 50;
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("flowdeck/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct WorkflowsPage {
    workflows: Vec<WorkflowDefinition>,
}

#[derive(Deserialize)]
struct RunsPage {
    workflow_runs: Vec<WorkflowRunWire>,
}

#[derive(Deserialize)]
struct ContentBody {
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct GitHubClient {
    http: reqwest::Client,
    /// Same settings, but redirects are returned instead of followed
    no_redirect: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let base = config.api_base()?;
        let build = |policy: reqwest::redirect::Policy| {
            reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .redirect(policy)
                .build()
                .map_err(|e| FlowdeckError::ConfigError {
                    reason: format!("Failed to build HTTP client: {}", e),
                })
        };

        Ok(Self {
            http: build(reqwest::redirect::Policy::default())?,
            no_redirect: build(reqwest::redirect::Policy::none())?,
            base,
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let raw = format!("{}{}", self.base.as_str().trim_end_matches('/'), path);
        let mut url = Url::parse(&raw).map_err(|e| FlowdeckError::ConfigError {
            reason: format!("Invalid request URL '{}': {}", raw, e),
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, client: &reqwest::Client, method: Method, url: Url) -> RequestBuilder {
        let builder = client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, endpoint: &str) -> Result<Response> {
        tracing::debug!(endpoint = %endpoint, "API request");
        let response = builder
            .send()
            .await
            .map_err(|source| FlowdeckError::Network {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(FlowdeckError::NotFound {
                what: endpoint.to_string(),
            });
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.message)
            .unwrap_or(text);
        tracing::warn!(endpoint = %endpoint, status = %status, message = %message, "API error");
        Err(FlowdeckError::Http {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path, query)?;
        let response = self
            .send(self.request(&self.http, Method::GET, url), path)
            .await?;
        response.json::<T>().await.map_err(|e| FlowdeckError::Decode {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Collect a paged list endpoint
    async fn get_pages<P, T>(
        &self,
        path: &str,
        query: &[(&str, String)],
        items: fn(P) -> Vec<T>,
    ) -> Result<Vec<T>>
    where
        P: DeserializeOwned,
    {
        let mut all = Vec::new();
        for page in 1..=MAX_PAGES {
            let mut paged = query.to_vec();
            paged.push(("per_page", PAGE_SIZE.to_string()));
            paged.push(("page", page.to_string()));

            let batch = items(self.get_json::<P>(path, &paged).await?);
            let done = batch.len() < PAGE_SIZE;
            all.extend(batch);
            if done {
                break;
            }
        }
        Ok(all)
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<()> {
        let url = self.url(path, &[])?;
        let mut builder = self.request(&self.http, Method::POST, url);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        self.send(builder, path).await?;
        Ok(())
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.get_pages(
            "/user/repos",
            &[("sort", "updated".to_string())],
            |page: Vec<Repository>| page,
        )
        .await
    }

    async fn get_repository(&self, repo: &str) -> Result<Repository> {
        self.get_json(&format!("/repos/{}", repo), &[]).await
    }

    async fn list_branches(&self, repo: &str) -> Result<Vec<Branch>> {
        self.get_pages(
            &format!("/repos/{}/branches", repo),
            &[],
            |page: Vec<Branch>| page,
        )
        .await
    }

    async fn list_workflows(&self, repo: &str) -> Result<Vec<WorkflowDefinition>> {
        self.get_pages(
            &format!("/repos/{}/actions/workflows", repo),
            &[],
            |page: WorkflowsPage| page.workflows,
        )
        .await
    }

    async fn get_file_content(&self, repo: &str, path: &str, git_ref: &str) -> Result<String> {
        let endpoint = format!("/repos/{}/contents/{}", repo, path.trim_start_matches('/'));
        let body: ContentBody = self
            .get_json(&endpoint, &[("ref", git_ref.to_string())])
            .await?;

        if !body.encoding.is_empty() && body.encoding != "base64" {
            return Err(FlowdeckError::Decode {
                endpoint,
                reason: format!("unsupported content encoding '{}'", body.encoding),
            });
        }
        let compact: String = body.content.split_whitespace().collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| FlowdeckError::Decode {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        String::from_utf8(bytes).map_err(|e| FlowdeckError::Decode {
            endpoint,
            reason: e.to_string(),
        })
    }

    async fn list_workflow_runs(&self, repo: &str, branch: &str) -> Result<Vec<RunHistoryEntry>> {
        let page: RunsPage = self
            .get_json(
                &format!("/repos/{}/actions/runs", repo),
                &[
                    ("branch", branch.to_string()),
                    ("per_page", RUN_HISTORY_SIZE.to_string()),
                ],
            )
            .await?;
        Ok(page
            .workflow_runs
            .into_iter()
            .map(RunHistoryEntry::from_wire)
            .collect())
    }

    async fn dispatch_workflow(
        &self,
        repo: &str,
        workflow_file: &str,
        git_ref: &str,
        inputs: Value,
    ) -> Result<()> {
        tracing::info!(repo = %repo, workflow = %workflow_file, git_ref = %git_ref, "Dispatching workflow");
        self.post(
            &format!("/repos/{}/actions/workflows/{}/dispatches", repo, workflow_file),
            Some(serde_json::json!({ "ref": git_ref, "inputs": inputs })),
        )
        .await
    }

    async fn run_logs_url(&self, repo: &str, run_id: u64) -> Result<String> {
        let path = format!("/repos/{}/actions/runs/{}/logs", repo, run_id);
        let url = self.url(&path, &[])?;
        let response = self
            .send(self.request(&self.no_redirect, Method::GET, url), &path)
            .await?;

        if response.status().is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return location.ok_or_else(|| FlowdeckError::Decode {
                endpoint: path,
                reason: "redirect without Location header".to_string(),
            });
        }
        // Some deployments serve the archive directly
        Ok(response.url().to_string())
    }

    async fn rerun_failed_jobs(&self, repo: &str, run_id: u64) -> Result<()> {
        self.post(
            &format!("/repos/{}/actions/runs/{}/rerun-failed-jobs", repo, run_id),
            None,
        )
        .await
    }

    async fn rerun_workflow(&self, repo: &str, run_id: u64) -> Result<()> {
        self.post(&format!("/repos/{}/actions/runs/{}/rerun", repo, run_id), None)
            .await
    }

    async fn cancel_run(&self, repo: &str, run_id: u64) -> Result<()> {
        self.post(&format!("/repos/{}/actions/runs/{}/cancel", repo, run_id), None)
            .await
    }
}
