//! Fetch bodies for each stream
//!
//! Each loader returns the complete replacement payload for its stream.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{FanOut, StreamPayload};
use crate::error::Result;
use crate::github::{GitHubApi, RepositoryRow, TriggerableWorkflow};
use crate::schema::parse_workflow;

/// Repository list, each row enriched with its active workflow count
pub async fn load_repositories(
    api: Arc<dyn GitHubApi>,
    fan_out: FanOut,
    cancel: CancellationToken,
) -> Result<StreamPayload> {
    let repositories = api.list_repositories().await?;
    tracing::debug!(count = repositories.len(), "Probing repositories for workflows");

    let report = fan_out
        .run(repositories, &cancel, |repo| {
            let api = Arc::clone(&api);
            async move {
                let workflows = api.list_workflows(&repo.full_name).await?;
                Ok(RepositoryRow {
                    workflow_count: workflows.iter().filter(|w| w.is_active()).count(),
                    name: repo.full_name,
                    default_branch: repo.default_branch,
                    private: repo.private,
                    stars: repo.stargazers_count,
                    updated_at: repo.updated_at,
                })
            }
        })
        .await;

    let mut rows = report.into_all()?;
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(StreamPayload::Repositories(rows))
}

/// Branches with the default branch first
pub async fn load_branches(
    api: Arc<dyn GitHubApi>,
    repo: String,
    default_branch: String,
) -> Result<StreamPayload> {
    let mut branches = api.list_branches(&repo).await?;
    // stable: keeps API order for the rest
    branches.sort_by_key(|b| b.name != default_branch);
    Ok(StreamPayload::Branches(branches))
}

/// Workflows on `branch` that declare a dispatch trigger.
///
/// Files that are missing on the branch, unparsable, or not dispatchable
/// are skipped; they are not failures.
pub async fn load_triggerable_workflows(
    api: Arc<dyn GitHubApi>,
    fan_out: FanOut,
    cancel: CancellationToken,
    repo: String,
    branch: String,
) -> Result<StreamPayload> {
    let definitions: Vec<_> = api
        .list_workflows(&repo)
        .await?
        .into_iter()
        .filter(|w| w.is_active())
        .collect();

    let report = fan_out
        .run(definitions, &cancel, |definition| {
            let api = Arc::clone(&api);
            let repo = repo.clone();
            let branch = branch.clone();
            async move {
                let content = match api.get_file_content(&repo, &definition.path, &branch).await {
                    Ok(content) => content,
                    Err(e) if e.is_not_found() => return Ok(None),
                    Err(e) => return Err(e),
                };
                match parse_workflow(&content, definition.file_name()) {
                    Ok(schema) => Ok(Some(TriggerableWorkflow {
                        id: definition.id,
                        path: definition.path,
                        schema,
                    })),
                    Err(e) => {
                        tracing::debug!(workflow = %definition.path, reason = %e, "Skipping workflow");
                        Ok(None)
                    }
                }
            }
        })
        .await;

    let mut workflows: Vec<TriggerableWorkflow> =
        report.into_all()?.into_iter().flatten().collect();
    workflows.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.path.cmp(&b.path)));
    Ok(StreamPayload::Workflows(workflows))
}

pub async fn load_run_history(
    api: Arc<dyn GitHubApi>,
    repo: String,
    branch: String,
) -> Result<StreamPayload> {
    Ok(StreamPayload::Runs(
        api.list_workflow_runs(&repo, &branch).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::MockGitHub;

    const DISPATCHABLE: &str = "name: Deploy\non:\n  workflow_dispatch:\n    inputs:\n      env:\n        default: dev\n";

    fn api() -> MockGitHub {
        MockGitHub::new()
            .with_repository("octo/zeta", "main")
            .with_repository("octo/alpha", "trunk")
            .with_branches("octo/alpha", &["feature"])
            .with_workflow("octo/alpha", ".github/workflows/deploy.yml", "Deploy", DISPATCHABLE)
            .with_workflow("octo/alpha", ".github/workflows/ci.yml", "CI", "on: push\n")
            .with_workflow("octo/alpha", ".github/workflows/broken.yml", "Broken", "on: [\n")
    }

    #[tokio::test]
    async fn test_repositories_sorted_with_counts() {
        let payload = load_repositories(Arc::new(api()), FanOut::new(2), CancellationToken::new())
            .await
            .unwrap();
        let StreamPayload::Repositories(rows) = payload else {
            panic!("wrong payload");
        };
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["octo/alpha", "octo/zeta"]);
        assert_eq!(rows[0].workflow_count, 3);
        assert_eq!(rows[1].workflow_count, 0);
    }

    #[tokio::test]
    async fn test_repository_probe_failure_fails_whole_fetch() {
        let mock = api();
        mock.fail_repository("octo/zeta");
        let result = load_repositories(Arc::new(mock), FanOut::new(2), CancellationToken::new()).await;
        assert_eq!(result.unwrap_err().code(), "FD-030");
    }

    #[tokio::test]
    async fn test_only_dispatchable_workflows_listed() {
        let payload = load_triggerable_workflows(
            Arc::new(api()),
            FanOut::new(4),
            CancellationToken::new(),
            "octo/alpha".into(),
            "trunk".into(),
        )
        .await
        .unwrap();
        let StreamPayload::Workflows(workflows) = payload else {
            panic!("wrong payload");
        };
        assert_eq!(workflows.len(), 1);
        assert_eq!(workflows[0].name(), "Deploy");
        assert_eq!(workflows[0].file_name(), "deploy.yml");
    }

    #[tokio::test]
    async fn test_per_branch_file_content() {
        let mock = api().with_file(
            "octo/alpha",
            "feature",
            ".github/workflows/ci.yml",
            "on: workflow_dispatch\n",
        );
        let payload = load_triggerable_workflows(
            Arc::new(mock),
            FanOut::new(4),
            CancellationToken::new(),
            "octo/alpha".into(),
            "feature".into(),
        )
        .await
        .unwrap();
        assert_eq!(payload.len(), 2);
    }

    #[tokio::test]
    async fn test_default_branch_first() {
        let mock = MockGitHub::new()
            .with_repository("octo/app", "main")
            .with_branches("octo/app", &["a-feature"]);
        let payload = load_branches(Arc::new(mock), "octo/app".into(), "a-feature".into())
            .await
            .unwrap();
        let StreamPayload::Branches(branches) = payload else {
            panic!("wrong payload");
        };
        assert_eq!(branches[0].name, "a-feature");
        assert_eq!(branches[1].name, "main");
    }
}
