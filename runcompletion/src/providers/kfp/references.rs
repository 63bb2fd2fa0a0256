//! Reference resolution for backend A.
//!
//! Current runs carry a structured reference block in their description.
//! Runs started by a recurring job carry it on the job instead, and runs
//! created by older versions only have the legacy reference list. The
//! [`ReferenceStrategy`] list is tried in order and the first strategy that
//! yields references wins.

use super::api::{JobService, Relationship, ResourceType, RunDetail, RunService};
use crate::cancellation::CancellationToken;
use crate::core::ResourceReferences;
use crate::errors::{Result, RunCompletionError};
use crate::utils::normalize_utc;
use std::sync::Arc;
use tracing::debug;

/// One way of deriving references from a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceStrategy {
    /// Decode the block in the run's description.
    RunDescription,
    /// Decode the block in the description of the job that created the run.
    CreatorJobDescription,
    /// Rebuild what the legacy reference list allows. Always yields.
    LegacyReferenceScan,
}

impl ReferenceStrategy {
    /// The strategies in resolution order.
    pub const ORDERED: [Self; 3] = [
        Self::RunDescription,
        Self::CreatorJobDescription,
        Self::LegacyReferenceScan,
    ];

    /// Attempts this strategy. `Ok(None)` passes to the next one.
    pub async fn attempt(
        self,
        run: &RunDetail,
        jobs: &dyn JobService,
        cancel: &CancellationToken,
    ) -> Result<Option<ResourceReferences>> {
        match self {
            Self::RunDescription => decode_description(&run.description),
            Self::CreatorJobDescription => {
                let Some(reference) = run
                    .resource_references
                    .iter()
                    .find(|r| r.is(ResourceType::Job, Relationship::Creator))
                else {
                    return Ok(None);
                };
                let job_id = reference.key.id.as_str();
                let job = cancel
                    .run_until_cancelled(async {
                        jobs.get_job(job_id)
                            .await
                            .map_err(|e| RunCompletionError::backend("GetJob", e))
                    })
                    .await?;
                decode_description(&job.description)
            }
            Self::LegacyReferenceScan => Ok(Some(legacy_scan(run))),
        }
    }
}

/// Decodes a reference block. An empty description yields nothing.
fn decode_description(description: &str) -> Result<Option<ResourceReferences>> {
    if description.is_empty() {
        return Ok(None);
    }
    ResourceReferences::from_yaml(description)
        .map(Some)
        .map_err(|e| RunCompletionError::MalformedReferences(e.to_string()))
}

/// Older resources only name the creating job and the owning namespace.
/// The pipeline name is left for the event assembler's fallback.
fn legacy_scan(run: &RunDetail) -> ResourceReferences {
    let mut references = ResourceReferences::default();
    for reference in &run.resource_references {
        if reference.is(ResourceType::Job, Relationship::Creator) {
            references.run_configuration_name.name.clone_from(&reference.name);
        } else if reference.is(ResourceType::Namespace, Relationship::Owner) {
            references.run_name.name.clone_from(&run.name);
            references.run_name.namespace.clone_from(&reference.key.id);
        }
    }
    references
}

/// Resolves references for backend A runs.
#[derive(Clone)]
pub struct KfpReferenceResolver {
    runs: Arc<dyn RunService>,
    jobs: Arc<dyn JobService>,
    strategies: Vec<ReferenceStrategy>,
}

impl KfpReferenceResolver {
    /// Creates a resolver using [`ReferenceStrategy::ORDERED`].
    #[must_use]
    pub fn new(runs: Arc<dyn RunService>, jobs: Arc<dyn JobService>) -> Self {
        Self {
            runs,
            jobs,
            strategies: ReferenceStrategy::ORDERED.to_vec(),
        }
    }

    /// Replaces the strategy list.
    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<ReferenceStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Fetches the run and resolves its references.
    ///
    /// A run the service no longer knows is [`RunCompletionError::ResourceGone`].
    pub async fn resolve(
        &self,
        run_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ResourceReferences> {
        let run = cancel
            .run_until_cancelled(async {
                self.runs
                    .get_run(run_id)
                    .await
                    .map_err(|e| RunCompletionError::fetching("GetRun", format!("run {run_id}"), e))
            })
            .await?;

        let mut resolved = None;
        for strategy in &self.strategies {
            if let Some(references) = strategy.attempt(&run, self.jobs.as_ref(), cancel).await? {
                debug!(run_id, ?strategy, "resolved resource references");
                resolved = Some(references);
                break;
            }
        }

        Ok(resolved.unwrap_or_default().with_times(
            run.created_at.as_ref().and_then(normalize_utc),
            run.finished_at.as_ref().and_then(normalize_utc),
        ))
    }
}

impl std::fmt::Debug for KfpReferenceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KfpReferenceResolver")
            .field("strategies", &self.strategies)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NamespacedName;
    use crate::errors::BackendError;
    use crate::providers::kfp::api::{
        JobDetail, MockJobService, MockRunService, ResourceReference,
    };
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    const BLOCK: &str = "pipelineName: team/pipeline\nrunConfigurationName: team/rc\nrunName: team/run\n";

    fn creator_job() -> ResourceReference {
        ResourceReference::new(ResourceType::Job, "job-1", "legacy-rc", Relationship::Creator)
    }

    fn owner_namespace() -> ResourceReference {
        ResourceReference::new(ResourceType::Namespace, "team", "", Relationship::Owner)
    }

    fn runs_returning(run: RunDetail) -> MockRunService {
        let mut runs = MockRunService::new();
        runs.expect_get_run()
            .withf(|id| id == "run-1")
            .times(1)
            .returning(move |_| Ok(run.clone()));
        runs
    }

    fn resolver(runs: MockRunService, jobs: MockJobService) -> KfpReferenceResolver {
        KfpReferenceResolver::new(Arc::new(runs), Arc::new(jobs))
    }

    fn block_references() -> ResourceReferences {
        ResourceReferences {
            pipeline_name: NamespacedName::new("pipeline", "team"),
            run_configuration_name: NamespacedName::new("rc", "team"),
            run_name: NamespacedName::new("run", "team"),
            ..ResourceReferences::default()
        }
    }

    #[tokio::test]
    async fn test_run_description_skips_legacy_lookups() {
        let run = RunDetail {
            description: BLOCK.into(),
            resource_references: vec![creator_job(), owner_namespace()],
            ..RunDetail::default()
        };
        let mut jobs = MockJobService::new();
        jobs.expect_get_job().times(0);

        let references = resolver(runs_returning(run), jobs)
            .resolve("run-1", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(references, block_references());
    }

    #[tokio::test]
    async fn test_creator_job_description() {
        let run = RunDetail {
            resource_references: vec![creator_job()],
            ..RunDetail::default()
        };
        let mut jobs = MockJobService::new();
        jobs.expect_get_job()
            .withf(|id| id == "job-1")
            .times(1)
            .returning(|_| {
                Ok(JobDetail {
                    description: BLOCK.into(),
                    ..JobDetail::default()
                })
            });

        let references = resolver(runs_returning(run), jobs)
            .resolve("run-1", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(references, block_references());
    }

    #[tokio::test]
    async fn test_legacy_scan_used_verbatim() {
        let run = RunDetail {
            name: "legacy-run".into(),
            resource_references: vec![owner_namespace(), creator_job()],
            ..RunDetail::default()
        };
        let mut jobs = MockJobService::new();
        jobs.expect_get_job()
            .times(1)
            .returning(|_| Ok(JobDetail::default()));

        let references = resolver(runs_returning(run), jobs)
            .resolve("run-1", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            references,
            ResourceReferences {
                run_configuration_name: NamespacedName::named("legacy-rc"),
                run_name: NamespacedName::new("legacy-run", "team"),
                ..ResourceReferences::default()
            }
        );
    }

    #[tokio::test]
    async fn test_times_are_taken_from_the_run() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let run = RunDetail {
            description: BLOCK.into(),
            created_at: Some(created),
            finished_at: Some(Utc.timestamp_opt(0, 0).unwrap()),
            ..RunDetail::default()
        };

        let references = resolver(runs_returning(run), MockJobService::new())
            .resolve("run-1", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(references.created_at, Some(created));
        assert_eq!(references.finished_at, None);
    }

    #[tokio::test]
    async fn test_malformed_block_is_recoverable() {
        let run = RunDetail {
            description: "pipelineName: [unclosed".into(),
            ..RunDetail::default()
        };

        let err = resolver(runs_returning(run), MockJobService::new())
            .resolve("run-1", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RunCompletionError::MalformedReferences(_)));
        assert_eq!(err.failure_kind(), crate::errors::FailureKind::Recoverable);
    }

    #[tokio::test]
    async fn test_run_not_found_is_resource_gone() {
        let mut runs = MockRunService::new();
        runs.expect_get_run()
            .times(1)
            .returning(|_| Err(BackendError::not_found("no such run")));

        let err = resolver(runs, MockJobService::new())
            .resolve("run-1", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RunCompletionError::ResourceGone { .. }));
    }

    #[tokio::test]
    async fn test_job_errors_propagate() {
        let run = RunDetail {
            resource_references: vec![creator_job()],
            ..RunDetail::default()
        };
        let mut jobs = MockJobService::new();
        jobs.expect_get_job()
            .times(1)
            .returning(|_| Err(BackendError::not_found("job deleted")));

        let err = resolver(runs_returning(run), jobs)
            .resolve("run-1", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RunCompletionError::Backend { operation: "GetJob", .. }));
    }

    #[tokio::test]
    async fn test_strategies_are_independently_usable() {
        let run = RunDetail {
            description: BLOCK.into(),
            resource_references: vec![owner_namespace()],
            name: "r".into(),
            ..RunDetail::default()
        };

        let references = resolver(runs_returning(run), MockJobService::new())
            .with_strategies(vec![ReferenceStrategy::LegacyReferenceScan])
            .resolve("run-1", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(references.run_name, NamespacedName::new("r", "team"));
        assert!(references.pipeline_name.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_fetch() {
        let cancel = CancellationToken::new();
        cancel.cancel("shutdown");

        let mut runs = MockRunService::new();
        runs.expect_get_run().times(0);

        let err = resolver(runs, MockJobService::new())
            .resolve("run-1", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RunCompletionError::Cancelled(_)));
    }
}
