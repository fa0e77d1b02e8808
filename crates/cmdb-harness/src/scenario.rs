//! Scenario trait and function-backed scenarios

use async_trait::async_trait;
use cmdb_core::{Result, RunConfig};
use futures::future::BoxFuture;

/// One independent test, run against a fresh session
#[async_trait]
pub trait Scenario<S: Sync>: Send + Sync {
    /// Test id, unique within a suite
    fn id(&self) -> String;

    /// Execute the test body
    ///
    /// Returning `CmdbError::Skipped` reports the test as skipped.
    async fn run(&self, session: &S, config: &RunConfig) -> Result<()>;
}

/// Signature of a plain scenario function
pub type ScenarioFn<S> = for<'a> fn(&'a S, &'a RunConfig) -> BoxFuture<'a, Result<()>>;

/// Scenario backed by a function pointer
pub struct FnScenario<S> {
    id: &'static str,
    body: ScenarioFn<S>,
}

impl<S> FnScenario<S> {
    pub fn new(id: &'static str, body: ScenarioFn<S>) -> Self {
        Self { id, body }
    }
}

#[async_trait]
impl<S: Sync> Scenario<S> for FnScenario<S> {
    fn id(&self) -> String {
        self.id.to_string()
    }

    async fn run(&self, session: &S, config: &RunConfig) -> Result<()> {
        (self.body)(session, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdb_core::CmdbError;
    use futures::FutureExt;

    fn passes<'a>(counter: &'a std::sync::atomic::AtomicUsize, _config: &'a RunConfig) -> BoxFuture<'a, Result<()>> {
        async move {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    }

    fn skips<'a>(_counter: &'a std::sync::atomic::AtomicUsize, _config: &'a RunConfig) -> BoxFuture<'a, Result<()>> {
        async move { Err(CmdbError::Skipped("not configured".to_string())) }.boxed()
    }

    #[tokio::test]
    async fn test_fn_scenario_runs_body() {
        let config = RunConfig::from_lookup(|_| None).unwrap();
        let counter = std::sync::atomic::AtomicUsize::new(0);

        let scenario = FnScenario::new("test_passes", passes);
        assert_eq!(scenario.id(), "test_passes");
        scenario.run(&counter, &config).await.unwrap();
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);

        let scenario = FnScenario::new("test_skips", skips);
        let err = scenario.run(&counter, &config).await.unwrap_err();
        assert!(matches!(err, CmdbError::Skipped(_)));
    }
}
