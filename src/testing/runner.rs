//! Scenario orchestration
//!
//! Scenarios run strictly in workbook order. Each one walks
//! `Pending -> Restoring? -> PayloadResolving? -> Requesting -> Validating -> Done`
//! inside its own timeout budget; a failure at any step is recorded against
//! that scenario and the run moves on. Values saved by a scenario are written
//! to the store only once it is done, so they are visible to every later
//! scenario and never to a failed one.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use crate::common::config::{Config, Timeouts};
use crate::common::{Error, Result};
use crate::http::{HttpRequest, HttpTransport, RequestExecutor};
use crate::store::ConfigStore;
use crate::template::{load_payload, template_headers, template_url};
use crate::validate::{ResponseValidator, SchemaCatalog, ValidatedResponse};

use super::config::Scenario;
use super::restore::RestoreHook;

/// Where a scenario is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    Pending,
    Restoring,
    PayloadResolving,
    Requesting,
    Validating,
    Done,
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioState::Pending => "pending",
            ScenarioState::Restoring => "restoring test data",
            ScenarioState::PayloadResolving => "resolving payload",
            ScenarioState::Requesting => "requesting",
            ScenarioState::Validating => "validating",
            ScenarioState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of one scenario
#[derive(Debug)]
pub struct ScenarioOutcome {
    /// Position in the workbook, starting at 1
    pub index: usize,
    pub label: String,
    /// Fully resolved URL, once it could be built
    pub target: Option<String>,
    /// `Done` on success, otherwise the state the scenario failed in
    pub state: ScenarioState,
    pub error: Option<Error>,
    /// Store key written by this scenario
    pub saved: Option<String>,
    pub duration: Duration,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "index": self.index,
            "label": self.label,
            "target": self.target,
            "passed": self.passed(),
            "state": self.state.to_string(),
            "saved": self.saved,
            "duration_ms": self.duration.as_millis() as u64,
            "error": self.error.as_ref().map(|e| json!({
                "code": e.code(),
                "message": e.to_string(),
            })),
        })
    }
}

/// Result of a run
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<ScenarioOutcome>,
    /// Scenarios not run because the run stopped at the first failure
    pub skipped: usize,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0 && self.skipped == 0
    }

    pub fn to_json(&self) -> Value {
        json!({
            "passed": self.passed(),
            "failed": self.failed(),
            "skipped": self.skipped,
            "scenarios": self.outcomes.iter().map(ScenarioOutcome::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Options for a whole run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only run scenarios whose label contains this text
    pub filter: Option<String>,
    /// Stop after the first failing scenario
    pub bail: bool,
}

/// Drives scenarios against one config store
pub struct ScenarioRunner<T> {
    store: ConfigStore,
    executor: RequestExecutor<T>,
    validator: ResponseValidator,
    payloads_dir: PathBuf,
    restore: Option<RestoreHook>,
    timeouts: Timeouts,
}

impl<T: HttpTransport> ScenarioRunner<T> {
    pub fn new(store: ConfigStore, transport: T, config: &Config) -> Self {
        Self {
            store,
            executor: RequestExecutor::new(transport),
            validator: ResponseValidator::new(SchemaCatalog::new(&config.fixtures.schemas_dir)),
            payloads_dir: config.fixtures.payloads_dir.clone(),
            restore: config.restore.command.clone().map(RestoreHook::new),
            timeouts: config.timeouts.clone(),
        }
    }

    /// Replace the schema validator, e.g. with a custom `SchemaCatalog`
    pub fn with_validator(mut self, validator: ResponseValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn into_store(self) -> ConfigStore {
        self.store
    }

    pub fn transport(&self) -> &T {
        self.executor.transport()
    }

    /// Run scenarios in order
    pub async fn run_all(&mut self, scenarios: &[Scenario], options: &RunOptions) -> RunReport {
        let mut report = RunReport::default();

        let selected: Vec<(usize, &Scenario)> = scenarios
            .iter()
            .enumerate()
            .map(|(i, scenario)| (i + 1, scenario))
            .filter(|(_, scenario)| match &options.filter {
                Some(filter) => scenario.label().contains(filter.as_str()),
                None => true,
            })
            .collect();

        let total = selected.len();
        for (position, (index, scenario)) in selected.into_iter().enumerate() {
            let outcome = self.run_scenario(index, scenario).await;
            let failed = !outcome.passed();
            report.outcomes.push(outcome);

            if failed && options.bail {
                report.skipped = total - position - 1;
                break;
            }
        }

        tracing::debug!(
            keys = ?self.store.keys().collect::<Vec<_>>(),
            "Config store after run"
        );
        report
    }

    /// Run a single scenario and apply its store update
    pub async fn run_scenario(&mut self, index: usize, scenario: &Scenario) -> ScenarioOutcome {
        let label = scenario.label();
        let budget = self.timeouts.budget(scenario.restore_db, scenario.delay());
        tracing::info!(index, scenario = %label, budget_ms = budget.as_millis() as u64, "Running scenario");

        let started = Instant::now();
        let mut state = ScenarioState::Pending;
        let mut target = None;

        let result =
            match tokio::time::timeout(budget, self.drive(scenario, &mut state, &mut target)).await
            {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout {
                    budget_ms: budget.as_millis() as u64,
                    state: state.to_string(),
                }),
            };

        let mut outcome = ScenarioOutcome {
            index,
            label,
            target,
            state,
            error: None,
            saved: None,
            duration: started.elapsed(),
        };

        match result {
            Ok(validated) => {
                if let Some(key) = &scenario.save_to_db {
                    self.store.insert(key.clone(), validated.extracted());
                    tracing::debug!(key = %key, "Saved response to config store");
                    outcome.saved = Some(key.clone());
                }
                outcome.state = ScenarioState::Done;
                tracing::info!(index, scenario = %outcome.label, "Scenario passed");
            }
            Err(e) => {
                tracing::warn!(index, scenario = %outcome.label, state = %outcome.state, error = %e, "Scenario failed");
                outcome.error = Some(e);
            }
        }

        outcome
    }

    async fn drive(
        &self,
        scenario: &Scenario,
        state: &mut ScenarioState,
        target: &mut Option<String>,
    ) -> Result<ValidatedResponse> {
        if scenario.restore_db {
            transition(state, ScenarioState::Restoring);
            let hook = self.restore.as_ref().ok_or_else(|| {
                Error::Restore("scenario requests a restore but no restore command is configured".to_string())
            })?;
            hook.run().await?;
        }

        let body = match &scenario.payload {
            Some(name) => {
                transition(state, ScenarioState::PayloadResolving);
                Some(load_payload(&self.payloads_dir, name, &self.store).await?)
            }
            None => None,
        };

        transition(state, ScenarioState::Requesting);
        let url = template_url(&scenario.url, &self.store.server_url()?, &self.store)?;
        *target = Some(url.clone());
        let request = HttpRequest {
            method: scenario.method.clone(),
            url,
            headers: template_headers(&scenario.headers, &self.store)?,
            body,
        };
        let response = self.executor.execute(&request, scenario.delay()).await?;

        transition(state, ScenarioState::Validating);
        self.validator
            .validate(scenario, &request.url, &response)
            .await
    }
}

fn transition(state: &mut ScenarioState, next: ScenarioState) {
    tracing::debug!(from = %state, to = %next, "Scenario state");
    *state = next;
}
