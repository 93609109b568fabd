//! Multi-parameter rule scheduler.
//!
//! Waits for the correlation accumulator to complete a batch of
//! distinct parameters, binds the batch to the slots named in the rule
//! expression, and evaluates every workflow against the combined
//! inputs. Same cadence and containment rules as the single-parameter
//! scheduler.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use edgerule_core::config::MultiRuleConfig;
use edgerule_rules::{first_enabled_expression, load_workflows, RuleError, RuleEvaluator, Workflow};

use crate::dispatch::Dispatcher;
use crate::error::EngineError;
use crate::feed::SampleFeed;
use crate::state::SchedulerState;

pub struct MultiParamExecutor {
    config: MultiRuleConfig,
    feed: Arc<SampleFeed>,
    evaluator: Arc<dyn RuleEvaluator>,
    dispatch: Arc<Dispatcher>,
    state: Mutex<SchedulerState>,
    cancel: Mutex<Option<watch::Sender<bool>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MultiParamExecutor {
    pub fn new(
        config: MultiRuleConfig,
        feed: Arc<SampleFeed>,
        evaluator: Arc<dyn RuleEvaluator>,
        dispatch: Arc<Dispatcher>,
    ) -> Self {
        Self {
            config,
            feed,
            evaluator,
            dispatch,
            state: Mutex::new(SchedulerState::Idle),
            cancel: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock().expect("scheduler state lock poisoned")
    }

    fn set_state(&self, next: SchedulerState) {
        *self.state.lock().expect("scheduler state lock poisoned") = next;
    }

    /// Load the rule file, cache the slot-binding expression, and spawn
    /// the tick loop. A rule set without an enabled rule cannot bind
    /// slots and fails initialization.
    pub fn start(&self) -> Result<(), EngineError> {
        {
            let mut state = self.state.lock().expect("scheduler state lock poisoned");
            if !state.can_start() {
                warn!(state = %state, "multi-parameter scheduler already active");
                return Err(EngineError::InvalidState(*state));
            }
            *state = SchedulerState::Initializing;
        }

        let init = load_workflows(&self.config.rule_dir).and_then(|workflows| {
            let expression = first_enabled_expression(&workflows)
                .ok_or_else(|| {
                    RuleError::Validation("no enabled rule to bind slots from".to_string())
                })?
                .to_string();
            Ok((workflows, expression))
        });
        let (workflows, expression) = match init {
            Ok(parts) => parts,
            Err(e) => {
                error!(
                    rule_dir = %self.config.rule_dir.display(),
                    error = %e,
                    "multi-parameter scheduler failed to initialize"
                );
                self.set_state(SchedulerState::Idle);
                return Err(e.into());
            }
        };

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.feed),
            Arc::clone(&self.evaluator),
            Arc::clone(&self.dispatch),
            workflows,
            expression,
            self.config.parameters_to_analyze,
            Duration::from_secs(self.config.execution_secs.max(1)),
            cancel_rx,
        ));

        *self.cancel.lock().expect("scheduler cancel lock poisoned") = Some(cancel_tx);
        *self.handle.lock().expect("scheduler handle lock poisoned") = Some(handle);
        self.set_state(SchedulerState::Running);
        info!(
            rule_dir = %self.config.rule_dir.display(),
            interval_secs = self.config.execution_secs,
            width = self.config.parameters_to_analyze,
            "multi-parameter scheduler started"
        );
        Ok(())
    }

    /// Stop the tick loop, waiting for an in-flight tick to finish.
    /// Idempotent; a second call returns immediately.
    pub async fn stop(&self) {
        {
            let mut state = self.state.lock().expect("scheduler state lock poisoned");
            if !matches!(*state, SchedulerState::Running) {
                return;
            }
            *state = SchedulerState::Stopping;
        }

        if let Some(cancel) = self
            .cancel
            .lock()
            .expect("scheduler cancel lock poisoned")
            .take()
        {
            let _ = cancel.send(true);
        }
        let handle = self
            .handle
            .lock()
            .expect("scheduler handle lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.set_state(SchedulerState::Stopped);
        info!("multi-parameter scheduler stopped");
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_loop(
    feed: Arc<SampleFeed>,
    evaluator: Arc<dyn RuleEvaluator>,
    dispatch: Arc<Dispatcher>,
    workflows: Vec<Workflow>,
    expression: String,
    width: usize,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    loop {
        if *cancel.borrow() {
            break;
        }
        let started = Instant::now();
        tick(&feed, evaluator.as_ref(), &dispatch, &workflows, &expression, width).await;

        let delay = interval.saturating_sub(started.elapsed());
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.changed() => break,
        }
    }
}

async fn tick(
    feed: &SampleFeed,
    evaluator: &dyn RuleEvaluator,
    dispatch: &Dispatcher,
    workflows: &[Workflow],
    expression: &str,
    width: usize,
) {
    let (inputs, samples) = feed.take_correlated(width, expression);
    if inputs.is_empty() {
        return;
    }

    for workflow in workflows {
        let outcomes = match evaluator.evaluate(workflows, &workflow.workflow_name, &inputs) {
            Ok(outcomes) => outcomes,
            Err(e) => {
                warn!(
                    workflow = %workflow.workflow_name,
                    error = %e,
                    "evaluation failed, batch skipped"
                );
                continue;
            }
        };

        let matched = outcomes.first().map(|o| o.is_success).unwrap_or(false);
        if matched {
            if let Some(rule) = workflow.first_rule() {
                dispatch
                    .multi_match(&samples, &rule.rule_name, &rule.expression)
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use edgerule_bus::MemoryBus;
    use edgerule_core::config::BusConfig;
    use edgerule_core::Sample;
    use edgerule_notify::MemoryNotifier;
    use edgerule_rules::BoundsEvaluator;
    use edgerule_store::{DurableStore, MemoryStore};

    fn bus_config() -> BusConfig {
        BusConfig {
            host: "127.0.0.1".into(),
            subscribe_port: 5560,
            publish_port: 5561,
            subscribe_topic: "datamessage".into(),
            publish_topic: "commandmessage".into(),
            data_read_interval_secs: 1,
            persist_enabled: true,
            stream_enabled: false,
            stream_length: 1000,
            command_enabled: false,
        }
    }

    fn executor(
        rule_dir: PathBuf,
        width: usize,
    ) -> (
        MultiParamExecutor,
        Arc<MemoryNotifier>,
        Arc<MemoryStore>,
        Arc<SampleFeed>,
    ) {
        let notifier = Arc::new(MemoryNotifier::new());
        let store = Arc::new(MemoryStore::new());
        let (_, publisher) = MemoryBus::channel();
        let dispatch = Arc::new(Dispatcher::new(
            notifier.clone(),
            store.clone(),
            Arc::new(publisher),
            &bus_config(),
        ));
        let feed = Arc::new(SampleFeed::new());
        let exec = MultiParamExecutor::new(
            MultiRuleConfig {
                enabled: true,
                rule_dir,
                execution_secs: 1,
                parameters_to_analyze: width,
            },
            feed.clone(),
            Arc::new(BoundsEvaluator::new()),
            dispatch,
        );
        (exec, notifier, store, feed)
    }

    const RULE_JSON: &str = r#"[
        { "WorkflowName": "CombinedCheck",
          "Rules": [ { "RuleName": "TempAndPressure",
                       "Expression": "input1.Temperature > 30 And input2.Pressure < 1000" } ] }
    ]"#;

    #[tokio::test]
    async fn start_requires_an_enabled_rule() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("rule.json"),
            r#"[{ "WorkflowName": "W", "Rules": [] }]"#,
        )
        .unwrap();
        let (exec, _, _, _) = executor(dir.path().to_path_buf(), 2);
        assert!(exec.start().is_err());
        assert_eq!(exec.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn complete_batch_raises_a_complex_alert() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rule.json"), RULE_JSON).unwrap();
        let (exec, notifier, store, feed) = executor(dir.path().to_path_buf(), 2);

        feed.multi.push(Sample::new("Temperature", "35", "m1"));
        feed.multi.push(Sample::new("Pressure", "900", "m1"));
        exec.start().unwrap();

        // One sample is consumed per tick, so the batch completes on the
        // second tick. Persistence is the final dispatch step, so waiting
        // on the store record guarantees the alert is visible too.
        let mut alerted = false;
        for _ in 0..250 {
            if store.record_count() > 0 {
                alerted = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        exec.stop().await;

        assert!(alerted, "complete batch never produced a complex alert");
        let complex = notifier.complex_alerts();
        assert_eq!(complex[0].rule_name, "TempAndPressure");
        assert_eq!(complex[0].parameter_and_values, "35 | 900");

        let record = store.get("TempAndPressure").await.unwrap().unwrap();
        assert!(record.starts_with("35 | 900**"));
    }

    #[tokio::test]
    async fn incomplete_batch_dispatches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rule.json"), RULE_JSON).unwrap();
        let (exec, notifier, store, feed) = executor(dir.path().to_path_buf(), 2);

        feed.multi.push(Sample::new("Temperature", "35", "m1"));
        exec.start().unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        exec.stop().await;

        assert!(notifier.complex_alerts().is_empty());
        assert_eq!(store.record_count(), 0);
    }

    #[tokio::test]
    async fn non_matching_batch_dispatches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rule.json"), RULE_JSON).unwrap();
        let (exec, notifier, _, feed) = executor(dir.path().to_path_buf(), 2);

        // Temperature below the bound.
        feed.multi.push(Sample::new("Temperature", "20", "m1"));
        feed.multi.push(Sample::new("Pressure", "900", "m1"));
        exec.start().unwrap();

        // Long enough for both samples to be consumed at one per tick.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        exec.stop().await;

        assert!(notifier.complex_alerts().is_empty());
    }
}
