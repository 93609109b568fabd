//! Single-parameter rule scheduler.
//!
//! Pulls one sample per tick, evaluates every workflow against it, and
//! dispatches either an out-of-bounds match or a healthy status. Cadence
//! is self-correcting: each tick sleeps the interval minus its own
//! elapsed time, so slow ticks do not accumulate drift.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use edgerule_core::config::SingleRuleConfig;
use edgerule_rules::{load_workflows, RuleEvaluator, Workflow};

use crate::dispatch::Dispatcher;
use crate::error::EngineError;
use crate::feed::SampleFeed;
use crate::state::SchedulerState;

pub struct SingleParamExecutor {
    config: SingleRuleConfig,
    feed: Arc<SampleFeed>,
    evaluator: Arc<dyn RuleEvaluator>,
    dispatch: Arc<Dispatcher>,
    state: Mutex<SchedulerState>,
    cancel: Mutex<Option<watch::Sender<bool>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SingleParamExecutor {
    pub fn new(
        config: SingleRuleConfig,
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

    /// Load the rule file and spawn the tick loop.
    ///
    /// A missing or malformed rule file fails this executor only: the
    /// state drops back to `Idle` and the caller decides whether to try
    /// again.
    pub fn start(&self) -> Result<(), EngineError> {
        {
            let mut state = self.state.lock().expect("scheduler state lock poisoned");
            if !state.can_start() {
                warn!(state = %state, "single-parameter scheduler already active");
                return Err(EngineError::InvalidState(*state));
            }
            *state = SchedulerState::Initializing;
        }

        let workflows = match load_workflows(&self.config.rule_dir) {
            Ok(workflows) => workflows,
            Err(e) => {
                error!(
                    rule_dir = %self.config.rule_dir.display(),
                    error = %e,
                    "single-parameter scheduler failed to initialize"
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
            Duration::from_secs(self.config.execution_secs.max(1)),
            cancel_rx,
        ));

        *self.cancel.lock().expect("scheduler cancel lock poisoned") = Some(cancel_tx);
        *self.handle.lock().expect("scheduler handle lock poisoned") = Some(handle);
        self.set_state(SchedulerState::Running);
        info!(
            rule_dir = %self.config.rule_dir.display(),
            interval_secs = self.config.execution_secs,
            "single-parameter scheduler started"
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
        info!("single-parameter scheduler stopped");
    }
}

async fn run_loop(
    feed: Arc<SampleFeed>,
    evaluator: Arc<dyn RuleEvaluator>,
    dispatch: Arc<Dispatcher>,
    workflows: Vec<Workflow>,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    loop {
        if *cancel.borrow() {
            break;
        }
        let started = Instant::now();
        tick(&feed, evaluator.as_ref(), &dispatch, &workflows).await;

        let delay = interval.saturating_sub(started.elapsed());
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.changed() => break,
        }
    }
}

/// One evaluation pass. Errors are contained here so the loop survives
/// bad samples and bad expressions alike.
async fn tick(
    feed: &SampleFeed,
    evaluator: &dyn RuleEvaluator,
    dispatch: &Dispatcher,
    workflows: &[Workflow],
) {
    let Some((input, sample)) = feed.take_one() else {
        return;
    };

    for workflow in workflows {
        let outcomes = match evaluator.evaluate(
            workflows,
            &workflow.workflow_name,
            std::slice::from_ref(&input),
        ) {
            Ok(outcomes) => outcomes,
            Err(e) => {
                warn!(
                    workflow = %workflow.workflow_name,
                    parameter = %sample.id,
                    error = %e,
                    "evaluation failed, sample skipped"
                );
                continue;
            }
        };

        let matched = outcomes.first().map(|o| o.is_success).unwrap_or(false);
        if matched {
            let expression = workflow
                .first_rule()
                .map(|r| r.expression.as_str())
                .unwrap_or_default();
            dispatch.single_match(&sample, expression).await;
        } else {
            dispatch.healthy(&sample).await;
        }
    }
}
