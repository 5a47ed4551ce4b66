//! Scriptable in-memory simulator.
//!
//! Plain paths behave like a key/value store. Paths registered with
//! [`MockSimulator::add_lever`] run a response curve on every write: the curve
//! maps the requested input to the position the lever actually settles at and
//! the output the simulator reports for it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tswio_errors::SimulatorError;
use tswio_simulator::{NodeTree, SimValue, SimulatorClient, SimulatorResult};

/// `set_input -> (actual_input, output)`.
pub type LeverResponse = Arc<dyn Fn(f64) -> (f64, f64) + Send + Sync>;

/// One `set` call as the simulator saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub path: String,
    pub value: f64,
    pub at: Instant,
}

#[derive(Clone)]
struct Lever {
    output_path: String,
    response: LeverResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Get,
    Set,
}

#[derive(Debug)]
struct Failure {
    path: String,
    op: Option<Op>,
    /// `None` fails forever.
    remaining: Option<usize>,
}

#[derive(Default)]
struct State {
    values: HashMap<String, SimValue>,
    levers: HashMap<String, Lever>,
    trees: HashMap<String, NodeTree>,
    writes: Vec<RecordedWrite>,
    failures: Vec<Failure>,
    gets: usize,
}

impl State {
    fn take_failure(&mut self, path: &str, op: Op) -> Option<SimulatorError> {
        let failure = self.failures.iter_mut().find(|f| {
            f.path == path && f.op.is_none_or(|o| o == op) && f.remaining != Some(0)
        })?;
        if let Some(n) = failure.remaining.as_mut() {
            *n = n.saturating_sub(1);
        }
        Some(SimulatorError::request(path, "injected failure"))
    }
}

/// In-memory [`SimulatorClient`].
#[derive(Clone, Default)]
pub struct MockSimulator {
    state: Arc<Mutex<State>>,
}

impl MockSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, path: &str, value: impl Into<SimValue>) -> Self {
        self.set_value(path, value);
        self
    }

    /// Set a value without recording a write.
    pub fn set_value(&self, path: &str, value: impl Into<SimValue>) {
        self.state.lock().values.insert(path.to_string(), value.into());
    }

    pub fn value(&self, path: &str) -> Option<SimValue> {
        self.state.lock().values.get(path).cloned()
    }

    /// Register a lever: writes to `value_path` go through `response`, which
    /// also updates `output_path`. The lever starts at `response(0.0)`.
    pub fn add_lever<F>(&self, value_path: &str, output_path: &str, response: F)
    where
        F: Fn(f64) -> (f64, f64) + Send + Sync + 'static,
    {
        let (actual, output) = response(0.0);
        let mut state = self.state.lock();
        state.values.insert(value_path.to_string(), SimValue::Number(actual));
        state.values.insert(output_path.to_string(), SimValue::Number(output));
        state.levers.insert(
            value_path.to_string(),
            Lever {
                output_path: output_path.to_string(),
                response: Arc::new(response),
            },
        );
    }

    pub fn add_tree(&self, path: &str, tree: NodeTree) {
        self.state.lock().trees.insert(path.to_string(), tree);
    }

    /// Fail the next `count` reads of `path`.
    pub fn fail_gets(&self, path: &str, count: usize) {
        self.push_failure(path, Some(Op::Get), Some(count));
    }

    /// Fail the next `count` writes to `path`.
    pub fn fail_sets(&self, path: &str, count: usize) {
        self.push_failure(path, Some(Op::Set), Some(count));
    }

    /// Fail every read and write of `path` until [`MockSimulator::clear_failures`].
    pub fn fail_always(&self, path: &str) {
        self.push_failure(path, None, None);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    fn push_failure(&self, path: &str, op: Option<Op>, remaining: Option<usize>) {
        self.state.lock().failures.push(Failure {
            path: path.to_string(),
            op,
            remaining,
        });
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state.lock().writes.clone()
    }

    /// Values written to `path`, oldest first.
    pub fn values_written(&self, path: &str) -> Vec<f64> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|w| w.path == path)
            .map(|w| w.value)
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    pub fn get_count(&self) -> usize {
        self.state.lock().gets
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }
}

#[async_trait]
impl SimulatorClient for MockSimulator {
    async fn get(&self, path: &str) -> SimulatorResult<SimValue> {
        let mut state = self.state.lock();
        state.gets += 1;
        if let Some(err) = state.take_failure(path, Op::Get) {
            return Err(err);
        }
        state.values.get(path).cloned().ok_or(SimulatorError::Status {
            path: path.to_string(),
            status: 404,
        })
    }

    async fn set(&self, path: &str, value: f64) -> SimulatorResult<()> {
        let mut state = self.state.lock();
        if let Some(err) = state.take_failure(path, Op::Set) {
            return Err(err);
        }
        state.writes.push(RecordedWrite {
            path: path.to_string(),
            value,
            at: Instant::now(),
        });
        match state.levers.get(path).cloned() {
            Some(lever) => {
                let (actual, output) = (lever.response)(value);
                state.values.insert(path.to_string(), SimValue::Number(actual));
                state.values.insert(lever.output_path, SimValue::Number(output));
            }
            None => {
                state.values.insert(path.to_string(), SimValue::Number(value));
            }
        }
        Ok(())
    }

    async fn list(&self, path: &str) -> SimulatorResult<NodeTree> {
        let mut state = self.state.lock();
        if let Some(err) = state.take_failure(path, Op::Get) {
            return Err(err);
        }
        state.trees.get(path).cloned().ok_or(SimulatorError::Status {
            path: path.to_string(),
            status: 404,
        })
    }
}
