//! The simulator capability seam

use std::sync::Arc;

use async_trait::async_trait;

use crate::{NodeTree, SimValue, SimulatorResult};

/// Access to the live simulator.
///
/// Implementations must tolerate concurrent calls; levers, buttons and the
/// analyzer all share one client.
#[async_trait]
pub trait SimulatorClient: Send + Sync {
    /// Read the current value at `path`.
    async fn get(&self, path: &str) -> SimulatorResult<SimValue>;

    /// Write `value` to `path`.
    async fn set(&self, path: &str, value: f64) -> SimulatorResult<()>;

    /// Describe the node at `path` and its children.
    async fn list(&self, path: &str) -> SimulatorResult<NodeTree>;

    /// Read `path` and require a number.
    async fn get_f64(&self, path: &str) -> SimulatorResult<f64> {
        self.get(path).await?.expect_f64(path)
    }
}

#[async_trait]
impl<T: SimulatorClient + ?Sized> SimulatorClient for Arc<T> {
    async fn get(&self, path: &str) -> SimulatorResult<SimValue> {
        (**self).get(path).await
    }

    async fn set(&self, path: &str, value: f64) -> SimulatorResult<()> {
        (**self).set(path, value).await
    }

    async fn list(&self, path: &str) -> SimulatorResult<NodeTree> {
        (**self).list(path).await
    }
}
