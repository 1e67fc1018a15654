use crate::cancel::CancelToken;
use crate::types::{RunResult, RunSpec};

/// Runs one ensemble member to completion.
///
/// Implementations are called concurrently from the scheduler's workers and
/// must report every failure through the returned [`RunResult`].
pub trait ModelRunAdapter: Send + Sync {
    fn execute(&self, spec: &RunSpec, cancel: &CancelToken) -> RunResult;
}
