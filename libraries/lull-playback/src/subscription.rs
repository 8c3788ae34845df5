//! Owned notification task

use tokio::task::JoinHandle;

/// Background task that feeds notifications to the coordinator
///
/// Dropping the subscription aborts the task, so once the owner lets go no
/// further notification can be produced by it.
#[derive(Debug)]
pub(crate) struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
