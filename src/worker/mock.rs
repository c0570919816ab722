use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{InvocationFailure, Worker, WorkerResult};
use crate::validate::Task;

type Respond = dyn Fn(Task, &str) -> Result<WorkerResult, InvocationFailure> + Send + Sync;

/// A scripted worker for tests. Every call runs the given closure.
pub struct MockWorker {
    respond: Box<Respond>,
    calls: AtomicUsize,
}

impl MockWorker {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(Task, &str) -> Result<WorkerResult, InvocationFailure> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always succeeds with the same output.
    pub fn replying(output: &str) -> Self {
        let output = output.to_string();
        Self::new(move |_, _| Ok(WorkerResult::ok(output.clone())))
    }

    /// How many times `invoke` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Worker for MockWorker {
    async fn invoke(&self, task: Task, text: &str) -> Result<WorkerResult, InvocationFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(task, text)
    }
}
