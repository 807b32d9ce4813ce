use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt::Display;
use std::future::Future;

type Task<'a, E> = Box<dyn FnOnce() -> BoxFuture<'a, Result<(), E>> + Send + 'a>;

/// Ordered list of async tasks that run strictly one after another.
///
/// Nothing is started until [`TaskChain::run`] is awaited. Task `i + 1` is
/// only created once task `i` has resolved. The first failure stops the
/// chain: later tasks never start and the failing task's error is returned.
pub struct TaskChain<'a, E> {
    tasks: Vec<(String, Task<'a, E>)>,
}

impl<'a, E> Default for TaskChain<'a, E> {
    fn default() -> Self {
        Self { tasks: Vec::new() }
    }
}

impl<'a, E> TaskChain<'a, E>
where
    E: Display + Send + 'a,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<F, Fut>(&mut self, label: impl Into<String>, task: F) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), E>> + Send + 'a,
    {
        let boxed: Task<'a, E> = Box::new(move || task().boxed());
        self.tasks.push((label.into(), boxed));
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub async fn run(self) -> Result<(), E> {
        let total = self.tasks.len();
        for (index, (label, task)) in self.tasks.into_iter().enumerate() {
            tracing::debug!(task = %label, step = index + 1, total, "Running task");
            if let Err(e) = task().await {
                tracing::error!(
                    task = %label,
                    step = index + 1,
                    total,
                    skipped = total - index - 1,
                    error = %e,
                    "Task failed, aborting chain"
                );
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Run `tasks` in iteration order, one at a time, failing fast.
pub async fn run_sequentially<I, F, Fut, E>(tasks: I) -> Result<(), E>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    for task in tasks {
        task().await?;
    }
    Ok(())
}
