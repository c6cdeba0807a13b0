//! Process-wide guard for failures that never reach the error boundary:
//! panics on any thread and background tasks that fail or panic. Everything
//! is logged; nothing terminates the process.

use std::future::Future;
use std::panic;
use std::time::Duration;

use tokio::task::JoinHandle;

pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let message = match info.payload().downcast_ref::<&str>() {
            Some(s) => *s,
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => s.as_str(),
                None => "Unknown panic payload",
            },
        };
        let (file, line) = info
            .location()
            .map(|l| (l.file(), l.line()))
            .unwrap_or(("<unknown>", 0));
        tracing::error!(%message, file, line, "panic");
    }));
}

/// Runs `task` on the runtime and reports how it ended.
pub fn supervise<F>(name: &'static str, task: F) -> JoinHandle<()>
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let inner = tokio::spawn(task);
    tokio::spawn(async move {
        match inner.await {
            Ok(Ok(())) => tracing::debug!(task = name, "background_task_finished"),
            Ok(Err(e)) => tracing::error!(task = name, error = ?e, "background_task_failed"),
            Err(e) if e.is_panic() => tracing::error!(task = name, error = ?e, "background_task_panicked"),
            Err(e) => tracing::warn!(task = name, error = ?e, "background_task_cancelled"),
        }
    })
}

/// Repeats `step` every `period`. A failed iteration is logged and the loop
/// carries on.
pub fn supervise_periodic<F, Fut>(name: &'static str, period: Duration, step: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    supervise(name, async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = step().await {
                tracing::error!(task = name, error = ?e, "periodic_step_failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn failed_and_panicked_tasks_are_contained() {
        let failed = supervise("fails", async { Err::<(), _>(anyhow::anyhow!("nope")) });
        let panicked = supervise("panics", async {
            if true {
                panic!("kaboom");
            }
            Ok(())
        });
        assert!(failed.await.is_ok());
        assert!(panicked.await.is_ok());
    }

    #[tokio::test]
    async fn periodic_step_survives_errors() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let handle = supervise_periodic("flaky", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n % 2 == 0 {
                    anyhow::bail!("odd run {}", n);
                }
                Ok(())
            }
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(runs.load(Ordering::SeqCst) >= 3);
        handle.abort();
    }
}
