use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Run `pass` now, then every `period`, until `cancel` fires.
///
/// Errors from a pass are logged and the loop keeps going. Cancellation is
/// observed between passes; a pass in flight runs to completion.
pub async fn run_interval<F, Fut, E>(name: &'static str, period: Duration, cancel: CancellationToken, mut pass: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    info!("{}: starting fetch interval (every {}s)", name, period.as_secs());

    if let Err(e) = pass().await {
        error!("{}: {}", name, e);
    }

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("{}: stopping fetch interval", name);
                return;
            }
            _ = ticker.tick() => {
                debug!("{}: running scheduled pass", name);
                if let Err(e) = pass().await {
                    error!("{}: {}", name, e);
                }
            }
        }
    }
}

/// Spawn `run_interval` as a background task
pub fn spawn_interval<F, Fut, E>(name: &'static str, period: Duration, cancel: CancellationToken, pass: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(run_interval(name, period, cancel, pass))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PERIOD: Duration = Duration::from_secs(300);

    fn counting_pass(runs: Arc<AtomicUsize>) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = Result<(), String>> + Send>> {
        move || {
            let runs = runs.clone();
            Box::pin(async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let handle = spawn_interval("test", PERIOD, cancel.clone(), counting_pass(runs.clone()));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(PERIOD).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        tokio::time::sleep(PERIOD).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_loop() {
        let runs = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let handle = spawn_interval("test", PERIOD, cancel.clone(), counting_pass(runs.clone()));

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        handle.await.unwrap();

        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_do_not_stop_loop() {
        let runs = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let counter = runs.clone();
        let handle = spawn_interval("failing", PERIOD, cancel.clone(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("upstream unavailable".to_string())
            }
        });

        tokio::time::sleep(PERIOD * 2 + Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        cancel.cancel();
        handle.await.unwrap();
    }
}
