//! Dock status polling.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::remote::RemoteCall;
use crate::state::DeviceSnapshot;

/// Interval between status fetches.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Fetch one status snapshot.
///
/// Any failure, transport-level or backend-reported, falls back to the
/// default disconnected snapshot rather than keeping stale state around.
pub async fn fetch_state(client: &dyn RemoteCall) -> DeviceSnapshot {
    match client.call("get_menu_state", json!({})).await {
        Ok(result) => match serde_json::from_value(result) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                debug!("discarding malformed snapshot: {}", err);
                DeviceSnapshot::default()
            },
        },
        Err(err) => {
            debug!("status fetch failed: {}", err);
            DeviceSnapshot::default()
        },
    }
}

/// Repeating dock status poll.
///
/// The timer task is owned by this value: dropping the poller tears the
/// schedule down with it, so restarting can never accumulate duplicate
/// timers.
pub struct StatusPoller {
    rx: watch::Receiver<DeviceSnapshot>,
    task: JoinHandle<()>,
}

impl StatusPoller {
    /// Start polling: one immediate fetch, then one fetch per tick.
    pub fn start(client: Arc<dyn RemoteCall>) -> Self {
        let (tx, rx) = watch::channel(DeviceSnapshot::default());

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(POLL_INTERVAL);
            loop {
                ticker.tick().await;
                let snapshot = fetch_state(client.as_ref()).await;
                // Unconditional overwrite; the latest response wins.
                tx.send_replace(snapshot);
            }
        });

        Self { rx, task }
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> DeviceSnapshot {
        *self.rx.borrow()
    }

    /// Receiver notified after every completed fetch.
    pub fn subscribe(&self) -> watch::Receiver<DeviceSnapshot> {
        self.rx.clone()
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::remote::RemoteError;
    use crate::state::Rgb;

    /// Backend stub returning a fixed reply and counting fetches.
    struct StubClient {
        calls: AtomicUsize,
        reply: Result<Value, ()>,
    }

    impl StubClient {
        fn new(reply: Result<Value, ()>) -> Self {
            Self { calls: AtomicUsize::new(0), reply }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteCall for StubClient {
        async fn call(&self, method: &str, args: Value) -> Result<Value, RemoteError> {
            assert_eq!(method, "get_menu_state");
            assert_eq!(args, json!({}));

            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|_| RemoteError::Unsuccessful)
        }
    }

    fn breathing_snapshot() -> Value {
        json!({
            "state": true,
            "effect": 3,
            "speed": 4,
            "colour": { "r": 255, "g": 0, "b": 255 },
            "connected": true,
        })
    }

    #[tokio::test]
    async fn failed_fetch_yields_default() {
        let client = StubClient::new(Err(()));

        assert_eq!(fetch_state(&client).await, DeviceSnapshot::default());
    }

    #[tokio::test]
    async fn malformed_snapshot_yields_default() {
        let client = StubClient::new(Ok(json!({ "state": "definitely not a bool" })));

        assert_eq!(fetch_state(&client).await, DeviceSnapshot::default());
    }

    #[tokio::test]
    async fn successful_fetch_applied_verbatim() {
        let client = StubClient::new(Ok(breathing_snapshot()));

        let expected = DeviceSnapshot {
            enabled: true,
            effect: 3,
            speed: 4,
            colour: Rgb { r: 255, g: 0, b: 255 },
            connected: true,
        };
        assert_eq!(fetch_state(&client).await, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_fetches_immediately_then_per_tick() {
        let client = Arc::new(StubClient::new(Ok(breathing_snapshot())));
        let poller = StatusPoller::start(client.clone());

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(client.calls(), 1);
        assert!(poller.snapshot().connected);

        time::sleep(POLL_INTERVAL * 3).await;
        assert_eq!(client.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_falls_back_on_failure() {
        let client = Arc::new(StubClient::new(Err(())));
        let poller = StatusPoller::start(client);

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(poller.snapshot(), DeviceSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_leaves_one_active_timer() {
        let client = Arc::new(StubClient::new(Ok(breathing_snapshot())));

        let poller = StatusPoller::start(client.clone());
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(client.calls(), 1);
        drop(poller);

        // A dropped poller must stop fetching.
        time::sleep(POLL_INTERVAL * 2).await;
        assert_eq!(client.calls(), 1);

        // A restarted poller ticks alone, not on top of the old schedule.
        let _poller = StatusPoller::start(client.clone());
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(client.calls(), 2);
        time::sleep(POLL_INTERVAL).await;
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn watchers_observe_every_fetch() {
        let client = Arc::new(StubClient::new(Ok(breathing_snapshot())));
        let poller = StatusPoller::start(client);
        let mut rx = poller.subscribe();

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().enabled);
    }
}
