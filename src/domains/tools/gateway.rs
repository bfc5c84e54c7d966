//! Runs Garmin Connect calls off the async runtime.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::error::{ToolError, ToolResult};
use crate::core::lazy::LazyClient;
use crate::garmin::{ConnectApi, ConnectError, Operation};

/// Lazily authenticated Garmin Connect session shared by all tools.
pub type ConnectCell = LazyClient<dyn ConnectApi, ConnectError>;

/// Handle tool handlers use to reach Garmin Connect.
///
/// Cloning is cheap. The first call through any clone triggers login.
#[derive(Clone)]
pub struct Gateway {
    client: Arc<ConnectCell>,
}

impl Gateway {
    pub fn new(client: Arc<ConnectCell>) -> Self {
        Self { client }
    }

    /// Gateway over an already created session.
    pub fn from_api(api: Arc<dyn ConnectApi>) -> Self {
        Self::new(Arc::new(LazyClient::new(move || Ok(api.clone()))))
    }

    /// Whether the session has been established.
    pub fn is_connected(&self) -> bool {
        self.client.is_ready()
    }

    /// Execute `op` on a blocking worker thread.
    pub async fn call(&self, op: Operation) -> ToolResult<Value> {
        let method = op.method_name();
        let gateway = self.clone();

        tokio::task::spawn_blocking(move || gateway.call_blocking(&op))
            .await
            .map_err(|e| {
                ToolError::Unexpected(anyhow::Error::new(e).context(format!("{method} worker failed")))
            })?
    }

    /// Execute `op` on the current thread.
    ///
    /// Only for code already running on a blocking worker.
    pub fn call_blocking(&self, op: &Operation) -> ToolResult<Value> {
        let client = self.client.get()?;
        debug!(method = op.method_name(), "Calling Garmin Connect");
        Ok(client.call(op)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::garmin::testing::FakeConnect;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_call_returns_client_value() {
        let fake = FakeConnect::returning(json!({"steps": 1200}));
        let gateway = Gateway::from_api(fake.clone());

        let value = gateway
            .call(Operation::Stats { date: "2024-01-15".into() })
            .await
            .unwrap();

        assert_eq!(value["steps"], 1200);
        assert_eq!(fake.calls(), vec![Operation::Stats { date: "2024-01-15".into() }]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_runtime_keeps_running_during_call() {
        let caller = std::thread::current().id();
        let (tx, rx) = mpsc::channel::<()>();
        let rx = Mutex::new(rx);
        let fake = FakeConnect::new(move |_| {
            // Only a free runtime thread can deliver the signal.
            rx.lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(5))
                .map_err(|_| ConnectError::invalid_response("runtime was blocked"))?;
            Ok(json!(std::thread::current().id() != caller))
        });
        let gateway = Gateway::from_api(fake);

        let signal = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(()).unwrap();
        });

        let value = gateway.call(Operation::Devices).await.unwrap();
        assert_eq!(value, json!(true));
        signal.await.unwrap();
    }

    #[tokio::test]
    async fn test_client_error_is_mapped() {
        let fake = FakeConnect::new(|_| {
            Err(ConnectError::Api {
                status: 404,
                message: "Not Found".into(),
            })
        });
        let gateway = Gateway::from_api(fake);

        let err = gateway.call(Operation::Devices).await.unwrap_err();
        assert!(matches!(err, ToolError::Api(_)));
    }

    #[tokio::test]
    async fn test_failed_login_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let cell: ConnectCell = LazyClient::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ConnectError::authentication("bad password"))
            } else {
                Ok(FakeConnect::returning(json!([])) as Arc<dyn ConnectApi>)
            }
        });
        let gateway = Gateway::new(Arc::new(cell));

        let err = gateway.call(Operation::Devices).await.unwrap_err();
        assert!(matches!(err, ToolError::Authentication(_)));
        assert!(!gateway.is_connected());

        assert_eq!(gateway.call(Operation::Devices).await.unwrap(), json!([]));
        assert!(gateway.is_connected());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_worker_panic_is_unexpected() {
        let fake = FakeConnect::new(|_| panic!("boom"));
        let gateway = Gateway::from_api(fake);

        let err = gateway.call(Operation::Devices).await.unwrap_err();
        assert!(!err.is_domain());
        assert!(err.to_string().contains("get_devices"));
    }
}
