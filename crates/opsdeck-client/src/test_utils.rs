//! Test utilities for the operation client
//!
//! [`FakeTransport`] records every call and replays scripted responses so
//! tests never touch the network. Responses can be held back with
//! [`FakeTransport::hold`] to exercise in-flight ordering.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use opsdeck_core::OperationError;
use tokio::sync::oneshot;

use crate::client::Method;
use crate::transport::{RawResponse, Transport};

type Reply = Result<RawResponse, OperationError>;

/// A call observed by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

enum Scripted {
    Ready(Reply),
    Held(oneshot::Receiver<Reply>),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<RecordedCall>,
    queued: HashMap<String, VecDeque<Scripted>>,
    fallback: HashMap<String, Reply>,
}

/// Scripted in-memory [`Transport`]. Clones share the same script and log.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

/// Releases one held response.
pub struct ResponseGate {
    tx: oneshot::Sender<Reply>,
}

impl ResponseGate {
    pub fn release_json(self, status: u16, body: serde_json::Value) {
        let _ = self.tx.send(Ok(RawResponse::new(status, body.to_string())));
    }

    pub fn release_error(self, error: OperationError) {
        let _ = self.tx.send(Err(error));
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn enqueue(&self, path: &str, scripted: Scripted) {
        self.with_state(|s| {
            s.queued
                .entry(path.to_string())
                .or_default()
                .push_back(scripted)
        });
    }

    /// Queue one JSON response for `path`.
    pub fn respond_json(&self, path: &str, status: u16, body: serde_json::Value) {
        self.enqueue(
            path,
            Scripted::Ready(Ok(RawResponse::new(status, body.to_string()))),
        );
    }

    /// Queue one raw-body response for `path`.
    pub fn respond_raw(&self, path: &str, status: u16, body: &str) {
        self.enqueue(path, Scripted::Ready(Ok(RawResponse::new(status, body))));
    }

    /// Queue one transport failure for `path`.
    pub fn fail(&self, path: &str, error: OperationError) {
        self.enqueue(path, Scripted::Ready(Err(error)));
    }

    /// Queue a response for `path` that is only delivered once the returned
    /// gate is released.
    pub fn hold(&self, path: &str) -> ResponseGate {
        let (tx, rx) = oneshot::channel();
        self.enqueue(path, Scripted::Held(rx));
        ResponseGate { tx }
    }

    /// Response used for `path` whenever its queue is empty.
    pub fn always_respond_json(&self, path: &str, status: u16, body: serde_json::Value) {
        self.with_state(|s| {
            s.fallback.insert(
                path.to_string(),
                Ok(RawResponse::new(status, body.to_string())),
            )
        });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn call_count(&self, path: &str) -> usize {
        self.with_state(|s| s.calls.iter().filter(|c| c.path == path).count())
    }

    async fn exchange(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Reply {
        let scripted = self.with_state(|s| {
            s.calls.push(RecordedCall {
                method,
                path: path.to_string(),
                body,
            });
            match s.queued.get_mut(path).and_then(VecDeque::pop_front) {
                Some(scripted) => Some(scripted),
                None => s.fallback.get(path).cloned().map(Scripted::Ready),
            }
        });

        match scripted {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Held(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(OperationError::network("held response dropped"))),
            None => Err(OperationError::network(format!(
                "no scripted response for {}",
                path
            ))),
        }
    }
}

impl Transport for FakeTransport {
    async fn get(&self, path: &str) -> Reply {
        self.exchange(Method::Get, path, None).await
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Reply {
        self.exchange(Method::Post, path, Some(body.clone())).await
    }
}

/// Backend response bodies matching the wire contract.
pub mod fixtures {
    use serde_json::{json, Value};

    const TS: &str = "2025-06-01T12:00:00";

    pub fn connection_test(device1: &str, device2: &str) -> Value {
        json!({
            "status": "completed",
            "timestamp": TS,
            "connection_tests": {
                "device1": {"status": device1, "message": "Connection successful\n"},
                "device2": {"status": device2, "message": "Connection successful\n"}
            }
        })
    }

    pub fn listing(device1: &[&str], device2: &[&str]) -> Value {
        json!({
            "status": "success",
            "timestamp": TS,
            "data": {"device1": device1, "device2": device2}
        })
    }

    pub fn transfer(source: &str, dest: &str, file_size: u64) -> Value {
        json!({
            "status": "success",
            "timestamp": TS,
            "direction": "device1_to_device2",
            "transfer_details": {
                "source_path": source,
                "destination_path": dest,
                "file_size": file_size,
                "success": true,
                "transfer_time": 0.25
            }
        })
    }

    pub fn command(command: &str, device: &str, stdout: &str) -> Value {
        json!({
            "status": "success",
            "timestamp": TS,
            "device": device,
            "command": command,
            "result": {"stdout": stdout, "stderr": "", "exit_code": 0}
        })
    }

    /// Telemetry report whose CPU usage is `cpu`.
    pub fn report(cpu: f64) -> Value {
        json!({
            "timestamp": TS,
            "system_info": {"hostname": "edge-01", "system": "Linux", "release": "6.1.0"},
            "process_anomalies": [],
            "process_scan": {
                "total_processes": 120,
                "suspicious_processes": [],
                "high_resource_processes": [],
                "network_processes": [],
                "timestamp": TS
            },
            "system_integrity": {
                "file_integrity": {},
                "system_files": {},
                "permissions": {"world_writable": []},
                "timestamp": TS
            },
            "resource_monitoring": {
                "cpu_usage": cpu,
                "memory_usage": 41.0,
                "disk_usage": {},
                "network_connections": 12,
                "load_average": [0.1, 0.2, 0.3],
                "anomalies": [],
                "timestamp": TS
            }
        })
    }

    pub fn health() -> Value {
        json!({"status": "healthy", "timestamp": TS, "service": "SSH/SCP API"})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_queued_responses_are_consumed_in_order() {
        let fake = FakeTransport::new();
        fake.respond_json("/x", 200, json!(1));
        fake.respond_json("/x", 500, json!(2));

        assert_eq!(fake.get("/x").await.unwrap().status, 200);
        assert_eq!(fake.get("/x").await.unwrap().status, 500);
        assert!(fake.get("/x").await.is_err());
        assert_eq!(fake.call_count("/x"), 3);
    }

    #[tokio::test]
    async fn test_fallback_used_when_queue_empty() {
        let fake = FakeTransport::new();
        fake.always_respond_json("/y", 200, json!({}));
        assert!(fake.get("/y").await.is_ok());
        assert!(fake.get("/y").await.is_ok());
    }

    #[tokio::test]
    async fn test_held_response_waits_for_release() {
        let fake = FakeTransport::new();
        let gate = fake.hold("/slow");

        let handle = {
            let fake = fake.clone();
            tokio::spawn(async move { fake.get("/slow").await })
        };
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        gate.release_json(200, json!({"ok": true}));
        let reply = handle.await.unwrap().unwrap();
        assert_eq!(reply.status, 200);
    }
}
