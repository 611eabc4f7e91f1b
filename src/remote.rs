//! Backend remote-call interface.
//!
//! The dock itself is owned by the backend daemon; everything in this crate
//! reaches it through the single call primitive below: a method name plus a
//! flat JSON argument object, answered by a success/result envelope.

use std::path::PathBuf;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Remote call failure.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The backend socket could not be reached or the request failed in
    /// transit.
    #[error("backend unreachable: {0}")]
    Io(#[from] std::io::Error),
    /// The reply was not a valid response envelope.
    #[error("malformed backend response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The backend processed the request and reported failure.
    #[error("backend reported failure")]
    Unsuccessful,
    /// The backend closed the connection before replying.
    #[error("backend closed the connection")]
    Closed,
}

/// Request envelope.
#[derive(Serialize, Debug)]
struct Request<'a> {
    method: &'a str,
    args: Value,
}

/// Response envelope.
#[derive(Deserialize, Debug)]
struct Response {
    success: bool,
    #[serde(default)]
    result: Value,
}

/// Asynchronous method-name/argument-object call primitive.
#[async_trait]
pub trait RemoteCall: Send + Sync {
    /// Issue one backend call and return its result value.
    async fn call(&self, method: &str, args: Value) -> Result<Value, RemoteError>;
}

/// Backend client speaking newline-delimited JSON over a Unix socket.
///
/// Every call opens its own connection. All dock state lives behind the
/// backend, so there is nothing worth keeping alive between requests.
pub struct SocketClient {
    path: PathBuf,
}

impl SocketClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RemoteCall for SocketClient {
    async fn call(&self, method: &str, args: Value) -> Result<Value, RemoteError> {
        let mut line = serde_json::to_string(&Request { method, args })?;
        debug!("request: {}", line);
        line.push('\n');

        let stream = UnixStream::connect(&self.path).await?;
        let mut stream = BufReader::new(stream);
        stream.get_mut().write_all(line.as_bytes()).await?;

        let mut reply = String::new();
        if stream.read_line(&mut reply).await? == 0 {
            return Err(RemoteError::Closed);
        }
        debug!("response: {}", reply.trim_end());

        let response: Response = serde_json::from_str(&reply)?;
        if response.success {
            Ok(response.result)
        } else {
            Err(RemoteError::Unsuccessful)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::net::UnixListener;

    use super::*;

    /// Bind a scripted one-shot backend, returning its socket path.
    fn scripted_backend(name: &str, reply: &'static str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("dockrgb-{}-{}.sock", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut stream = BufReader::new(stream);

            let mut line = String::new();
            stream.read_line(&mut line).await.unwrap();
            let request: Value = serde_json::from_str(&line).unwrap();
            assert!(request["method"].is_string());
            assert!(request["args"].is_object());

            stream.get_mut().write_all(reply.as_bytes()).await.unwrap();
        });

        path
    }

    #[test]
    fn request_envelope() {
        let request = Request { method: "change_effect", args: json!({ "effect": 3 }) };
        let encoded = serde_json::to_value(&request).unwrap();

        assert_eq!(encoded, json!({ "method": "change_effect", "args": { "effect": 3 } }));
    }

    #[test]
    fn response_without_result() {
        let response: Response = serde_json::from_str(r#"{"success": false}"#).unwrap();

        assert!(!response.success);
        assert_eq!(response.result, Value::Null);
    }

    #[tokio::test]
    async fn socket_round_trip() {
        let reply = "{\"success\": true, \"result\": {\"connected\": true}}\n";
        let path = scripted_backend("ok", reply);

        let client = SocketClient::new(&path);
        let result = client.call("get_menu_state", json!({})).await.unwrap();
        assert_eq!(result, json!({ "connected": true }));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn unsuccessful_response() {
        let path = scripted_backend("fail", "{\"success\": false}\n");

        let client = SocketClient::new(&path);
        let result = client.call("change_speed", json!({ "speed": 2 })).await;
        assert!(matches!(result, Err(RemoteError::Unsuccessful)));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn unreachable_backend() {
        let client = SocketClient::new("/nonexistent/dockrgb.sock");
        let result = client.call("get_menu_state", json!({})).await;
        assert!(matches!(result, Err(RemoteError::Io(_))));
    }
}
