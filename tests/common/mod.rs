//! Shared utilities for integration and load testing.
#![allow(dead_code)]

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use search_router::{ExecuteError, HealthProber, QueryExecutor, Server, TransportError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A running mock search server.
pub struct MockBackend {
    pub url: String,
    pub hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a mock backend on an ephemeral port. `handler` receives the request
/// target (path and query string) and returns status and body.
pub async fn start_programmable_backend<F>(handler: F) -> MockBackend
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));
    let handler = Arc::new(handler);

    let counter = hits.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    let counter = counter.clone();
                    tokio::spawn(async move {
                        serve_one(socket, |target| {
                            counter.fetch_add(1, Ordering::SeqCst);
                            handler(target)
                        })
                        .await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend { url, hits }
}

/// Start a mock backend that always answers 200 with `body`.
pub async fn start_mock_backend(body: &'static str) -> MockBackend {
    start_programmable_backend(move |_| (200, body.to_string())).await
}

async fn serve_one<F>(mut socket: TcpStream, respond: F)
where
    F: FnOnce(&str) -> (u16, String),
{
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let head = String::from_utf8_lossy(&request);
    let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let (status, body) = respond(&target);

    let status_text = match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// An address nothing listens on.
pub async fn refused_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// How a scripted server answers.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Ok,
    Refuse,
    Reject,
    Delay(Duration),
}

/// In-memory executor answering per address; unscripted addresses answer `Ok`.
#[derive(Default)]
pub struct ScriptedExecutor {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(replies: &[(&str, Reply)]) -> Self {
        Self {
            replies: replies.iter().map(|(a, r)| (a.to_string(), *r)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, address: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|a| *a == address).count()
    }
}

impl QueryExecutor for ScriptedExecutor {
    type Query = String;
    type Response = String;

    fn execute<'a>(
        &'a self,
        server: &'a Server,
        query: &'a String,
    ) -> BoxFuture<'a, Result<String, ExecuteError>> {
        async move {
            self.calls.lock().unwrap().push(server.address().to_string());
            match self.replies.get(server.address()).copied().unwrap_or(Reply::Ok) {
                Reply::Ok => Ok(format!("{}@{}", query, server.address())),
                Reply::Refuse => Err(TransportError::ConnectionRefused(server.address().into()).into()),
                Reply::Reject => Err(ExecuteError::Remote("syntax error".into())),
                Reply::Delay(d) => {
                    tokio::time::sleep(d).await;
                    Ok(format!("{}@{}", query, server.address()))
                }
            }
        }
        .boxed()
    }
}

/// Prober failing each scripted address a number of times before succeeding.
#[derive(Default)]
pub struct FlakyProber {
    failures_left: Mutex<HashMap<String, u32>>,
    pub probes: AtomicUsize,
}

impl FlakyProber {
    pub fn new(failures: &[(&str, u32)]) -> Self {
        Self {
            failures_left: Mutex::new(failures.iter().map(|(a, n)| (a.to_string(), *n)).collect()),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl HealthProber for FlakyProber {
    fn probe<'a>(&'a self, server: &'a Server) -> BoxFuture<'a, Result<(), ExecuteError>> {
        async move {
            self.probes.fetch_add(1, Ordering::SeqCst);
            let mut failures = self.failures_left.lock().unwrap();
            match failures.get_mut(server.address()) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    Err(TransportError::Io("probe failed".into()).into())
                }
                _ => Ok(()),
            }
        }
        .boxed()
    }
}
