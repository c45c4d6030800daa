//! Shared helpers for pipeline and client integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use snaptext::capture::{ImageAcquirer, ImageArtifact, ImageLocator, ImageOrigin, ImageSource};
use snaptext::cleanup::{ArtifactCleanup, CleanupManager};
use snaptext::encode::EncodedPayload;
use snaptext::ocr::{OcrApiResponse, OcrBackend, RawResponse};
use snaptext::PipelineError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Fresh, empty directory under the system temp dir.
pub fn setup_test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("snaptext-it-{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Deterministic pseudo-JPEG of `len` bytes. The pipeline never decodes
/// camera captures, so only the bytes matter.
pub fn jpeg_like_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    let mut x: u32 = 0x1234_5678;
    while bytes.len() < len {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        bytes.push((x & 0xFF) as u8);
    }
    bytes.truncate(len);
    bytes
}

// ── Acquisition ─────────────────────────────────────────────────────

/// Writes the same bytes to a new file on every acquisition, like a camera
/// that keeps photographing the same page.
pub struct FileCamera {
    pub dir: PathBuf,
    pub bytes: Vec<u8>,
    pub produced: Mutex<Vec<PathBuf>>,
}

impl FileCamera {
    pub fn new(dir: PathBuf, bytes: Vec<u8>) -> Self {
        Self {
            dir,
            bytes,
            produced: Mutex::new(Vec::new()),
        }
    }

    pub fn produced(&self) -> Vec<PathBuf> {
        self.produced.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageAcquirer for FileCamera {
    async fn acquire(&self, _source: ImageSource) -> Result<ImageArtifact, PipelineError> {
        let n = self.produced.lock().unwrap().len();
        let path = self.dir.join(format!("shot-{}.jpg", n));
        std::fs::write(&path, &self.bytes).unwrap();
        self.produced.lock().unwrap().push(path.clone());
        Ok(ImageArtifact::new(ImageLocator::File(path), ImageOrigin::CameraCapture))
    }
}

/// Acquisition that always fails with the given error.
pub struct FailingCamera(pub PipelineError);

#[async_trait]
impl ImageAcquirer for FailingCamera {
    async fn acquire(&self, _source: ImageSource) -> Result<ImageArtifact, PipelineError> {
        Err(self.0.clone())
    }
}

// ── OCR backend ─────────────────────────────────────────────────────

/// Backend returning the same canned result on every call.
pub struct ScriptedBackend {
    reply: Result<String, PipelineError>,
    pub calls: AtomicUsize,
    pub payloads: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn json(body: &str) -> Self {
        Self::with_reply(Ok(body.to_string()))
    }

    pub fn error(err: PipelineError) -> Self {
        Self::with_reply(Err(err))
    }

    fn with_reply(reply: Result<String, PipelineError>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrBackend for ScriptedBackend {
    async fn submit(&self, payload: &EncodedPayload) -> Result<RawResponse, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.data.clone());
        match &self.reply {
            Ok(body) => Ok(RawResponse {
                body: OcrApiResponse::from_json(body).unwrap(),
                status: 200,
                response_time_ms: 7,
            }),
            Err(err) => Err(err.clone()),
        }
    }
}

// ── Cleanup ─────────────────────────────────────────────────────────

/// Real cleanup that also counts how often it ran.
pub struct CountingCleanup {
    inner: CleanupManager,
    calls: AtomicUsize,
}

impl CountingCleanup {
    pub fn new(inner: CleanupManager) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactCleanup for CountingCleanup {
    async fn cleanup(&self, artifact: ImageArtifact) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.cleanup(artifact).await;
    }
}

// ── Canned HTTP server ──────────────────────────────────────────────

#[derive(Clone)]
pub enum Reply {
    /// Respond with this status and body.
    Body(u16, String),
    /// Accept the request and never answer.
    Hang,
}

/// A request as the server saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub head: String,
    pub body: String,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_lowercase());
        self.head
            .lines()
            .find(|l| l.to_lowercase().starts_with(&prefix))
            .map(|l| l[prefix.len()..].trim().to_string())
    }

    /// Value of a multipart text field.
    pub fn field(&self, name: &str) -> Option<String> {
        let marker = format!("name=\"{}\"", name);
        let start = self.body.find(&marker)? + marker.len();
        let rest = &self.body[start..];
        let value_start = rest.find("\r\n\r\n")? + 4;
        let value = &rest[value_start..];
        let end = value.find("\r\n--")?;
        Some(value[..end].to_string())
    }
}

pub struct CannedServer {
    pub url: String,
    pub seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl CannedServer {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

/// Minimal HTTP/1.1 server answering every request with `reply`.
pub async fn spawn_server(reply: Reply) -> CannedServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let seen_bg = seen.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let reply = reply.clone();
            let seen = seen_bg.clone();
            tokio::spawn(async move {
                handle_connection(stream, reply, seen).await;
            });
        }
    });

    CannedServer {
        url: format!("http://{}/parse/image", addr),
        seen,
    }
}

async fn handle_connection(mut stream: TcpStream, reply: Reply, seen: Arc<Mutex<Vec<SeenRequest>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|l| {
            let lower = l.to_lowercase();
            lower
                .strip_prefix("content-length:")
                .and_then(|v| v.trim().parse::<usize>().ok())
        });
    let chunked = head.to_lowercase().contains("transfer-encoding: chunked");

    loop {
        let body_len = buf.len() - head_end;
        let complete = match content_length {
            Some(len) => body_len >= len,
            None if chunked => find(&buf[head_end..], b"0\r\n\r\n").is_some(),
            None => true,
        };
        if complete {
            break;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    seen.lock().unwrap().push(SeenRequest {
        head,
        body: String::from_utf8_lossy(&buf[head_end..]).to_string(),
    });

    match reply {
        Reply::Body(status, body) => {
            let response = format!(
                "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        Reply::Hang => {
            tokio::time::sleep(std::time::Duration::from_secs(120)).await;
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
