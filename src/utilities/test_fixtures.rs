use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::dispatcher::{CallError, RemoteProcedure};
use crate::generation::{AspectRatio, GenerationRequest, RANDOM_SEED, Resolution};

pub fn request() -> GenerationRequest {
    GenerationRequest::new(
        "a red car".into(),
        "blurry".into(),
        Resolution::P720,
        AspectRatio::Landscape,
        10,
        RANDOM_SEED,
    )
    .unwrap()
}

#[derive(Clone, Copy)]
pub enum Reply {
    Artifact(&'static str),
    Fail(&'static str),
}

/// Answers each endpoint with a scripted reply and records the order of calls.
#[derive(Default)]
pub struct FakeProcedure {
    replies: HashMap<&'static str, Reply>,
    calls: Mutex<Vec<String>>,
}

impl FakeProcedure {
    pub fn new(replies: impl IntoIterator<Item = (&'static str, Reply)>) -> Self {
        Self { replies: replies.into_iter().collect(), calls: Mutex::default() }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteProcedure for FakeProcedure {
    async fn call(&self, endpoint: &str, _: &GenerationRequest) -> Result<String, CallError> {
        self.calls.lock().unwrap().push(endpoint.into());

        match self.replies.get(endpoint) {
            Some(Reply::Artifact(artifact)) => Ok((*artifact).into()),
            Some(Reply::Fail(message)) => Err(CallError::Remote((*message).into())),
            None => Err(CallError::MalformedResponse("unknown endpoint")),
        }
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Answers `(method, path)` with `(status, content type, body)`.
pub type Route = fn(&str, &str) -> (u16, &'static str, String);

/// A one-request-per-connection HTTP server on a random local port.
pub struct StubServer {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start(route: Route) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(respond(stream, route, recorded.clone()));
            }
        });

        Self { url, requests }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|request| format!("{} {}", request.method, request.path)).collect()
    }
}

async fn respond(mut stream: TcpStream, route: Route, recorded: Arc<Mutex<Vec<RecordedRequest>>>) {
    let mut buffer = Vec::new();
    let mut chunk = [0; 4096];

    let header_end = loop {
        let read = stream.read(&mut chunk).await.unwrap();
        if read == 0 {
            return;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).into_owned();
    let content_length: usize = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") { value.trim().parse().ok() } else { None }
        })
        .unwrap_or(0);

    while buffer.len() < header_end + content_length {
        let read = stream.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }

    let body_end = buffer.len().min(header_end + content_length);
    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let request = RecordedRequest {
        method: request_line.next().unwrap_or_default().into(),
        path: request_line.next().unwrap_or_default().into(),
        body: String::from_utf8_lossy(&buffer[header_end..body_end]).into_owned(),
    };

    let (status, content_type, body) = route(&request.method, &request.path);
    recorded.lock().unwrap().push(request);

    let response = format!(
        "HTTP/1.1 {status} Stub\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.shutdown().await.ok();
}
