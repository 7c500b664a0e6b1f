//! Programmable HTTP server for testing tile clients.
//!
//! Requests can be anticipated one by one (and answered when the test decides to), or served
//! from canned responses. Everything else is recorded as unexpected.

use http_body_util::Full;
use hyper::{Request, Response, body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use std::{
    collections::HashMap,
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

pub use hyper::{self, StatusCode, body::Bytes};

type MockResponse = Response<Full<Bytes>>;

struct Anticipation {
    request_tx: oneshot::Sender<Request<()>>,
    response_rx: oneshot::Receiver<MockResponse>,
}

#[derive(Default)]
struct State {
    /// One-shot expectations made with [`Server::anticipate`].
    anticipated: HashMap<String, Anticipation>,

    /// Responses given to every request of a path, see [`Server::serve`].
    served: HashMap<String, (StatusCode, Bytes)>,

    hits: HashMap<String, usize>,
    unexpected: Vec<String>,
}

pub struct Server {
    port: u16,
    state: Arc<Mutex<State>>,
    accept_loop: JoinHandle<()>,
}

impl Server {
    /// Create new [`Server`], and bind it to a random port.
    pub async fn bind() -> Self {
        let state = Arc::new(Mutex::new(State::default()));

        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr)
            .await
            .unwrap_or_else(|e| panic!("could not bind the mock server: {e}"));
        let port = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("mock server has no address: {e}"))
            .port();

        let accept_loop = tokio::spawn(accept_continuously(listener, Arc::clone(&state)));

        Self {
            port,
            state,
            accept_loop,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Full URL of the `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    /// Expect a single request to `path`. It will hang until the returned [`AnticipatedRequest`]
    /// is responded to.
    pub fn anticipate(&self, path: impl Into<String>) -> AnticipatedRequest {
        let path = path.into();
        log::info!("Anticipating '{path}'.");

        let (request_tx, request_rx) = oneshot::channel();
        let (response_tx, response_rx) = oneshot::channel();
        lock(&self.state).anticipated.insert(
            path,
            Anticipation {
                request_tx,
                response_rx,
            },
        );

        AnticipatedRequest {
            request_rx: Some(request_rx),
            response_tx,
        }
    }

    /// Respond to every request to `path` with given status and body.
    pub fn serve(&self, path: impl Into<String>, status: StatusCode, body: impl Into<Bytes>) {
        lock(&self.state)
            .served
            .insert(path.into(), (status, body.into()));
    }

    /// Number of requests made to `path` so far.
    pub fn hits(&self, path: &str) -> usize {
        lock(&self.state).hits.get(path).copied().unwrap_or_default()
    }

    /// URIs of requests which were neither anticipated nor served.
    pub fn unexpected(&self) -> Vec<String> {
        lock(&self.state).unexpected.clone()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

pub struct AnticipatedRequest {
    request_rx: Option<oneshot::Receiver<Request<()>>>,
    response_tx: oneshot::Sender<MockResponse>,
}

impl AnticipatedRequest {
    /// Wait for the request to come. Its body is not kept.
    pub async fn expect(&mut self) -> Request<()> {
        let Some(request_rx) = self.request_rx.take() else {
            panic!("request was already expected");
        };
        request_rx
            .await
            .unwrap_or_else(|_| panic!("mock server went down before the request came"))
    }

    pub fn respond(self, payload: impl Into<Bytes>) {
        self.respond_with(StatusCode::OK, payload.into());
    }

    pub fn respond_with_status(self, status: StatusCode) {
        self.respond_with(status, Bytes::new());
    }

    fn respond_with(self, status: StatusCode, payload: Bytes) {
        log::info!("Responding with {status}.");
        let mut response = Response::new(Full::new(payload));
        *response.status_mut() = status;

        // Client might have given up already, which is fine.
        let _ = self.response_tx.send(response);
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn accept_continuously(listener: TcpListener, state: Arc<Mutex<State>>) {
    loop {
        let stream = match listener.accept().await {
            Ok((stream, _)) => stream,
            Err(e) => {
                log::warn!("Could not accept a connection: {e}.");
                continue;
            }
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let service = service_fn(move |request| respond(Arc::clone(&state), request));
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                log::debug!("Connection finished with: {e}.");
            }
        });
    }
}

async fn respond(
    state: Arc<Mutex<State>>,
    request: Request<Incoming>,
) -> Result<MockResponse, Infallible> {
    let path = request.uri().path().to_owned();
    log::info!("Incoming request '{}'.", request.uri());

    let anticipation = {
        let mut state = lock(&state);
        *state.hits.entry(path.clone()).or_default() += 1;
        state.anticipated.remove(&path)
    };

    if let Some(anticipation) = anticipation {
        let mut head = Request::new(());
        *head.method_mut() = request.method().clone();
        *head.uri_mut() = request.uri().clone();
        *head.headers_mut() = request.headers().clone();
        let _ = anticipation.request_tx.send(head);

        return Ok(anticipation.response_rx.await.unwrap_or_else(|_| {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
            response
        }));
    }

    let served = lock(&state).served.get(&path).cloned();
    let (status, payload) = served.unwrap_or_else(|| {
        log::warn!("Unexpected '{}'.", request.uri());
        lock(&state).unexpected.push(request.uri().to_string());
        (
            StatusCode::IM_A_TEAPOT,
            Bytes::from_static(b"unexpected"),
        )
    });

    let mut response = Response::new(Full::new(payload));
    *response.status_mut() = status;
    Ok(response)
}
