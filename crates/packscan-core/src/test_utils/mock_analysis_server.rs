// src/test_utils/mock_analysis_server.rs
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{routing::post, Json, Router};
use tokio::net::TcpListener;

use crate::core_types::{AnalysisRequest, AnalysisResponse};
use crate::errors::ScanError;

#[derive(Clone)]
struct MockServerState {
    responses: Arc<Mutex<VecDeque<Result<AnalysisResponse, ScanError>>>>,
    requests: Arc<Mutex<Vec<AnalysisRequest>>>,
}

impl MockServerState {
    fn new(responses: Vec<Result<AnalysisResponse, ScanError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

async fn scan_handler(
    axum::extract::State(state): axum::extract::State<MockServerState>,
    Json(payload): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, axum::http::StatusCode> {
    log::debug!("Mock analysis server received request: {:?}", payload);
    state.requests.lock().unwrap().push(payload);

    match state.responses.lock().unwrap().pop_front() {
        Some(Ok(response)) => {
            log::debug!("Mock analysis server sending response: {:?}", response);
            Ok(Json(response))
        }
        Some(Err(e)) => {
            log::error!("Mock analysis server simulating an error: {:?}", e);
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
        None => {
            log::error!("Mock analysis server ran out of responses!");
            Err(axum::http::StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

pub struct MockAnalysisServer {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    pub recorded_requests: Arc<Mutex<Vec<AnalysisRequest>>>,
}

impl MockAnalysisServer {
    pub async fn start(responses: Vec<Result<AnalysisResponse, ScanError>>) -> Self {
        let state = MockServerState::new(responses);
        let recorded_requests = state.requests.clone();

        let app = Router::new()
            .route("/api/scan", post(scan_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap_or_else(|e| {
            panic!("Failed to bind mock analysis server to 127.0.0.1:0. Error: {}", e);
        });
        let addr = listener.local_addr().unwrap();
        log::info!("Mock analysis server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap_or_else(|e| {
                    log::error!("Mock analysis server error: {}", e);
                });
        });

        Self {
            addr,
            shutdown_tx,
            recorded_requests,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}
