//! Prediction evaluation server
//!
//! Accepts prediction/ground-truth/mask matrices as JSON and returns the
//! evaluation - no filesystem access, pure compute per request.
//!
//! Run: cargo run --release --bin eval_server

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Instant;

use signal_eval::{evaluate, EvalRequest, Evaluation};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateResponse {
    #[serde(flatten)]
    evaluation: Evaluation,
    compute_ms: f64,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn run_evaluate(
    Json(request): Json<EvalRequest>,
) -> Result<Json<EvaluateResponse>, (StatusCode, String)> {
    let start = Instant::now();
    let (assets, periods) = request.prediction.shape();

    match evaluate(
        &request.prediction,
        &request.ground_truth,
        &request.mask,
        &request.options(),
    ) {
        Ok(evaluation) => {
            let compute_ms = start.elapsed().as_secs_f64() * 1000.0;
            eprintln!("[EVAL] {} assets x {} periods in {:.2}ms", assets, periods, compute_ms);
            Ok(Json(EvaluateResponse {
                evaluation,
                compute_ms,
            }))
        }
        Err(e) => {
            eprintln!("[EVAL] error: {}", e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

#[tokio::main]
async fn main() {
    let app = Router::new()
        .route("/health", get(health))
        .route("/evaluate", post(run_evaluate))
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024)); // 50MB limit for large universes

    let addr = SocketAddr::from(([127, 0, 0, 1], 3030));
    println!("Prediction evaluation server on http://{}", addr);
    println!("  GET  /health    - liveness probe");
    println!("  POST /evaluate  - evaluate prediction vs ground-truth matrices");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
