use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use base64::Engine;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use torus_islands::config::{Params, linspace};
use torus_islands::render;
use torus_islands::rng::{SALT_SNAPSHOT, seed_u32};
use torus_islands::snapshot::Snapshot;
use torus_islands::sweep::{Sweep, SweepTable};

#[derive(Deserialize)]
struct SnapshotRequest {
    seed: Option<u64>,
    rows: Option<usize>,
    cols: Option<usize>,
    p: Option<f64>,
}

#[derive(Deserialize)]
struct SweepRequest {
    seed: Option<u64>,
    rows: Option<usize>,
    cols: Option<usize>,
    runs: Option<usize>,
    // Either an explicit list or an evenly spaced range
    probabilities: Option<Vec<f64>>,
    p_min: Option<f64>,
    p_max: Option<f64>,
    steps: Option<usize>,
}

#[derive(Serialize)]
struct SnapshotResponse {
    layers: Vec<Layer>,
    islands: usize,
    pools: usize,
    width: usize,
    height: usize,
}

#[derive(Serialize)]
struct SweepResponse {
    table: SweepTable,
    chart: Layer,
    ms: f64,
}

#[derive(Serialize)]
struct Layer {
    name: String,
    data_url: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, msg: impl ToString) -> ApiError {
    (status, Json(ErrorBody { error: msg.to_string() }))
}

fn encode_png(rgba: &[u8], w: usize, h: usize) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    encoder.write_image(rgba, w as u32, h as u32, image::ExtendedColorType::Rgba8)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    Ok(format!("data:image/png;base64,{}", b64))
}

fn layer(name: &str, rgba: &[u8], w: usize, h: usize) -> Result<Layer, ApiError> {
    let data_url =
        encode_png(rgba, w, h).map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;
    Ok(Layer {
        name: name.into(),
        data_url,
    })
}

async fn snapshot_handler(
    Json(req): Json<SnapshotRequest>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let defaults = Params::default();
    let seed = req.seed.unwrap_or(defaults.seed);
    let rows = req.rows.unwrap_or(defaults.rows);
    let cols = req.cols.unwrap_or(defaults.cols);
    let p = req.p.unwrap_or(defaults.snapshot_p);

    tokio::task::spawn_blocking(move || -> Result<Json<SnapshotResponse>, ApiError> {
        let snap = Snapshot::capture(rows, cols, p, seed)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
        let seed32 = seed_u32(seed, SALT_SNAPSHOT);
        let layers = vec![
            layer("field", &render::render_field(&snap.field), cols, rows)?,
            layer("islands", &render::render_labels(&snap.islands, seed32), cols, rows)?,
            layer("pools", &render::render_labels(&snap.pools, seed32), cols, rows)?,
        ];
        Ok(Json(SnapshotResponse {
            layers,
            islands: snap.islands.count,
            pools: snap.pools.count,
            width: cols,
            height: rows,
        }))
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
}

async fn sweep_handler(Json(req): Json<SweepRequest>) -> Result<Json<SweepResponse>, ApiError> {
    let defaults = Params::default();
    let probabilities = match (req.probabilities, req.p_min, req.p_max) {
        (Some(list), _, _) => list,
        (None, Some(lo), Some(hi)) => linspace(lo, hi, req.steps.unwrap_or(50)),
        _ => defaults.probabilities.clone(),
    };
    let params = Params {
        rows: req.rows.unwrap_or(defaults.rows),
        cols: req.cols.unwrap_or(defaults.cols),
        runs: req.runs.unwrap_or(defaults.runs),
        seed: req.seed.unwrap_or(defaults.seed),
        probabilities,
        ..defaults
    };

    tokio::task::spawn_blocking(move || -> Result<Json<SweepResponse>, ApiError> {
        let t = std::time::Instant::now();
        let table = Sweep::from_params(&params)
            .run()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
        let ms = t.elapsed().as_secs_f64() * 1000.0;
        info!("sweep {}x{} x{} runs in {:.1} ms", params.rows, params.cols, params.runs, ms);

        let (cw, ch) = (960, 540);
        let chart = layer("sweep", &render::render_sweep(&table, cw, ch), cw, ch)?;
        Ok(Json(SweepResponse { table, chart, ms }))
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,torus_islands=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = Router::new()
        .route("/api/snapshot", post(snapshot_handler))
        .route("/api/sweep", post(sweep_handler))
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("torus-islands server at http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {}", e);
        std::process::exit(1);
    }
}
