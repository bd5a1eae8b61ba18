use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use super::error::Result;
use super::state::AppState;
use super::types::*;
use crate::engine::{ChunkRequest, ChunkSample, ChunksRequest, DEFAULT_COUNT, parse_exclude};
use crate::metrics;

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// count 缺省 20，负值与越界值一律钳回 [1, 50]，不作为参数错误
fn clamp_count(count: Option<i64>) -> usize {
    count.unwrap_or(DEFAULT_COUNT as i64).clamp(1, 50) as usize
}

fn chunk_meta(sample: &ChunkSample) -> Value {
    json!({
        "r": round2(sample.params.r),
        "theta": round2(sample.params.theta),
        "t": round2(sample.params.t),
        "weights": {
            "sim": round3(sample.weights.sim),
            "drift": round3(sample.weights.drift),
            "rand": round3(sample.weights.rand),
        },
        "seed": sample.seed,
    })
}

fn artworks(sample: &ChunkSample) -> Vec<ArtworkPayload> {
    sample.items.iter().map(ArtworkPayload::from).collect()
}

/// 采样单个区块
#[utoipa::path(
    get,
    path = "/api/artworks/field-chunk",
    params(FieldChunkQuery),
    responses(
        (status = 200, description = "区块采样结果"),
        (status = 400, description = "请求参数无效"),
        (status = 404, description = "焦点画作不存在"),
    )
)]
pub async fn field_chunk_handler(
    State(state): State<Arc<AppState>>,
    query: FieldChunkQuery,
) -> Result<Json<Value>> {
    let start = Instant::now();

    let req = ChunkRequest {
        target_id: query.target_id,
        x: query.chunk_x,
        y: query.chunk_y,
        seed: query.seed.unwrap_or(0),
        count: clamp_count(query.count),
        exclude: query.exclude.as_deref().map(parse_exclude).unwrap_or_default(),
    };
    let sample = state.engine.sample_chunk(&req).await?;

    metrics::inc_sample("single");
    metrics::observe_duration(start.elapsed());
    metrics::inc_picks(&sample.items);

    let mut meta = chunk_meta(&sample);
    meta["targetId"] = json!(req.target_id);
    meta["chunk"] = json!({ "x": sample.params.x, "y": sample.params.y });

    Ok(Json(json!({
        "success": true,
        "meta": meta,
        "data": artworks(&sample),
        "responseTime": start.elapsed().as_millis() as u64,
    })))
}

/// 采样一批区块，跨区块去重
#[utoipa::path(
    post,
    path = "/api/artworks/field-chunks",
    request_body = FieldChunksRequest,
    responses(
        (status = 200, description = "多区块采样结果"),
        (status = 400, description = "请求参数无效"),
        (status = 404, description = "焦点画作不存在"),
    )
)]
pub async fn field_chunks_handler(
    State(state): State<Arc<AppState>>,
    body: FieldChunksRequest,
) -> Result<Json<Value>> {
    let start = Instant::now();

    let req = ChunksRequest {
        target_id: body.target_id,
        chunks: body.chunks.iter().map(|c| (c.x, c.y)).collect(),
        seed: body.seed.unwrap_or(0),
        count: clamp_count(body.count),
        exclude: body.exclude_ids.clone(),
    };
    let sample = state.engine.sample_chunks(&req).await?;

    metrics::inc_sample("multi");
    metrics::observe_duration(start.elapsed());

    let mut data = serde_json::Map::new();
    for chunk in &sample.chunks {
        metrics::inc_picks(&chunk.items);
        data.insert(
            format!("{},{}", chunk.params.x, chunk.params.y),
            json!({
                "chunk": { "x": chunk.params.x, "y": chunk.params.y },
                "artworks": artworks(chunk),
                "meta": chunk_meta(chunk),
            }),
        );
    }

    Ok(Json(json!({
        "success": true,
        "meta": {
            "targetId": req.target_id,
            "totalChunks": sample.chunks.len(),
            "globalExcludes": req.exclude,
            "seed": req.seed,
            "count": sample.count,
        },
        "data": data,
        "responseTime": start.elapsed().as_millis() as u64,
    })))
}

/// Prometheus 指标
pub async fn metrics_handler() -> Result<String> {
    Ok(metrics::render()?)
}
