use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::FieldError;
use crate::sampler::Candidate;

/// 单区块查询参数
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FieldChunkQuery {
    /// 焦点画作 ID
    pub target_id: i32,
    /// 区块 X 坐标
    pub chunk_x: i32,
    /// 区块 Y 坐标
    pub chunk_y: i32,
    /// 每区块返回数量，钳制到 [1, 50]
    pub count: Option<i64>,
    /// 全局随机种子
    pub seed: Option<u32>,
    /// 逗号分隔的排除 ID 列表
    pub exclude: Option<String>,
}

/// 多区块请求体
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldChunksRequest {
    /// 焦点画作 ID
    pub target_id: i32,
    /// 请求的区块坐标，1 到 16 个
    pub chunks: Vec<ChunkCoord>,
    /// 每区块返回数量，钳制到 [1, 50]
    pub count: Option<i64>,
    /// 全局随机种子
    pub seed: Option<u32>,
    /// 全局排除的画作 ID
    #[serde(default)]
    pub exclude_ids: Vec<i32>,
}

/// 区块坐标
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

// 参数解析失败必须和业务错误走同一套响应格式，
// 不能落到 axum 默认的 QueryRejection/JsonRejection（后者还会返回 422）。

impl<S> FromRequestParts<S> for FieldChunkQuery
where
    S: Send + Sync,
{
    type Rejection = FieldError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<FieldChunkQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| FieldError::BadRequest(e.body_text()))?;
        Ok(query)
    }
}

impl<S> FromRequest<S> for FieldChunksRequest
where
    S: Send + Sync,
{
    type Rejection = FieldError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<FieldChunksRequest>::from_request(req, state)
            .await
            .map_err(|e| FieldError::BadRequest(e.body_text()))?;
        Ok(body)
    }
}

/// 响应中的画作条目
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkPayload {
    pub id: i32,
    pub object_id: Option<i64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    /// 展示图片地址，按 本地 → 小图 → 原图 的优先级选择
    pub image_url: Option<String>,
    pub original_image_url: Option<String>,
    /// 展示图片的来源：s3 / met_small / met_original
    pub image_source: Option<&'static str>,
    /// 与焦点的余弦相似度，随机池候选为 null
    pub similarity: Option<f64>,
    /// 候选池标签：sim / drift / rand
    pub source: &'static str,
}

impl From<&Candidate> for ArtworkPayload {
    fn from(candidate: &Candidate) -> Self {
        let a = &candidate.artwork;
        let non_empty =
            |u: &Option<String>| u.as_deref().filter(|s| !s.is_empty()).map(str::to_owned);
        let (image_url, image_source) = if let Some(url) = non_empty(&a.local_image_url) {
            (Some(url), Some("s3"))
        } else if let Some(url) = non_empty(&a.small_image_url) {
            (Some(url), Some("met_small"))
        } else if let Some(url) = non_empty(&a.original_image_url) {
            (Some(url), Some("met_original"))
        } else {
            (None, None)
        };
        ArtworkPayload {
            id: a.id,
            object_id: a.object_id,
            title: a.title.clone(),
            artist: a.artist.clone(),
            image_url,
            original_image_url: a.original_image_url.clone(),
            image_source,
            similarity: candidate.similarity,
            source: candidate.source.as_str(),
        }
    }
}
