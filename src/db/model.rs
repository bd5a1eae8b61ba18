use pgvector::Vector;

/// 画作记录
///
/// 采样核心只关心 id，其余展示字段原样透传给响应层。
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArtworkRecord {
    /// 画作 ID
    pub id: i32,
    /// 博物馆馆藏编号
    pub object_id: Option<i64>,
    /// 标题
    pub title: Option<String>,
    /// 作者
    pub artist: Option<String>,
    /// 本地（S3）图片地址
    pub local_image_url: Option<String>,
    /// 博物馆小图地址
    pub small_image_url: Option<String>,
    /// 博物馆原图地址
    pub original_image_url: Option<String>,
}

/// 候选池查询的一行：投影列加相似度
///
/// 相似度为 1 - 余弦距离，随机池固定为 NULL。
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PoolRecord {
    #[sqlx(flatten)]
    pub artwork: ArtworkRecord,
    pub similarity: Option<f64>,
}

/// 焦点画作的嵌入行
#[derive(Debug, sqlx::FromRow)]
pub struct FocalRecord {
    pub id: i32,
    /// L2 归一化的 768 维 CLIP 嵌入
    pub embedding: Vector,
}
