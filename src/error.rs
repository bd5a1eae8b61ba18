use thiserror::Error;

/// 字段采样服务的错误分类
///
/// 每个变体对应一个固定的 HTTP 状态码，见 `server::error`。
#[derive(Debug, Error)]
pub enum FieldError {
    /// 请求参数无效
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// 焦点画作不存在或不可采样
    #[error("artwork {0} not found or not eligible")]
    TargetNotFound(i32),

    /// PCA 基底未加载，字段变换不可用
    #[error("pca basis unavailable")]
    PcaUnavailable,

    /// 向量库查询失败
    #[error("vector store failure: {0}")]
    Store(#[from] sqlx::Error),

    /// 其他未预期的内部错误
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type Result<T, E = FieldError> = std::result::Result<T, E>;
