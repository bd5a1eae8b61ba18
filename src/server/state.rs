use std::sync::Arc;

use crate::engine::FieldEngine;

/// 应用状态
pub struct AppState {
    /// 字段采样引擎
    pub engine: FieldEngine,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(engine: FieldEngine) -> Arc<Self> {
        Arc::new(AppState { engine })
    }
}
