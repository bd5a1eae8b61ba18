use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use log::{info, warn};
use serde::Deserialize;

use crate::error::FieldError;
use crate::field::EMBED_DIM;
use crate::numeric::normalize;

// 注意：必须在处理第一个请求之前调用 init
static PCA_BASIS: OnceLock<Option<PcaBasis>> = OnceLock::new();

/// 进程级只读的 PCA 基底
///
/// 由离线构建脚本产出，加载后对每行做 L2 归一化，进程生命周期内不可变。
#[derive(Debug)]
pub struct PcaBasis {
    components: Vec<Vec<f32>>,
}

/// 基底文件格式，除 basis 外的统计字段（explained_variance_ratio 等）一律忽略
#[derive(Deserialize)]
struct PcaBasisFile {
    basis: Vec<Vec<f32>>,
}

impl PcaBasis {
    /// 校验并归一化各行，构造基底
    pub fn new(rows: Vec<Vec<f32>>) -> Result<Self> {
        if rows.len() < 2 {
            bail!("PCA 基底至少需要 2 个主成分，实际 {}", rows.len());
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != EMBED_DIM {
                bail!("PCA 基底第 {} 行维数错误: {} != {}", i, row.len(), EMBED_DIM);
            }
        }
        let components = rows.iter().map(|row| normalize(row)).collect();
        Ok(Self { components })
    }

    /// 从 JSON 文件加载基底
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("读取 PCA 基底失败: {}", path.display()))?;
        let file: PcaBasisFile = serde_json::from_str(&raw)
            .with_context(|| format!("解析 PCA 基底失败: {}", path.display()))?;
        Self::new(file.basis)
    }

    pub fn components(&self) -> &[Vec<f32>] {
        &self.components
    }
}

/// 启动时加载基底，失败只降级不退出
///
/// 加载失败后字段端点逐请求返回 PcaUnavailable，其余端点不受影响。
pub fn init(path: impl AsRef<Path>) {
    let basis = match PcaBasis::load(&path) {
        Ok(basis) => {
            info!("PCA 基底已加载: {} 个主成分", basis.components.len());
            Some(basis)
        }
        Err(e) => {
            warn!("PCA 基底加载失败，字段端点进入降级模式: {:#}", e);
            None
        }
    };
    if PCA_BASIS.set(basis).is_err() {
        warn!("PCA 基底重复初始化，保留首次结果");
    }
}

/// 只读访问器
///
/// init 之前调用属于编程错误，直接 panic；加载失败的降级状态返回 PcaUnavailable。
pub fn basis() -> Result<&'static PcaBasis, FieldError> {
    PCA_BASIS.get().expect("pca::init 必须在启动时调用").as_ref().ok_or(FieldError::PcaUnavailable)
}
