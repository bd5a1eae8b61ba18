use std::collections::HashSet;

use log::{debug, info};
use pgvector::Vector;

use crate::db::{Database, crud};
use crate::error::{FieldError, Result};
use crate::field::{ChunkParams, MixtureWeights, query_vector};
use crate::numeric::{Mulberry32, hash32, normalize};
use crate::pca;
use crate::sampler::{Candidate, PoolSet, Source, sample_mixture};

/// count 缺省值与钳制区间
pub const DEFAULT_COUNT: usize = 20;
const COUNT_MIN: usize = 1;
const COUNT_MAX: usize = 50;

/// 单区块模式的池大小
const SINGLE_SIM_POOL: i64 = 200;
const SINGLE_DRIFT_POOL: i64 = 400;
const SINGLE_RAND_POOL: i64 = 800;

/// 多区块模式一次最多处理的区块数
const MAX_CHUNKS: usize = 16;

/// 单区块采样请求
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    pub target_id: i32,
    pub x: i32,
    pub y: i32,
    pub seed: u32,
    pub count: usize,
    pub exclude: Vec<i32>,
}

/// 多区块采样请求
#[derive(Debug, Clone)]
pub struct ChunksRequest {
    pub target_id: i32,
    pub chunks: Vec<(i32, i32)>,
    pub seed: u32,
    pub count: usize,
    pub exclude: Vec<i32>,
}

/// 单个区块的采样结果
#[derive(Debug)]
pub struct ChunkSample {
    pub params: ChunkParams,
    /// 派生的区块种子 hash32(focalId, x, y, globalSeed)
    pub seed: u32,
    pub weights: MixtureWeights,
    pub items: Vec<Candidate>,
}

/// 多区块采样结果，按半径升序排列
#[derive(Debug)]
pub struct ChunksSample {
    pub count: usize,
    pub chunks: Vec<ChunkSample>,
}

/// 字段采样引擎
///
/// 持有向量库连接池，对外提供单区块与多区块两种采样模式。
/// 除只读的 PCA 基底外不携带任何跨请求的可变状态。
#[derive(Debug, Clone)]
pub struct FieldEngine {
    db: Database,
}

impl FieldEngine {
    pub async fn new(db: Database) -> Self {
        if let Ok((total, eligible)) = crud::get_count(&db).await {
            info!("画作总数  : {}", total);
            info!("可采样数量: {}", eligible);
        }
        Self { db }
    }

    /// 采样单个区块
    pub async fn sample_chunk(&self, req: &ChunkRequest) -> Result<ChunkSample> {
        if req.target_id <= 0 {
            return Err(FieldError::BadRequest("targetId 必须为正整数".into()));
        }
        let count = req.count.clamp(COUNT_MIN, COUNT_MAX);

        let focal = crud::get_focal(&self.db, req.target_id)
            .await?
            .ok_or(FieldError::TargetNotFound(req.target_id))?;
        let basis = pca::basis()?;

        let params = ChunkParams::new(req.x, req.y);
        let chunk_seed = chunk_seed(req.target_id, req.x, req.y, req.seed);
        let mut rng = Mulberry32::new(chunk_seed);

        let v = normalize(focal.embedding.as_slice());
        let q = query_vector(&v, basis, params.theta, params.t, &mut rng);

        // 排除列表在采样阶段生效，SQL 只过滤焦点自身
        let sql_exclude = vec![req.target_id];
        let (sim, drift, rand) = tokio::try_join!(
            crud::nn_pool(&self.db, Vector::from(v), SINGLE_SIM_POOL, &sql_exclude),
            crud::nn_pool(&self.db, Vector::from(q), SINGLE_DRIFT_POOL, &sql_exclude),
            crud::random_pool(&self.db, store_seed(chunk_seed), SINGLE_RAND_POOL, &sql_exclude),
        )?;
        let sim = Candidate::tag(sim, Source::Sim);
        let drift = Candidate::tag(drift, Source::Drift);
        let rand = Candidate::tag(rand, Source::Rand);

        let weights = MixtureWeights::from_t(params.t);
        let offset = single_offset(req.x, req.y, params.r);
        let mut used: HashSet<i32> = req.exclude.iter().copied().collect();
        used.insert(req.target_id);

        let items = sample_mixture(
            PoolSet { sim: &sim, drift: &drift, rand: &rand },
            &weights,
            count,
            offset,
            &mut rng,
            &mut used,
        );
        debug!(
            "区块 ({}, {}) r={:.2} t={:.2} offset={} 采样 {} 件",
            params.x,
            params.y,
            params.r,
            params.t,
            offset,
            items.len()
        );

        Ok(ChunkSample { params, seed: chunk_seed, weights, items })
    }

    /// 采样一批区块，跨区块去重
    ///
    /// 区块按半径升序处理，紧相似池全局共享一份，
    /// 选中的 id 进入共享的 used 集合保证整批结果不重复。
    pub async fn sample_chunks(&self, req: &ChunksRequest) -> Result<ChunksSample> {
        if req.target_id <= 0 {
            return Err(FieldError::BadRequest("targetId 必须为正整数".into()));
        }
        if req.chunks.is_empty() || req.chunks.len() > MAX_CHUNKS {
            return Err(FieldError::BadRequest(format!(
                "chunks 数量必须在 1..={}，实际 {}",
                MAX_CHUNKS,
                req.chunks.len()
            )));
        }
        let count = req.count.clamp(COUNT_MIN, COUNT_MAX);

        let focal = crud::get_focal(&self.db, req.target_id)
            .await?
            .ok_or(FieldError::TargetNotFound(req.target_id))?;
        let basis = pca::basis()?;

        // 按半径升序处理，保留原始序号用于偏移计算
        let mut order: Vec<(usize, ChunkParams)> = req
            .chunks
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| (i, ChunkParams::new(x, y)))
            .collect();
        order.sort_by(|a, b| a.1.r.total_cmp(&b.1.r));

        let n = req.chunks.len() as i64;
        let sim_limit = (125 * n).min(500);
        let drift_limit = (150 * n).min(400);
        let rand_limit = (300 * n).min(800);

        let mut sql_exclude = vec![req.target_id];
        sql_exclude.extend(req.exclude.iter().copied());

        let v = normalize(focal.embedding.as_slice());
        let shared =
            crud::nn_pool(&self.db, Vector::from(v.clone()), sim_limit, &sql_exclude).await?;
        let sim = Candidate::tag(shared, Source::Sim);

        let mut used: HashSet<i32> = req.exclude.iter().copied().collect();
        used.insert(req.target_id);

        let mut chunks = Vec::with_capacity(req.chunks.len());
        for (index, params) in order {
            let chunk_seed = chunk_seed(req.target_id, params.x, params.y, req.seed);
            let mut rng = Mulberry32::new(chunk_seed);
            let q = query_vector(&v, basis, params.theta, params.t, &mut rng);

            let (drift, rand) = tokio::try_join!(
                crud::nn_pool(&self.db, Vector::from(q), drift_limit, &sql_exclude),
                crud::random_pool(&self.db, store_seed(chunk_seed), rand_limit, &sql_exclude),
            )?;
            let drift = Candidate::tag(drift, Source::Drift);
            let rand = Candidate::tag(rand, Source::Rand);

            let weights = MixtureWeights::from_t(params.t);
            let offset = multi_offset(params.x, params.y, req.seed, index, params.r);
            let items = sample_mixture(
                PoolSet { sim: &sim, drift: &drift, rand: &rand },
                &weights,
                count,
                offset,
                &mut rng,
                &mut used,
            );
            debug!(
                "区块 #{index} ({}, {}) r={:.2} offset={} 采样 {} 件",
                params.x,
                params.y,
                params.r,
                offset,
                items.len()
            );
            chunks.push(ChunkSample { params, seed: chunk_seed, weights, items });
        }

        Ok(ChunksSample { count, chunks })
    }
}

fn chunk_seed(target_id: i32, x: i32, y: i32, global_seed: u32) -> u32 {
    hash32(&[target_id as u32, x as u32, y as u32, global_seed])
}

/// 区块种子折叠到向量库的 [0, 1) 种子空间
fn store_seed(seed: u32) -> f64 {
    seed as f64 / 4294967296.0
}

/// 单区块模式的旋转偏移，近原点区块按坐标哈希错开
fn single_offset(x: i32, y: i32, r: f64) -> usize {
    if r < 2.0 {
        (hash32(&[x.wrapping_add(100) as u32, y.wrapping_add(100) as u32]) % 50) as usize
    } else {
        0
    }
}

/// 多区块模式的旋转偏移
///
/// 近原点按坐标、全局种子与区块序号哈希错开，其余按序号等距展开。
/// 此处哈希参数比单区块模式多两个，两种模式的行为刻意不对齐。
fn multi_offset(x: i32, y: i32, global_seed: u32, index: usize, r: f64) -> usize {
    if r < 3.0 {
        let h = hash32(&[
            x.wrapping_add(100) as u32,
            y.wrapping_add(100) as u32,
            global_seed,
            index as u32,
        ]);
        (h % 100) as usize
    } else {
        index * 25
    }
}

/// 宽松解析逗号分隔的排除 ID 列表，忽略无法解析的片段
pub fn parse_exclude(raw: &str) -> Vec<i32> {
    raw.split(',').filter_map(|s| s.trim().parse::<i32>().ok()).collect()
}
