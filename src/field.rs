use crate::numeric::{Mulberry32, add, gaussian_vector, lerp, normalize, scale, smoothstep};
use crate::pca::PcaBasis;

/// CLIP ViT-L/14 嵌入维数
pub const EMBED_DIM: usize = 768;

/// 温度插值的内外半径
const FIELD_R_INNER: f64 = 1.5;
const FIELD_R_OUTER: f64 = 12.0;

/// 方向偏移的最大幅度
const BIAS_MAX: f64 = 0.35;

/// 噪声强度 σ 随温度的插值区间
const NOISE_MIN: f64 = 0.05;
const NOISE_MAX: f64 = 0.35;

/// 单个区块的派生几何参数
///
/// 均为请求坐标的纯函数：r 为到焦点的距离，θ 为方位角，
/// t 为温度（0 = 紧相似，1 = 近随机），随 r 单调不减。
#[derive(Debug, Clone, Copy)]
pub struct ChunkParams {
    pub x: i32,
    pub y: i32,
    pub r: f64,
    pub theta: f64,
    pub t: f64,
}

impl ChunkParams {
    pub fn new(x: i32, y: i32) -> Self {
        let r = f64::hypot(x as f64, y as f64);
        let theta = (y as f64).atan2(x as f64);
        let t = smoothstep(FIELD_R_INNER, FIELD_R_OUTER, r);
        Self { x, y, r, theta, t }
    }
}

/// 三个候选池的归一化混合概率
#[derive(Debug, Clone, Copy)]
pub struct MixtureWeights {
    pub sim: f64,
    pub drift: f64,
    pub rand: f64,
}

impl MixtureWeights {
    pub fn from_t(t: f64) -> Self {
        let w_sim = (1.0 - t) * (1.0 - t);
        let w_drift = 2.0 * t * (1.0 - t);
        let w_rand = t * t;
        let mut w = w_sim + w_drift + w_rand;
        if w == 0.0 {
            w = 1.0;
        }
        Self { sim: w_sim / w, drift: w_drift / w, rand: w_rand / w }
    }
}

/// 由 PCA 前两个主方向合成的方向偏移向量
///
/// d = cosθ·u₁ + sinθ·u₂，归一化后按 α(t) = lerp(0, 0.35, t) 缩放。
pub fn direction_bias(basis: &PcaBasis, theta: f64, t: f64) -> Vec<f32> {
    let u1 = &basis.components()[0];
    let u2 = &basis.components()[1];
    let (cos, sin) = (theta.cos() as f32, theta.sin() as f32);
    let d: Vec<f32> = u1.iter().zip(u2).map(|(a, b)| cos * a + sin * b).collect();
    scale(&normalize(&d), lerp(0.0, BIAS_MAX, t) as f32)
}

/// 漂移查询向量 v' = normalize(v + bias + σ·ε)
///
/// v 为焦点嵌入，入库时已单位化，此处再做一次归一化兜底。
/// ε 从区块 PRNG 中抽取，必须先于混合采样消费同一个生成器。
pub fn query_vector(
    v: &[f32],
    basis: &PcaBasis,
    theta: f64,
    t: f64,
    rng: &mut Mulberry32,
) -> Vec<f32> {
    let sigma = lerp(NOISE_MIN, NOISE_MAX, t);
    let bias = direction_bias(basis, theta, t);
    let eps = gaussian_vector(v.len(), rng);
    normalize(&add(&add(&normalize(v), &bias), &scale(&eps, sigma as f32)))
}
