use std::collections::HashSet;

use serde::Serialize;

use crate::db::{ArtworkRecord, PoolRecord};
use crate::field::MixtureWeights;
use crate::numeric::Mulberry32;

/// 候选来源标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Sim,
    Drift,
    Rand,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sim => "sim",
            Self::Drift => "drift",
            Self::Rand => "rand",
        }
    }
}

/// 带来源标签的候选画作
#[derive(Debug, Clone)]
pub struct Candidate {
    pub artwork: ArtworkRecord,
    pub similarity: Option<f64>,
    pub source: Source,
}

impl Candidate {
    /// 给一池查询结果打上来源标签
    pub fn tag(records: Vec<PoolRecord>, source: Source) -> Vec<Candidate> {
        records
            .into_iter()
            .map(|r| Candidate { artwork: r.artwork, similarity: r.similarity, source })
            .collect()
    }
}

/// 一个区块的三个候选池
#[derive(Debug, Clone, Copy)]
pub struct PoolSet<'a> {
    pub sim: &'a [Candidate],
    pub drift: &'a [Candidate],
    pub rand: &'a [Candidate],
}

/// 池游标
///
/// 按 [(i + offset) mod n] 的旋转顺序遍历，不复制底层序列。
struct PoolCursor<'a> {
    items: &'a [Candidate],
    offset: usize,
    pos: usize,
}

impl<'a> PoolCursor<'a> {
    fn new(items: &'a [Candidate], offset: usize) -> Self {
        Self { items, offset, pos: 0 }
    }

    /// 取下一个未被占用的候选，池耗尽返回 None
    fn take(&mut self, used: &HashSet<i32>) -> Option<&'a Candidate> {
        while self.pos < self.items.len() {
            let idx = (self.pos + self.offset) % self.items.len();
            self.pos += 1;
            let candidate = &self.items[idx];
            if !used.contains(&candidate.artwork.id) {
                return Some(candidate);
            }
        }
        None
    }
}

/// 按半径驱动的混合概率从三个池中抽取 count 个候选
///
/// 主池由 PRNG 抽签决定，耗尽时按固定顺序回退：
/// sim→[drift, rand]，drift→[sim, rand]，rand→[drift, sim]。
/// 旋转偏移只作用于 sim 和 drift 池。选中的 id 记入 used，
/// 三池均耗尽时提前终止，结果可以短于 count。
pub fn sample_mixture(
    pools: PoolSet,
    weights: &MixtureWeights,
    count: usize,
    offset: usize,
    rng: &mut Mulberry32,
    used: &mut HashSet<i32>,
) -> Vec<Candidate> {
    let mut sim = PoolCursor::new(pools.sim, offset);
    let mut drift = PoolCursor::new(pools.drift, offset);
    let mut rand = PoolCursor::new(pools.rand, 0);

    let mut picked = Vec::with_capacity(count);
    for _ in 0..count {
        let u = rng.next();
        let order = if u < weights.sim {
            [&mut sim, &mut drift, &mut rand]
        } else if u < weights.sim + weights.drift {
            [&mut drift, &mut sim, &mut rand]
        } else {
            [&mut rand, &mut drift, &mut sim]
        };

        let mut chosen = None;
        for cursor in order {
            if let Some(candidate) = cursor.take(used) {
                chosen = Some(candidate.clone());
                break;
            }
        }

        match chosen {
            Some(candidate) => {
                used.insert(candidate.artwork.id);
                picked.push(candidate);
            }
            None => break,
        }
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn art(id: i32) -> ArtworkRecord {
        ArtworkRecord {
            id,
            object_id: None,
            title: None,
            artist: None,
            local_image_url: Some(format!("https://cdn.example/{id}.jpg")),
            small_image_url: None,
            original_image_url: None,
        }
    }

    fn pool(ids: impl IntoIterator<Item = i32>, source: Source) -> Vec<Candidate> {
        let similarity = match source {
            Source::Rand => None,
            _ => Some(0.9),
        };
        ids.into_iter().map(|id| Candidate { artwork: art(id), similarity, source }).collect()
    }

    fn ids(picked: &[Candidate]) -> Vec<i32> {
        picked.iter().map(|c| c.artwork.id).collect()
    }

    #[test]
    fn pure_sim_weights_take_sim_in_order() {
        let sim = pool(1..=40, Source::Sim);
        let drift = pool(101..=140, Source::Drift);
        let rand = pool(201..=240, Source::Rand);
        let pools = PoolSet { sim: &sim, drift: &drift, rand: &rand };

        let weights = MixtureWeights::from_t(0.0);
        let mut used = HashSet::new();
        let picked =
            sample_mixture(pools, &weights, 20, 0, &mut Mulberry32::new(5), &mut used);

        assert_eq!(ids(&picked), (1..=20).collect::<Vec<_>>());
        assert!(picked.iter().all(|c| c.source == Source::Sim));
    }

    #[test]
    fn pure_rand_weights_take_rand() {
        let sim = pool(1..=40, Source::Sim);
        let drift = pool(101..=140, Source::Drift);
        let rand = pool(201..=240, Source::Rand);
        let pools = PoolSet { sim: &sim, drift: &drift, rand: &rand };

        let weights = MixtureWeights::from_t(1.0);
        let mut used = HashSet::new();
        let picked =
            sample_mixture(pools, &weights, 20, 0, &mut Mulberry32::new(5), &mut used);

        assert_eq!(ids(&picked), (201..=220).collect::<Vec<_>>());
        assert!(picked.iter().all(|c| c.source == Source::Rand && c.similarity.is_none()));
    }

    #[test]
    fn fallback_chain_on_exhaustion() {
        let sim = pool(1..=3, Source::Sim);
        let drift = pool(101..=105, Source::Drift);
        let rand = pool(201..=205, Source::Rand);
        let pools = PoolSet { sim: &sim, drift: &drift, rand: &rand };

        let weights = MixtureWeights::from_t(0.0);
        let mut used = HashSet::new();
        let picked =
            sample_mixture(pools, &weights, 10, 0, &mut Mulberry32::new(1), &mut used);

        // sim 耗尽后回退 drift，drift 耗尽后回退 rand
        let sources: Vec<Source> = picked.iter().map(|c| c.source).collect();
        assert_eq!(
            sources,
            vec![
                Source::Sim,
                Source::Sim,
                Source::Sim,
                Source::Drift,
                Source::Drift,
                Source::Drift,
                Source::Drift,
                Source::Drift,
                Source::Rand,
                Source::Rand,
            ]
        );
    }

    #[test]
    fn early_termination_when_all_pools_dry() {
        let sim = pool(1..=2, Source::Sim);
        let drift = pool(3..=4, Source::Drift);
        let rand = pool(5..=6, Source::Rand);
        let pools = PoolSet { sim: &sim, drift: &drift, rand: &rand };

        let weights = MixtureWeights::from_t(0.5);
        let mut used = HashSet::new();
        let picked =
            sample_mixture(pools, &weights, 50, 0, &mut Mulberry32::new(9), &mut used);

        assert_eq!(picked.len(), 6);
        let unique: HashSet<i32> = ids(&picked).into_iter().collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn used_set_excludes_and_records() {
        let sim = pool(1..=10, Source::Sim);
        let drift = pool(11..=20, Source::Drift);
        let rand = pool(21..=30, Source::Rand);
        let pools = PoolSet { sim: &sim, drift: &drift, rand: &rand };

        let weights = MixtureWeights::from_t(0.0);
        let mut used: HashSet<i32> = [1, 2, 3].into_iter().collect();
        let picked =
            sample_mixture(pools, &weights, 4, 0, &mut Mulberry32::new(2), &mut used);

        assert_eq!(ids(&picked), vec![4, 5, 6, 7]);
        for id in [4, 5, 6, 7] {
            assert!(used.contains(&id));
        }
    }

    #[test]
    fn duplicate_id_across_pools_picked_once() {
        // 7 同时出现在 sim 与 rand 池
        let sim = pool([7, 8], Source::Sim);
        let drift = pool(Vec::new(), Source::Drift);
        let rand = pool([7, 9], Source::Rand);
        let pools = PoolSet { sim: &sim, drift: &drift, rand: &rand };

        let weights = MixtureWeights::from_t(0.5);
        let mut used = HashSet::new();
        let picked =
            sample_mixture(pools, &weights, 10, 0, &mut Mulberry32::new(3), &mut used);

        let picked_ids = ids(&picked);
        assert_eq!(picked_ids.iter().filter(|&&id| id == 7).count(), 1);
        let unique: HashSet<i32> = picked_ids.iter().copied().collect();
        assert_eq!(unique.len(), picked.len());
    }

    #[test]
    fn rotation_shifts_sim_and_drift_only() {
        let sim = pool(1..=5, Source::Sim);
        let drift = pool(11..=15, Source::Drift);
        let rand = pool(21..=25, Source::Rand);
        let pools = PoolSet { sim: &sim, drift: &drift, rand: &rand };

        let mut used = HashSet::new();
        let picked = sample_mixture(
            pools,
            &MixtureWeights::from_t(0.0),
            1,
            2,
            &mut Mulberry32::new(4),
            &mut used,
        );
        assert_eq!(ids(&picked), vec![3]);

        let mut used = HashSet::new();
        let picked = sample_mixture(
            pools,
            &MixtureWeights::from_t(1.0),
            1,
            2,
            &mut Mulberry32::new(4),
            &mut used,
        );
        // 随机池不旋转
        assert_eq!(ids(&picked), vec![21]);
    }

    #[test]
    fn rotation_wraps_modulo_pool_length() {
        let sim = pool(1..=4, Source::Sim);
        let drift = pool(Vec::new(), Source::Drift);
        let rand = pool(Vec::new(), Source::Rand);
        let pools = PoolSet { sim: &sim, drift: &drift, rand: &rand };

        let mut used = HashSet::new();
        let picked = sample_mixture(
            pools,
            &MixtureWeights::from_t(0.0),
            4,
            6,
            &mut Mulberry32::new(4),
            &mut used,
        );
        assert_eq!(ids(&picked), vec![3, 4, 1, 2]);
    }

    #[test]
    fn deterministic_for_equal_inputs() {
        let sim = pool(1..=30, Source::Sim);
        let drift = pool(31..=60, Source::Drift);
        let rand = pool(61..=90, Source::Rand);
        let pools = PoolSet { sim: &sim, drift: &drift, rand: &rand };
        let weights = MixtureWeights::from_t(0.4);

        let mut used_a = HashSet::new();
        let a = sample_mixture(pools, &weights, 15, 3, &mut Mulberry32::new(99), &mut used_a);
        let mut used_b = HashSet::new();
        let b = sample_mixture(pools, &weights, 15, 3, &mut Mulberry32::new(99), &mut used_b);

        assert_eq!(ids(&a), ids(&b));
    }
}
