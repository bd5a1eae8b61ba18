use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use prometheus::*;

use crate::sampler::Candidate;

static METRIC_SAMPLE_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!("art_field_sample_count", "count of field sampling requests", &[
        "mode"
    ])
    .unwrap()
});

static METRIC_SAMPLE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!("art_field_sample_duration", "duration of field sampling in seconds")
        .unwrap()
});

static METRIC_PICK_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!("art_field_pick_count", "count of picked artworks by source pool", &[
        "source"
    ])
    .unwrap()
});

/// 增加采样请求计数
pub fn inc_sample(mode: &str) {
    METRIC_SAMPLE_COUNT.with_label_values(&[mode]).inc();
}

/// 记录采样耗时
pub fn observe_duration(duration: Duration) {
    METRIC_SAMPLE_DURATION.observe(duration.as_secs_f64());
}

/// 按来源池统计选中的候选
pub fn inc_picks(picks: &[Candidate]) {
    for candidate in picks {
        METRIC_PICK_COUNT.with_label_values(&[candidate.source.as_str()]).inc();
    }
}

/// 渲染 Prometheus 文本格式
pub fn render() -> Result<String> {
    let mut buf = vec![];
    TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
