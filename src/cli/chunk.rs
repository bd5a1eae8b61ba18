use std::convert::Infallible;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::debug;

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::db::init_db;
use crate::engine::{ChunkRequest, ChunkSample, DEFAULT_COUNT, FieldEngine, parse_exclude};
use crate::pca;

/// 采样单个区块并打印结果，用于调参与排障
#[derive(Parser, Debug, Clone)]
pub struct ChunkCommand {
    /// 焦点画作 ID
    pub target_id: i32,
    /// 区块 X 坐标
    #[arg(allow_hyphen_values = true)]
    pub chunk_x: i32,
    /// 区块 Y 坐标
    #[arg(allow_hyphen_values = true)]
    pub chunk_y: i32,
    /// 返回数量
    #[arg(short = 'n', long, default_value_t = DEFAULT_COUNT)]
    pub count: usize,
    /// 全局随机种子
    #[arg(long, default_value_t = 0)]
    pub seed: u32,
    /// 逗号分隔的排除 ID 列表
    #[arg(long, default_value = "")]
    pub exclude: String,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for ChunkCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        pca::init(&opts.pca_basis);

        let db = init_db(&opts.database_url).await?;
        let engine = FieldEngine::new(db).await;

        let req = ChunkRequest {
            target_id: self.target_id,
            x: self.chunk_x,
            y: self.chunk_y,
            seed: self.seed,
            count: self.count,
            exclude: parse_exclude(&self.exclude),
        };
        let sample = engine.sample_chunk(&req).await?;

        debug!("r={:.2} theta={:.2} t={:.2}", sample.params.r, sample.params.theta, sample.params.t);

        print_result(&sample, self)
    }
}

fn print_result(sample: &ChunkSample, opts: &ChunkCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            let rows: Vec<_> = sample
                .items
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "id": c.artwork.id,
                        "title": c.artwork.title,
                        "similarity": c.similarity,
                        "source": c.source,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?)
        }
        OutputFormat::Table => {
            for c in &sample.items {
                let similarity =
                    c.similarity.map_or_else(|| "-".to_string(), |s| format!("{:.2}", s));
                println!(
                    "{}\t{}\t{}\t{}",
                    c.artwork.id,
                    c.source.as_str(),
                    similarity,
                    c.artwork.title.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone)]
pub enum OutputFormat {
    Json,
    Table,
}

impl FromStr for OutputFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            _ => unreachable!(),
        }
    }
}
