use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{ChunkCommand, ServerCommand};

/// 围绕焦点画作采样相似度场的后端服务
#[derive(Parser, Debug)]
#[command(name = "artfield", version)]
pub struct Opts {
    /// PostgreSQL 连接地址
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// PCA 基底文件路径
    #[arg(long, value_name = "FILE", default_value = "pca_basis.json")]
    pub pca_basis: PathBuf,

    #[command(subcommand)]
    pub command: SubCommand,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// 启动 HTTP 服务
    Server(ServerCommand),
    /// 采样单个区块并打印结果
    Chunk(ChunkCommand),
}
