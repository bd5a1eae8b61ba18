use clap::Parser;
use log::info;
use tokio::net::TcpListener;

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::db::init_db;
use crate::engine::FieldEngine;
use crate::{pca, server};

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        pca::init(&opts.pca_basis);

        let db = init_db(&opts.database_url).await?;
        let engine = FieldEngine::new(db).await;

        // 创建应用状态
        let state = server::AppState::new(engine);

        // 创建应用
        let app = server::create_app(state);

        // 启动服务器
        info!("starting server at http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
