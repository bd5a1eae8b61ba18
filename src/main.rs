use anyhow::Result;
use clap::Parser;

use artfield::cli::SubCommandExtend;
use artfield::config::{Opts, SubCommand};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let opts = Opts::parse();
    match &opts.command {
        SubCommand::Server(cmd) => cmd.run(&opts).await,
        SubCommand::Chunk(cmd) => cmd.run(&opts).await,
    }
}
