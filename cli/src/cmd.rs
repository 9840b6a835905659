pub mod grade;
pub mod init;
pub mod parse;

use std::path::PathBuf;

use crate::util;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Explicit config file (default: grader.toml found in ancestors).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    Init(init::Args),

    #[command(alias("g"))]
    Grade(grade::Args),

    Parse(parse::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Init(args) => init::exec(args, self),
            Grade(args) => grade::exec(args, self).await,
            Parse(args) => parse::exec(args, self),
        }
    }

    pub fn load_config(&self) -> anyhow::Result<grader_core::Config> {
        match &self.config {
            Some(path) => grader_core::Config::from_toml_file(path.clone()),
            None => grader_core::Config::from_file_finding_in_ancestors(util::current_dir()),
        }
    }
}
