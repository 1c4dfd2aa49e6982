use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::jobs::JobKind;

#[derive(Parser, Debug)]
#[command(
    name = "uxreport",
    version,
    about = "Local UX analysis report parsing and catalog tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Index(IndexArgs),
    Status(StatusArgs),
    Overview(OverviewArgs),
    Page(PageArgs),
    Watch(WatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "public/all_analysis_runs")]
    pub runs_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    #[arg(long, default_value = "public/all_analysis_runs")]
    pub runs_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "public/all_analysis_runs")]
    pub runs_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OverviewArgs {
    #[arg(long, default_value = "public/all_analysis_runs")]
    pub runs_root: PathBuf,

    #[arg(long)]
    pub report_id: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    #[arg(long, default_value = "public/all_analysis_runs")]
    pub runs_root: PathBuf,

    #[arg(long)]
    pub report_id: String,

    #[arg(long)]
    pub page_id: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum JobKindArg {
    Capture,
    Analysis,
}

impl From<JobKindArg> for JobKind {
    fn from(value: JobKindArg) -> Self {
        match value {
            JobKindArg::Capture => Self::Capture,
            JobKindArg::Analysis => Self::Analysis,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    #[arg(long)]
    pub status_path: PathBuf,

    #[arg(long, value_enum, default_value_t = JobKindArg::Capture)]
    pub kind: JobKindArg,

    #[arg(long, default_value_t = crate::jobs::DEFAULT_POLL_INTERVAL_MS)]
    pub interval_ms: u64,

    #[arg(long)]
    pub max_polls: Option<usize>,

    #[arg(long, default_value = crate::jobs::screenshots::DEFAULT_CAPTURE_BASE_URL)]
    pub capture_base_url: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
