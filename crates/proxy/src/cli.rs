use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "localranklens-proxy",
    version,
    about = "Report proxy for LocalRankLens analysis backends"
)]
pub(crate) struct Args {
    /// TOML config; the remote HTML backend is used when omitted.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Overrides `listen_addr` from the config file.
    #[arg(long)]
    pub(crate) listen_addr: Option<String>,
    /// Writes JSON logs to a daily rolling file in this directory.
    #[arg(long)]
    pub(crate) log_dir: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub(crate) log_to_stderr: bool,
}
