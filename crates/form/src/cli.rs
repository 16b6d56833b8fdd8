use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "localranklens-form",
    version,
    about = "Builds LocalRankLens analysis requests and fetches reports"
)]
pub(crate) struct Args {
    /// Directory holding the saved form draft.
    #[arg(long, default_value = "~/.localranklens")]
    pub(crate) draft_dir: String,
    #[command(subcommand)]
    pub(crate) command: FormCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum FormCommand {
    /// Print the current draft.
    Show,
    /// Update business identity fields.
    Set {
        #[arg(long)]
        business: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        prefix: Option<String>,
    },
    AddGroup {
        #[arg(long)]
        name: Option<String>,
    },
    RenameGroup {
        group: usize,
        name: String,
    },
    RemoveGroup {
        group: usize,
    },
    AddKeyword {
        group: usize,
        value: Option<String>,
    },
    SetKeyword {
        group: usize,
        index: usize,
        value: String,
    },
    RemoveKeyword {
        group: usize,
        index: usize,
    },
    /// Replace keyword groups with suggestions for the business name.
    Suggest,
    /// Erase the draft.
    Clear,
    /// Write the request payload to a JSON file.
    Export {
        #[arg(long, default_value = "config.json")]
        out: PathBuf,
    },
    /// Send the request to the proxy and save the returned report.
    Submit {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        proxy: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}
