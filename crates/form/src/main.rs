mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Args, FormCommand};
use form_collector::client::{export_request, submit_request};
use form_collector::{Field, FileDraftStore, FormCollector};
use system_utils::path::expand_tilde;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let store = FileDraftStore::new(expand_tilde(&args.draft_dir));
    let mut collector = FormCollector::load(store);

    match args.command {
        FormCommand::Show => {}
        FormCommand::Set {
            business,
            city,
            state,
            prefix,
        } => {
            let updates = [
                (Field::BusinessName, business),
                (Field::City, city),
                (Field::State, state),
                (Field::OutputPrefix, prefix),
            ];
            for (field, value) in updates {
                if let Some(value) = value {
                    collector.set_field(field, value)?;
                }
            }
            if let Some(industry) = collector.apply_suggestions()? {
                eprintln!("prefilled keyword groups for {industry:?}");
            }
        }
        FormCommand::AddGroup { name } => {
            collector.add_group()?;
            if let Some(name) = name {
                let index = collector.state().keyword_groups.len() - 1;
                collector.rename_group(index, name)?;
            }
        }
        FormCommand::RenameGroup { group, name } => collector.rename_group(group, name)?,
        FormCommand::RemoveGroup { group } => collector.remove_group(group)?,
        FormCommand::AddKeyword { group, value } => {
            collector.add_keyword(group)?;
            if let Some(value) = value {
                let index = collector
                    .state()
                    .keyword_groups
                    .get(group)
                    .map(|entry| entry.keywords.len() - 1)
                    .context("keyword group vanished")?;
                collector.update_keyword(group, index, value)?;
            }
        }
        FormCommand::SetKeyword {
            group,
            index,
            value,
        } => collector.update_keyword(group, index, value)?,
        FormCommand::RemoveKeyword { group, index } => collector.remove_keyword(group, index)?,
        FormCommand::Suggest => match collector.apply_suggestions()? {
            Some(industry) => eprintln!("prefilled keyword groups for {industry:?}"),
            None => eprintln!("no suggestions: fill business, city and state on a fresh draft"),
        },
        FormCommand::Clear => {
            collector.clear()?;
            eprintln!("draft cleared");
            return Ok(());
        }
        FormCommand::Export { out } => {
            export_request(&collector.request(), &out)?;
            eprintln!("wrote {}", out.display());
            return Ok(());
        }
        FormCommand::Submit { proxy, out_dir } => {
            if !collector.state().has_identity() {
                anyhow::bail!("business name, city and state are required");
            }
            let report = submit_request(&proxy, &collector.request()).await?;
            let path = report.save_into(&out_dir)?;
            eprintln!("saved report to {}", path.display());
            return Ok(());
        }
    }

    let rendered =
        serde_json::to_string_pretty(collector.state()).context("failed to render draft")?;
    println!("{rendered}");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
