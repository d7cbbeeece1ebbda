use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tontine::application::engine::{CreateGroup, TontineEngine};
use tontine::domain::group::{ActorId, GroupId};
use tontine::error::TontineError;
use tontine::infrastructure::in_memory::{
    InMemoryContributionStore, InMemoryGroupStore, InMemoryMembershipStore,
};
use tontine::interfaces::csv::command_reader::{Command, CommandKind, CommandReader};
use tontine::interfaces::csv::summary_writer::{GroupSummary, SummaryWriter};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input command script CSV file
    script: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = build_engine(cli.db_path)?;

    let file = File::open(cli.script).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for command in reader.commands() {
        match command {
            Ok(command) => {
                // Taxonomy errors are terminal for the row, not the replay.
                if let Err(e) = apply(&engine, command).await {
                    warn!(error = %e, "command skipped");
                }
            }
            Err(e) => warn!(error = %e, "unreadable command row"),
        }
    }

    let mut summaries = Vec::new();
    for group in engine.all_groups().await.into_diagnostic()? {
        let status = engine.get_round_status(group.id).await.into_diagnostic()?;
        summaries.push(GroupSummary::new(&group, &status));
    }

    let stdout = io::stdout();
    let mut writer = SummaryWriter::new(stdout.lock());
    writer.write_summaries(summaries).into_diagnostic()?;

    Ok(())
}

fn build_engine(db_path: Option<PathBuf>) -> Result<TontineEngine> {
    match db_path {
        Some(path) => open_persistent(path),
        None => Ok(TontineEngine::new(
            Box::new(InMemoryGroupStore::new()),
            Box::new(InMemoryMembershipStore::new()),
            Box::new(InMemoryContributionStore::new()),
        )),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_persistent(path: PathBuf) -> Result<TontineEngine> {
    let store = tontine::infrastructure::rocksdb::RocksDbStore::open(path).into_diagnostic()?;
    Ok(TontineEngine::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store),
    ))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_persistent(_path: PathBuf) -> Result<TontineEngine> {
    Err(miette::miette!(
        "--db-path requires a build with the storage-rocksdb feature"
    ))
}

fn require<T>(value: Option<T>, field: &str) -> Result<T, TontineError> {
    value.ok_or_else(|| TontineError::Validation(format!("missing field: {field}")))
}

async fn apply(engine: &TontineEngine, command: Command) -> Result<(), TontineError> {
    match command.op {
        CommandKind::Create => {
            let creator = ActorId(require(command.actor, "actor")?);
            let req = CreateGroup {
                name: require(command.name, "name")?,
                amount: require(command.amount, "amount")?,
                frequency_days: require(command.frequency, "frequency")?,
                start_date: require(command.start_date, "start_date")?,
            };
            engine.create_group(creator, req).await?;
        }
        CommandKind::Join => {
            let group = GroupId(require(command.group, "group")?);
            let actor = ActorId(require(command.actor, "actor")?);
            engine.join(group, actor).await?;
        }
        CommandKind::Pay => {
            let group = GroupId(require(command.group, "group")?);
            let actor = ActorId(require(command.actor, "actor")?);
            let amount = require(command.amount, "amount")?;
            engine.submit_contribution(group, actor, amount).await?;
        }
        CommandKind::Status => {
            let group = GroupId(require(command.group, "group")?);
            let status = engine.get_round_status(group).await?;
            info!(
                group = %group,
                round = status.current_round,
                total_rounds = ?status.total_rounds,
                paid = status.payments_received,
                participants = status.total_participants,
                complete = status.is_round_complete,
                "round status"
            );
        }
    }
    Ok(())
}
