use crate::error::{Result, TontineError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Create,
    Join,
    Pay,
    Status,
}

/// One row of a replay script. Fields not used by the row's operation stay
/// empty in the CSV and deserialize to `None`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Command {
    pub op: CommandKind,
    pub actor: Option<u64>,
    pub group: Option<u64>,
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub frequency: Option<u32>,
    pub start_date: Option<NaiveDate>,
}

/// Reads replay commands from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths
/// and yields an iterator of `Result<Command>` so large scripts stream
/// without loading fully into memory.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(TontineError::from))
    }
}
