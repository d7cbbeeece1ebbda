use crate::application::engine::RoundStatus;
use crate::domain::group::{Group, GroupId, GroupStatus};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Final per-group state emitted after a replay.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: String,
    pub status: GroupStatus,
    pub current_round: u32,
    pub total_rounds: Option<u32>,
    pub participants: usize,
    pub payments_this_round: usize,
}

impl GroupSummary {
    pub fn new(group: &Group, status: &RoundStatus) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            status: group.status,
            current_round: status.current_round,
            total_rounds: status.total_rounds,
            participants: status.total_participants,
            payments_this_round: status.payments_received,
        }
    }
}

/// Writes group summaries as CSV to any `Write` sink.
pub struct SummaryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> SummaryWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_summaries(&mut self, summaries: Vec<GroupSummary>) -> Result<()> {
        for summary in summaries {
            self.writer.serialize(summary)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_header_and_rows() {
        let summary = GroupSummary {
            id: GroupId(1),
            name: "Family pot".to_string(),
            status: GroupStatus::Pending,
            current_round: 2,
            total_rounds: Some(3),
            participants: 3,
            payments_this_round: 1,
        };

        let mut buf = Vec::new();
        {
            let mut writer = SummaryWriter::new(&mut buf);
            writer.write_summaries(vec![summary]).unwrap();
        }
        let output = String::from_utf8(buf).unwrap();

        assert!(output.starts_with(
            "id,name,status,current_round,total_rounds,participants,payments_this_round"
        ));
        assert!(output.contains("1,Family pot,pending,2,3,3,1"));
    }
}
