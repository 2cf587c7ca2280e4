use std::path::Path;

use csv::Writer;
use log::info;
use serde::Serialize;

use crate::analyzers::planner::ActionDecision;
use crate::batch::PlannedAction;
use crate::Result;

#[derive(Debug, Serialize)]
struct PlanRecord<'a> {
    file: &'a str,
    channels: usize,
    frames: u64,
    sample_rate: u32,
    valid_channels: String,
    category: &'static str,
    action: &'static str,
    partners: String,
}

impl<'a> From<&'a PlannedAction> for PlanRecord<'a> {
    fn from(planned: &'a PlannedAction) -> Self {
        let file = &planned.file;
        let partners = match &planned.decision {
            ActionDecision::Join { partners, .. } => partners
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(", "),
            _ => String::new(),
        };
        Self {
            file: &file.file_name,
            channels: file.channels,
            frames: file.frames,
            sample_rate: file.sample_rate,
            valid_channels: format!("{:0width$b}", file.verdict.valid_channel_mask, width = file.channels.max(1)),
            category: file.verdict.category().as_str(),
            action: planned.decision.as_str(),
            partners,
        }
    }
}

pub struct Reporter;

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_plan_report(&self, plan: &[PlannedAction], output_path: impl AsRef<Path>) -> Result<()> {
        let output_path_ref = output_path.as_ref();
        let mut writer = Writer::from_path(output_path_ref)?;
        for planned in plan {
            writer.serialize(PlanRecord::from(planned))?;
        }
        writer.flush()?;
        info!("Plan report generated: {}", output_path_ref.display());
        Ok(())
    }

    /// One line per file for the terminal.
    pub fn summary_line(&self, planned: &PlannedAction) -> String {
        let record = PlanRecord::from(planned);
        let mut line = format!(
            "{:<40} {:>2} ch  {:<16} -> {}",
            record.file, record.channels, record.category, record.action
        );
        if !record.partners.is_empty() {
            line.push_str(&format!(" [{}]", record.partners));
        }
        line
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::classifier::ChannelVerdict;
    use crate::analyzers::join::tests::described;
    use std::path::PathBuf;

    #[test]
    fn report_has_one_row_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("plan.csv");
        let plan = vec![
            PlannedAction {
                file: described("/s/voice.1.wav", ChannelVerdict::new(1, 1, true)),
                decision: ActionDecision::Join {
                    partners: vec![PathBuf::from("/s/voice.2.wav")],
                    new_path: None,
                },
                consumed_by_join: false,
            },
            PlannedAction {
                file: described("/s/pad.wav", ChannelVerdict::new(2, 0b10, true)),
                decision: ActionDecision::Monoize { channel: Some(1) },
                consumed_by_join: false,
            },
        ];
        Reporter::new().generate_plan_report(&plan, &report).unwrap();

        let mut reader = csv::Reader::from_path(&report).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "voice.1.wav");
        assert_eq!(&rows[0][6], "Join");
        assert_eq!(&rows[0][7], "voice.2.wav");
        assert_eq!(&rows[1][4], "10");
        assert_eq!(&rows[1][5], "Fake stereo");
    }
}
