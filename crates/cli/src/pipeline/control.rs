//! Process-instance announcement.
//!
//! The monitoring side must know an instance before its events arrive, so
//! every selected instance is announced before brokers are opened.

use contracts::{ContractError, ControlChannel, ControlCommand};
use topology::Topology;
use tracing::{info, warn};

/// Control channel that only logs the commands it would send
#[derive(Debug)]
pub struct LogControlChannel {
    name: String,
    sent: Vec<ControlCommand>,
}

impl LogControlChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sent: Vec::new(),
        }
    }

    /// Commands sent so far
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn sent(&self) -> &[ControlCommand] {
        &self.sent
    }
}

impl ControlChannel for LogControlChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, command: &ControlCommand) -> Result<(), ContractError> {
        let json = serde_json::to_string(command).map_err(|e| ContractError::ControlChannel {
            message: e.to_string(),
        })?;
        info!(channel = %self.name, command = %json, "control command");
        self.sent.push(command.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        info!(channel = %self.name, sent = self.sent.len(), "control channel closed");
        Ok(())
    }
}

/// Announce every selected instance with a known process type
///
/// Returns the number of commands sent. Failures are logged per instance.
pub async fn announce_instances<C: ControlChannel>(channel: &mut C, topology: &Topology) -> usize {
    let mut sent = 0;

    for instance in topology.selected_instances() {
        let Some(process_type) = &instance.process_type else {
            warn!(
                instance = %instance.process_instance,
                "no process type derivable, instance not announced"
            );
            continue;
        };

        let command = ControlCommand::new_process_instance(&instance.process_instance, process_type);
        match channel.send(&command).await {
            Ok(()) => sent += 1,
            Err(e) => warn!(
                channel = channel.name(),
                instance = %instance.process_instance,
                error = %e,
                "failed to announce instance"
            ),
        }
    }

    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EmulatorBlueprint, Selection, StakeholderConfig};
    use topology::TopologyResolver;

    fn stakeholder(instance: &str, path: &str) -> StakeholderConfig {
        StakeholderConfig {
            name: "Carrier".into(),
            process_instance: instance.into(),
            host: "localhost".into(),
            port: 1883,
            stream_file_path: path.into(),
        }
    }

    #[tokio::test]
    async fn test_announce_selected_instances() {
        let bp = EmulatorBlueprint {
            stakeholders: vec![
                stakeholder("I1", "shipment-1-data/AMS-CDG/06-AMS-CDG-stakeholder.csv"),
                stakeholder("I2", "flat.csv"),
            ],
            ..Default::default()
        };
        let topology = TopologyResolver::resolve(&bp, &Selection::All).unwrap();
        let mut channel = LogControlChannel::new("log");

        let sent = announce_instances(&mut channel, &topology).await;

        assert_eq!(sent, 1);
        assert_eq!(channel.sent()[0].payload.instance_name, "I1");
        assert_eq!(channel.sent()[0].payload.process_type, "AMS-CDG");
        assert!(channel.sent()[0].payload.bpmn_job_start);
    }
}
