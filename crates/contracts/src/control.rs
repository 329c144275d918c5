//! ControlChannel trait - process-instance creation side-channel
//!
//! The monitoring system must know about an instance before its events arrive.

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Control command envelope
///
/// Serializes as
/// `{"type":"command","module":"new_process_instance","payload":{...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    #[serde(rename = "type")]
    pub kind: String,
    pub module: String,
    pub payload: NewProcessInstance,
}

impl ControlCommand {
    pub fn new_process_instance(
        instance_name: impl Into<String>,
        process_type: impl Into<String>,
    ) -> Self {
        Self {
            kind: "command".to_string(),
            module: "new_process_instance".to_string(),
            payload: NewProcessInstance {
                instance_name: instance_name.into(),
                bpmn_job_start: true,
                process_type: process_type.into(),
            },
        }
    }
}

/// Payload of a `new_process_instance` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProcessInstance {
    pub instance_name: String,
    pub bpmn_job_start: bool,
    pub process_type: String,
}

/// Side-channel output trait
#[trait_variant::make(ControlChannel: Send)]
pub trait LocalControlChannel {
    /// Channel name (used for logging)
    fn name(&self) -> &str;

    /// Deliver one command
    async fn send(&mut self, command: &ControlCommand) -> Result<(), ContractError>;

    /// Close channel
    async fn close(&mut self) -> Result<(), ContractError>;
}
