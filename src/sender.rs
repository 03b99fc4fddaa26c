#![cfg(feature = "std")]

//! Command sender: one awaited write per command, failures returned as
//! values. Callers serialize sends themselves if ordering matters.

use crate::core::{to_hex, Command};
use crate::error::CommandError;
use crate::transport::CommandChannel;

/// Encode `command` and write it through `channel`.
///
/// Without a channel nothing is written and `NotConnected` comes back. A
/// transport failure is logged and returned as `WriteFailed`.
pub async fn send<C>(channel: Option<&mut C>, command: &Command) -> Result<(), CommandError>
where
    C: CommandChannel + ?Sized,
{
    let Some(channel) = channel else {
        log::error!("{}", CommandError::NotConnected);
        return Err(CommandError::NotConnected);
    };

    let bytes = command.encode();
    match channel.write(&bytes).await {
        Ok(()) => {
            log::info!("Sent command: {}", to_hex(&bytes));
            Ok(())
        }
        Err(e) => {
            let err = CommandError::WriteFailed(format!("{:#}", e));
            log::error!("{}", err);
            Err(err)
        }
    }
}

/// Send the single-byte enable-telemetry command (`0x80`).
pub async fn enable_telemetry<C>(channel: Option<&mut C>) -> Result<(), CommandError>
where
    C: CommandChannel + ?Sized,
{
    let result = send(channel, &Command::enable_telemetry()).await;
    if result.is_err() {
        log::warn!("Failed to send EnableOpsLog command");
    }
    result
}
