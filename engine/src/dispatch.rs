//! Command dispatch.
//!
//! Maps each [`Command`] onto exactly one engine operation. The permission
//! guard runs first; the engine itself never inspects who is asking.

use blam_types::{Command, CommandOutcome, Invocation};
use tracing::Instrument;

use crate::cancel::CancelToken;
use crate::engine::PolicyEngine;
use crate::error::EngineError;
use crate::spans;

impl PolicyEngine {
    pub async fn dispatch(
        &self,
        invocation: Invocation,
        cancel: &CancelToken,
    ) -> Result<CommandOutcome, EngineError> {
        let span = spans::command_span(
            &invocation.channel,
            &invocation.actor,
            invocation.command.name(),
        );
        self.run_command(invocation, cancel).instrument(span).await
    }

    async fn run_command(
        &self,
        invocation: Invocation,
        cancel: &CancelToken,
    ) -> Result<CommandOutcome, EngineError> {
        if invocation
            .authorize(self.exemptions().admin.as_ref())
            .is_err()
        {
            tracing::info!("rejected: actor lacks elevated permissions");
            return Err(EngineError::PermissionDenied {
                command: invocation.command.name(),
            });
        }

        let channel = &invocation.channel;
        let outcome = match invocation.command {
            Command::Blam { member } => CommandOutcome::Blammed {
                outcome: self.blam(channel, &member, cancel).await?,
            },
            Command::Unblam { member } => {
                let was_blammed = self.unblam(channel, &member).await?;
                CommandOutcome::Unblammed { member, was_blammed }
            }
            Command::List => CommandOutcome::Blamlist {
                members: self.list(channel).await?,
            },
            Command::LockIdv => CommandOutcome::Enforced {
                report: self.lock_idv(channel, cancel).await?,
            },
            Command::UnlockIdv => CommandOutcome::Unlocked {
                was_locked: self.unlock_idv(channel).await?,
            },
            Command::IdvTest => CommandOutcome::DryRun {
                decision: self.idv_test(channel).await?,
            },
            Command::WhitelistAdd { target } => CommandOutcome::Whitelisted {
                change: self.whitelist_add(channel, target).await?,
            },
            Command::WhitelistRemove { member } => {
                let was_whitelisted = self.whitelist_remove(channel, &member).await?;
                CommandOutcome::WhitelistRemoved {
                    member,
                    was_whitelisted,
                }
            }
            Command::WhitelistList => CommandOutcome::Whitelist {
                members: self.whitelist(channel).await?,
            },
            Command::Enforce => CommandOutcome::Enforced {
                report: self.enforce(channel, cancel).await?,
            },
        };
        Ok(outcome)
    }
}
