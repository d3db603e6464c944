//! Operator console
//!
//! In manual mode nothing advances a transaction until an operator decides
//! it. The console reads one command per line and answers with one or more
//! lines of text:
//!
//! ```text
//! approve <id> [amount]   approve fully, or partially for a smaller amount
//! decline <id>            decline
//! list                    show the current batch
//! help                    show this text
//! ```

use std::sync::Arc;

use log::{info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::authorizer::{SIMULATED_CARD_TYPE, SIMULATED_MASKED_CARD};
use crate::core::{generate_authorization_code, GatewayEngine, ManualAuthorizer};
use crate::types::{Amount, AuthorizationOutcome, GatewayError, TransactionId, TransactionStatus};

const HELP: &str = "commands:
  approve <id> [amount]   approve a pending transaction, partially if amount is smaller
  decline <id>            decline a pending transaction
  list                    show every transaction in the batch
  help                    show this text";

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Approve {
        id: TransactionId,
        amount: Option<Amount>,
    },
    Decline {
        id: TransactionId,
    },
    List,
    Help,
}

/// Parse a console line
///
/// # Returns
///
/// * `Ok(Some(command))` - A recognised command
/// * `Ok(None)` - A blank line
/// * `Err(message)` - Unknown command or wrong arguments
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let parsed = match (command.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("approve", [id]) => ConsoleCommand::Approve {
            id: id.to_string(),
            amount: None,
        },
        ("approve", [id, amount]) => {
            let amount: Amount = amount
                .parse()
                .map_err(|_| format!("invalid amount '{}'", amount))?;
            ConsoleCommand::Approve {
                id: id.to_string(),
                amount: Some(amount),
            }
        }
        ("decline", [id]) => ConsoleCommand::Decline { id: id.to_string() },
        ("list", []) => ConsoleCommand::List,
        ("help", []) => ConsoleCommand::Help,
        ("approve" | "decline" | "list" | "help", _) => {
            return Err(format!("wrong arguments for '{}', try 'help'", command))
        }
        _ => return Err(format!("unknown command '{}', try 'help'", command)),
    };
    Ok(Some(parsed))
}

/// Applies operator decisions through a [`ManualAuthorizer`]
pub struct OperatorConsole {
    engine: GatewayEngine,
    manual: Arc<ManualAuthorizer>,
}

impl OperatorConsole {
    pub fn new(engine: GatewayEngine, manual: Arc<ManualAuthorizer>) -> Self {
        Self { engine, manual }
    }

    /// Run one command and return the reply
    pub fn execute(&self, command: ConsoleCommand) -> Result<String, GatewayError> {
        match command {
            ConsoleCommand::Approve { id, amount } => {
                let record = self.engine.get(&id)?;
                let requested = record.requested_amount;
                let code = generate_authorization_code();
                let outcome = match amount {
                    None => AuthorizationOutcome::approved(requested, code),
                    Some(amount) if amount == requested => {
                        AuthorizationOutcome::approved(requested, code)
                    }
                    Some(0) => {
                        return Err(GatewayError::Validation {
                            field: "amount".to_string(),
                            message: "approved amount must be positive".to_string(),
                        })
                    }
                    Some(amount) if amount < requested => {
                        AuthorizationOutcome::partially_approved(amount, code)
                    }
                    Some(amount) => {
                        return Err(GatewayError::Validation {
                            field: "amount".to_string(),
                            message: format!(
                                "{} exceeds the requested amount of {}",
                                amount, requested
                            ),
                        })
                    }
                };
                self.decide(&id, outcome)
            }
            ConsoleCommand::Decline { id } => {
                self.engine.get(&id)?;
                self.decide(&id, AuthorizationOutcome::declined())
            }
            ConsoleCommand::List => Ok(self.render_list()),
            ConsoleCommand::Help => Ok(HELP.to_string()),
        }
    }

    fn decide(&self, id: &str, outcome: AuthorizationOutcome) -> Result<String, GatewayError> {
        let status = outcome.status;
        let outcome = outcome.with_card(SIMULATED_CARD_TYPE, SIMULATED_MASKED_CARD);
        self.manual.resolve(id, outcome).map_err(|_| GatewayError::Validation {
            field: "id".to_string(),
            message: format!("transaction {} is not awaiting a decision", id),
        })?;
        info!("console: operator marked {} as {}", id, status);
        Ok(format!("{} {}", id, status))
    }

    fn render_list(&self) -> String {
        let records = self.engine.list();
        if records.is_empty() {
            return "no transactions".to_string();
        }
        records
            .iter()
            .map(|record| {
                let marker = if record.status == TransactionStatus::InProgress {
                    "*"
                } else {
                    " "
                };
                format!(
                    "{} {} {} {} {}",
                    marker, record.id, record.tx_type, record.requested_amount, record.status
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Read commands until `input` ends
    ///
    /// Errors from individual commands are written to `output`; only I/O
    /// failures end the loop early.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<(), GatewayError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let reply = match parse_command(&line) {
                Ok(None) => continue,
                Ok(Some(command)) => self
                    .execute(command)
                    .unwrap_or_else(|e| format!("error: {}", e)),
                Err(message) => {
                    warn!("console: {}", message);
                    format!("error: {}", message)
                }
            };
            output.write_all(reply.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok(())
    }
}
