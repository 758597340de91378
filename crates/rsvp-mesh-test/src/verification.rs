//! Verification helpers for configuration transactions
//!
//! Provides assertion helpers over the command lists a manager submits

use thiserror::Error;

/// Verification error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Transaction does not start with '{expected}'")]
    BadPreamble { expected: String },

    #[error("Transaction does not end with '{expected}'")]
    BadTrailer { expected: String },

    #[error("No block for tunnel '{tunnel}' in transaction")]
    BlockNotFound { tunnel: String },

    #[error("Block for tunnel '{tunnel}' lacks statement '{statement}'")]
    StatementNotFound { tunnel: String, statement: String },

    #[error("Statement '{statement}' not found in transaction")]
    MissingStatement { statement: String },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

const PREAMBLE: [&str; 3] = ["configure", "router traffic-engineering", "rsvp"];
const TRAILER: [&str; 2] = ["end", "write"];

/// Configuration transaction verification helper
pub struct TransactionVerifier<'a> {
    cmds: &'a [String],
}

impl<'a> TransactionVerifier<'a> {
    /// Create a new verifier over a submitted command list
    pub fn new(cmds: &'a [String]) -> Self {
        Self { cmds }
    }

    /// Verify the configuration mode entry and exit sequence
    pub fn assert_wrapped(&self) -> VerifyResult<()> {
        let head: Vec<&str> = self.cmds.iter().take(PREAMBLE.len()).map(String::as_str).collect();
        if head != PREAMBLE {
            return Err(VerificationError::BadPreamble {
                expected: PREAMBLE.join(", "),
            });
        }

        let skip = self.cmds.len().saturating_sub(TRAILER.len());
        let tail: Vec<&str> = self.cmds.iter().skip(skip).map(String::as_str).collect();
        if tail != TRAILER {
            return Err(VerificationError::BadTrailer {
                expected: TRAILER.join(", "),
            });
        }
        Ok(())
    }

    /// Statements between `tunnel <name>` and the matching `exit`
    pub fn tunnel_block(&self, tunnel: &str) -> VerifyResult<&'a [String]> {
        let enter = format!("tunnel {}", tunnel);
        let start = self
            .cmds
            .iter()
            .position(|c| *c == enter)
            .ok_or_else(|| VerificationError::BlockNotFound {
                tunnel: tunnel.to_string(),
            })?;
        let len = self.cmds[start..]
            .iter()
            .position(|c| c == "exit")
            .unwrap_or(self.cmds.len() - start);
        Ok(&self.cmds[start + 1..start + len])
    }

    /// Verify a creation block: template, destination and no shutdown
    pub fn assert_created(&self, tunnel: &str, template: &[String], target: &str) -> VerifyResult<()> {
        let block = self.tunnel_block(tunnel)?;
        let destination = format!("destination ip {}", target);
        for statement in template
            .iter()
            .map(String::as_str)
            .chain([destination.as_str(), "no shutdown"])
        {
            if !block.iter().any(|c| c == statement) {
                return Err(VerificationError::StatementNotFound {
                    tunnel: tunnel.to_string(),
                    statement: statement.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Verify that a tunnel gets its timeout mark removed
    pub fn assert_mark_cleared(&self, tunnel: &str) -> VerifyResult<()> {
        let block = self.tunnel_block(tunnel)?;
        if !block.iter().any(|c| c == "no comment") {
            return Err(VerificationError::StatementNotFound {
                tunnel: tunnel.to_string(),
                statement: "no comment".to_string(),
            });
        }
        Ok(())
    }

    /// Verify that a tunnel gets a timeout mark for `now`
    pub fn assert_mark_set(&self, tunnel: &str, now: i64) -> VerifyResult<()> {
        let block = self.tunnel_block(tunnel)?;
        let statement = format!("!! timeout: {}", now);
        if !block.iter().any(|c| *c == statement) {
            return Err(VerificationError::StatementNotFound {
                tunnel: tunnel.to_string(),
                statement,
            });
        }
        Ok(())
    }

    /// Verify that a tunnel is deleted
    pub fn assert_deleted(&self, tunnel: &str) -> VerifyResult<()> {
        let statement = format!("no tunnel {}", tunnel);
        if !self.cmds.iter().any(|c| *c == statement) {
            return Err(VerificationError::MissingStatement { statement });
        }
        Ok(())
    }
}
