// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Interactive confirmation before an apply.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::errors::ApplyError;

/// Decides whether an apply may proceed.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Return `true` to proceed with changes to `zone`.
    async fn confirm(&self, zone: &str) -> Result<bool, ApplyError>;
}

/// Asks on the terminal: `Apply changes to <zone>? [y/N]:`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirmer;

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, zone: &str) -> Result<bool, ApplyError> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("Apply changes to {zone}? [y/N]: ").as_bytes())
            .await
            .map_err(|e| ApplyError::Prompt(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| ApplyError::Prompt(e.to_string()))?;

        let mut answer = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut answer)
            .await
            .map_err(|e| ApplyError::Prompt(e.to_string()))?;

        Ok(parse_confirmation(&answer))
    }
}

/// `y` and `yes` (any case) confirm; anything else, including EOF, declines.
#[must_use]
pub fn parse_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::parse_confirmation;

    #[test]
    fn test_parse_confirmation() {
        for yes in ["y", "Y", "yes", "YES\n", "  yes  "] {
            assert!(parse_confirmation(yes), "{yes:?}");
        }
        for no in ["", "\n", "n", "no", "yep", "sure"] {
            assert!(!parse_confirmation(no), "{no:?}");
        }
    }
}
