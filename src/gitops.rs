// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Git auto-commit of applied zone artifacts.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::ApplyError;

/// Records applied artifacts in version control.
#[async_trait]
pub trait Committer: Send + Sync {
    /// Commit `paths` with `message`. A no-op outside a repository.
    async fn commit(&self, paths: &[PathBuf], message: &str) -> Result<(), ApplyError>;
}

/// Shells out to `git` in a working directory.
#[derive(Debug, Clone)]
pub struct GitCommitter {
    workdir: PathBuf,
}

impl GitCommitter {
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Whether `workdir` is inside a git work tree.
    pub async fn is_repository(&self) -> bool {
        match run_git(&self.workdir, &["rev-parse", "--is-inside-work-tree"]).await {
            Ok(stdout) => stdout.trim() == "true",
            Err(e) => {
                debug!("Not a git work tree: {}", e);
                false
            }
        }
    }
}

impl Default for GitCommitter {
    fn default() -> Self {
        Self::new(".")
    }
}

#[async_trait]
impl Committer for GitCommitter {
    async fn commit(&self, paths: &[PathBuf], message: &str) -> Result<(), ApplyError> {
        if paths.is_empty() {
            return Ok(());
        }
        if !self.is_repository().await {
            debug!(
                "Skipping git commit: {} is not a git work tree",
                self.workdir.display()
            );
            return Ok(());
        }

        let mut add_args = vec!["add".to_string()];
        add_args.extend(paths.iter().map(|p| p.display().to_string()));
        let add_args: Vec<&str> = add_args.iter().map(String::as_str).collect();
        run_git(&self.workdir, &add_args).await?;
        run_git(&self.workdir, &["commit", "-m", message]).await?;

        info!("Committed {} file(s): {}", paths.len(), message);
        Ok(())
    }
}

async fn run_git(workdir: &Path, args: &[&str]) -> Result<String, ApplyError> {
    let git_error = |reason: String| ApplyError::Git {
        args: args.join(" "),
        reason,
    };

    let output = Command::new("git")
        .args(args)
        .current_dir(workdir)
        .output()
        .await
        .map_err(|e| git_error(e.to_string()))?;

    if !output.status.success() {
        return Err(git_error(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
#[path = "gitops_tests.rs"]
mod gitops_tests;
