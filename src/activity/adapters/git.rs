//! Repository URL lookup through `git remote`.

use crate::activity::ports::{ProjectReferenceResolver, ReferenceError, ReferenceResult};
use crate::project::ProjectPath;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

// `git` exits with 2 for an unknown remote and 128 outside a repository.
const NO_REMOTE_EXIT_CODES: [i32; 2] = [2, 128];

/// Resolves a project's `origin` remote as a browsable https URL.
#[derive(Debug, Clone)]
pub struct GitRemoteResolver {
    program: String,
    remote: String,
}

impl Default for GitRemoteResolver {
    fn default() -> Self {
        Self {
            program: "git".to_owned(),
            remote: "origin".to_owned(),
        }
    }
}

impl GitRemoteResolver {
    /// Creates a resolver for the `origin` remote using `git` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `remote` instead of `origin`.
    #[must_use]
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }
}

#[async_trait]
impl ProjectReferenceResolver for GitRemoteResolver {
    async fn resolve(&self, project: &ProjectPath) -> ReferenceResult<Option<String>> {
        let output = Command::new(&self.program)
            .arg("-C")
            .arg(project.as_str())
            .args(["remote", "get-url", &self.remote])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return match output.status.code() {
                Some(code) if NO_REMOTE_EXIT_CODES.contains(&code) => Ok(None),
                _ => Err(ReferenceError::Lookup(
                    String::from_utf8_lossy(&output.stderr).trim().to_owned(),
                )),
            };
        }
        let url = String::from_utf8_lossy(&output.stdout);
        Ok(normalize_remote_url(url.trim()))
    }
}

/// Rewrites a git remote URL into an https URL without the `.git` suffix.
///
/// Returns `None` for empty input or local paths.
///
/// ```
/// use gantry::activity::adapters::normalize_remote_url;
///
/// assert_eq!(
///     normalize_remote_url("git@github.com:acme/app.git").as_deref(),
///     Some("https://github.com/acme/app"),
/// );
/// ```
#[must_use]
pub fn normalize_remote_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let without_suffix = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let location = host_and_path(without_suffix)?;
    let cleaned = location.trim_end_matches('/');
    if cleaned.is_empty() {
        None
    } else {
        Some(format!("https://{cleaned}"))
    }
}

fn host_and_path(url: &str) -> Option<String> {
    for scheme in ["ssh://", "https://", "http://"] {
        if let Some(rest) = url.strip_prefix(scheme) {
            return Some(strip_userinfo(rest).to_owned());
        }
    }
    // scp-like syntax: `user@host:path`
    let (user_host, path) = url.split_once(':')?;
    let host = strip_userinfo(user_host);
    if host.is_empty() || host.contains('/') {
        return None;
    }
    Some(format!("{host}/{path}"))
}

fn strip_userinfo(location: &str) -> &str {
    location.split_once('@').map_or(location, |(_, host)| host)
}
