//! Binary locator
//!
//! Resolves where the three analysis tools live under the module root. The
//! resolution itself does no I/O; [`ToolSet::probe`] is the only check that
//! touches the filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::DispatcherConfig;
use crate::types::ToolKind;

/// Project whose tools the dispatcher drives; fixed for the dispatcher's life
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRoot(PathBuf);

impl ModuleRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Pick the root from what the host reports: the worktree when it has
    /// one, otherwise the session directory
    pub fn from_host(worktree: Option<&str>, directory: &str) -> Self {
        match worktree.filter(|w| !w.is_empty()) {
            Some(worktree) => Self::new(worktree),
            None => Self::new(directory),
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// `Cargo.toml` at the root, used by the build guard
    pub fn manifest_path(&self) -> PathBuf {
        self.0.join("Cargo.toml")
    }
}

impl fmt::Display for ModuleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for ModuleRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Resolved executable paths for the three tools
///
/// All three share one parent directory, so they are present or absent
/// together from the guard's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSet {
    bin_dir: PathBuf,
    digest: PathBuf,
    hard_check: PathBuf,
    soft_check: PathBuf,
}

impl ToolSet {
    /// Compute tool paths as `<root>/<bin_dir>/<name>`
    pub fn resolve(root: &ModuleRoot, config: &DispatcherConfig) -> Self {
        let bin_dir = root.as_path().join(&config.bin_dir);
        Self {
            digest: bin_dir.join(&config.digest_tool),
            hard_check: bin_dir.join(&config.hard_check_tool),
            soft_check: bin_dir.join(&config.soft_check_tool),
            bin_dir,
        }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn path(&self, kind: ToolKind) -> &Path {
        match kind {
            ToolKind::Digest => &self.digest,
            ToolKind::HardCheck => &self.hard_check,
            ToolKind::SoftCheck => &self.soft_check,
        }
    }

    /// `(kind, path)` pairs in digest, hard, soft order
    pub fn iter(&self) -> impl Iterator<Item = (ToolKind, &Path)> {
        ToolKind::ALL.into_iter().map(move |kind| (kind, self.path(kind)))
    }

    /// True only when every tool exists as an executable file
    pub fn probe(&self) -> bool {
        for (kind, path) in self.iter() {
            if !is_executable(path) {
                debug!(tool = %kind, path = %path.display(), "Tool missing or not executable");
                return false;
            }
        }
        true
    }
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}
