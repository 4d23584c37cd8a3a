//! Package metadata and version derivation.
//!
//! When packaging from a git checkout, the version's last component is
//! replaced with the number of commits reachable from `HEAD`, and the commit
//! hash, branch and push URL of `origin` are recorded alongside it in a JSON
//! file. Outside a checkout the previously written file is used as-is; with
//! no such file the base version is kept and the git fields are left empty.
//!
//! # Example
//!
//! ```rust
//! use explorer_hat::metadata::{derive_version, parse_origin};
//!
//! assert_eq!(derive_version("0.1.1", 42), "0.1.42");
//! assert_eq!(derive_version("0.1.1", 0), "0.1.1");
//!
//! let remotes = "origin\tgit@example.com:pi/explorer-hat.git (fetch)\n\
//!                origin\tgit@example.com:pi/explorer-hat.git (push)\n";
//! assert_eq!(parse_origin(remotes).as_deref(), Some("git@example.com:pi/explorer-hat.git"));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

/// Version used when no base version is given: this crate's own.
pub const DEFAULT_BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default location of the metadata file, relative to the package root.
pub const DEFAULT_METADATA_FILE: &str = "package_metadata.json";

/// Readme files checked for the long description, in order.
pub const README_FILES: [&str; 3] = ["README.rst", "README.md", "README.txt"];

/// Long description used when there is no readme.
pub const DEFAULT_DESCRIPTION: &str =
    "A library to control the Explorer HAT Raspberry Pi add-on board";

/// Errors from metadata generation.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// Reading or writing a file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The metadata file is not valid JSON.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A git command failed.
    #[error("git {command} failed: {message}")]
    Git {
        /// Arguments passed to git.
        command: String,
        /// Trimmed stderr.
        message: String,
    },
}

/// Result alias for metadata operations.
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Record written once at packaging time and read thereafter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Derived version string.
    pub version: String,
    /// Contents of the readme.
    pub long_description: String,
    /// Commit hash of `HEAD`.
    pub git_hash: String,
    /// Push URL of the `origin` remote, if there is one.
    pub git_origin: Option<String>,
    /// Current branch name.
    pub git_branch: String,
}

/// Source of repository information.
pub trait GitInfo {
    /// Number of commits reachable from `HEAD`.
    fn rev_count(&self) -> Result<usize>;

    /// Commit hash of `HEAD`.
    fn hash(&self) -> Result<String>;

    /// Current branch name.
    fn branch(&self) -> Result<String>;

    /// Output of `git remote -v`.
    fn remotes(&self) -> Result<String>;
}

/// [`GitInfo`] backed by the `git` command line tool.
#[derive(Clone, Debug)]
pub struct GitCli {
    dir: PathBuf,
}

impl GitCli {
    /// Run git commands inside `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!(dir = %self.dir.display(), ?args, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .output()?;

        if !output.status.success() {
            return Err(MetadataError::Git {
                command: args.join(" "),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl GitInfo for GitCli {
    fn rev_count(&self) -> Result<usize> {
        Ok(self.run(&["rev-list", "HEAD"])?.lines().count())
    }

    fn hash(&self) -> Result<String> {
        Ok(self.run(&["rev-parse", "HEAD"])?.trim().to_string())
    }

    fn branch(&self) -> Result<String> {
        Ok(self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?.trim().to_string())
    }

    fn remotes(&self) -> Result<String> {
        self.run(&["remote", "-v"])
    }
}

/// [`GitInfo`] that reports failed git commands as "no information".
///
/// Used outside a checkout, where git has nothing to say: no commits, empty
/// hash and branch, and no remotes.
struct Lenient<'a, G>(&'a G);

impl<G: GitInfo> Lenient<'_, G> {
    fn or_empty<T: Default>(result: Result<T>, what: &str) -> T {
        result.unwrap_or_else(|err| {
            tracing::warn!(%err, "no git {what}, leaving it empty");
            T::default()
        })
    }
}

impl<G: GitInfo> GitInfo for Lenient<'_, G> {
    fn rev_count(&self) -> Result<usize> {
        Ok(Self::or_empty(self.0.rev_count(), "revision count"))
    }

    fn hash(&self) -> Result<String> {
        Ok(Self::or_empty(self.0.hash(), "hash"))
    }

    fn branch(&self) -> Result<String> {
        Ok(Self::or_empty(self.0.branch(), "branch"))
    }

    fn remotes(&self) -> Result<String> {
        Ok(Self::or_empty(self.0.remotes(), "remotes"))
    }
}

/// Replace the last dotted component of `base` with `rev_count`.
///
/// A zero count leaves `base` unchanged.
pub fn derive_version(base: &str, rev_count: usize) -> String {
    if rev_count == 0 {
        return base.to_string();
    }
    match base.rsplit_once('.') {
        Some((head, _)) => format!("{head}.{rev_count}"),
        None => rev_count.to_string(),
    }
}

/// URL of the `origin` remote's push entry in `git remote -v` output.
pub fn parse_origin(remotes: &str) -> Option<String> {
    remotes.lines().find_map(|line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            ["origin", url, .., "(push)"] => Some((*url).to_string()),
            _ => None,
        }
    })
}

/// First readme found in `dir`, as `(path, contents)`.
pub fn find_readme(dir: &Path) -> Result<Option<(PathBuf, String)>> {
    for name in README_FILES {
        let path = dir.join(name);
        if path.is_file() {
            let contents = fs::read_to_string(&path)?;
            return Ok(Some((path, contents)));
        }
    }
    Ok(None)
}

/// Build metadata from git and the readme in `root`.
pub fn collect(root: &Path, base_version: &str, git: &impl GitInfo) -> Result<PackageMetadata> {
    let long_description = match find_readme(root)? {
        Some((path, contents)) => {
            tracing::debug!(readme = %path.display(), "using readme as long description");
            contents
        }
        None => DEFAULT_DESCRIPTION.to_string(),
    };

    Ok(PackageMetadata {
        version: derive_version(base_version, git.rev_count()?),
        long_description,
        git_hash: git.hash()?,
        git_origin: parse_origin(&git.remotes()?),
        git_branch: git.branch()?,
    })
}

/// Read a metadata file.
pub fn load(path: &Path) -> Result<PackageMetadata> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Write a metadata file, creating parent directories as needed.
pub fn store(path: &Path, metadata: &PackageMetadata) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(metadata)?)?;
    Ok(())
}

/// Load the cached metadata, or regenerate it from git.
///
/// Outside a git checkout (`root/.git` missing) an existing
/// `metadata_path` is returned unchanged. Otherwise the metadata is
/// collected from git, written to `metadata_path`, and returned. A relative
/// `metadata_path` is taken relative to `root`.
///
/// Outside a checkout with no cached file, failing git commands leave the
/// base version and empty git fields. Inside a checkout they are errors.
pub fn load_or_update(
    root: &Path,
    metadata_path: &Path,
    base_version: &str,
    git: &impl GitInfo,
) -> Result<PackageMetadata> {
    let path = root.join(metadata_path);

    let metadata = if root.join(".git").exists() {
        collect(root, base_version, git)?
    } else if path.is_file() {
        tracing::info!(path = %path.display(), "not a git checkout, using cached metadata");
        return load(&path);
    } else {
        collect(root, base_version, &Lenient(git))?
    };
    store(&path, &metadata)?;
    tracing::info!(version = %metadata.version, path = %path.display(), "package metadata updated");
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_replaces_last_component() {
        assert_eq!(derive_version("0.7.0", 128), "0.7.128");
        assert_eq!(derive_version("1.2", 5), "1.5");
        assert_eq!(derive_version("3", 9), "9");
        assert_eq!(derive_version("0.7.0", 0), "0.7.0");
    }

    #[test]
    fn default_base_version_is_crate_version() {
        assert_eq!(DEFAULT_BASE_VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(derive_version(DEFAULT_BASE_VERSION, 0), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn origin_needs_push_entry() {
        let remotes = "upstream https://example.com/a.git (push)\n\
                       origin https://example.com/b.git (fetch)\n";
        assert_eq!(parse_origin(remotes), None);
        assert_eq!(parse_origin(""), None);
        assert_eq!(parse_origin("\n\n"), None);

        let remotes = "origin https://example.com/b.git (fetch)\n\
                       origin https://example.com/b.git (push)\n";
        assert_eq!(
            parse_origin(remotes).as_deref(),
            Some("https://example.com/b.git")
        );
    }

    #[test]
    fn metadata_json_field_names() {
        let metadata = PackageMetadata {
            version: "0.1.3".into(),
            long_description: "hat".into(),
            git_hash: "abc".into(),
            git_origin: None,
            git_branch: "main".into(),
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["version"], "0.1.3");
        assert_eq!(json["git_origin"], serde_json::Value::Null);
        assert_eq!(json["git_branch"], "main");
    }
}
