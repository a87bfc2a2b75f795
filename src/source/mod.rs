//! Release target sources: raw path lists and their resolution to `.zen` files.
//!
//! Resolution never changes the process working directory; relative inputs
//! are joined onto the workspace root explicitly.

use crate::error::{ConfigError, ResolveError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of board definition files
pub const TARGET_EXTENSION: &str = "zen";

/// File written to the workspace root recording the normalized path list
pub const PATH_LIST_FILE: &str = ".pcb-release-paths";

/// Split a raw comma/newline separated input into trimmed, non-empty paths.
///
/// Literal two-character escapes (`\n`, `\r`, `\t`) are expanded before
/// splitting, since CI inputs often arrive with newlines written that way.
/// Order is preserved and repeats are kept.
pub fn normalize_paths(raw: Option<&str>, input: &str) -> Result<Vec<String>, ConfigError> {
    let raw = raw.ok_or_else(|| ConfigError::MissingInput {
        input: input.to_string(),
    })?;

    let expanded = raw
        .replace("\\r", "\r")
        .replace("\\n", "\n")
        .replace("\\t", "\t");

    let paths: Vec<String> = expanded
        .split([',', '\n', '\r'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if paths.is_empty() {
        return Err(ConfigError::EmptyInput {
            input: input.to_string(),
        });
    }

    Ok(paths)
}

/// Record the normalized path list in the workspace root, one path per line.
pub fn write_path_list(workspace: &Path, paths: &[String]) -> std::io::Result<PathBuf> {
    let file = workspace.join(PATH_LIST_FILE);
    let mut contents = paths.join("\n");
    contents.push('\n');
    std::fs::write(&file, contents)?;
    Ok(file)
}

/// A resolved release input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Raw input this target was resolved from
    pub input: String,
    /// Path to the `.zen` file
    pub path: PathBuf,
}

impl Target {
    /// Resolve one normalized input against the workspace root.
    ///
    /// Directories must contain exactly one `.zen` file (non-recursive).
    /// Files are taken as-is.
    pub fn resolve(input: &str, workspace: &Path) -> Result<Self, ResolveError> {
        let raw = PathBuf::from(input);
        let location = if raw.is_absolute() {
            raw
        } else {
            workspace.join(raw)
        };

        if location.is_dir() {
            let candidates = zen_files_in(&location);
            return match candidates.as_slice() {
                [single] => Ok(Self {
                    input: input.to_string(),
                    path: single.clone(),
                }),
                _ => Err(ResolveError::Ambiguous {
                    dir: location,
                    candidates,
                }),
            };
        }

        if location.is_file() {
            if !has_target_extension(&location) {
                log::warn!(
                    "{} does not have a .{} extension, releasing it anyway",
                    location.display(),
                    TARGET_EXTENSION
                );
            }
            return Ok(Self {
                input: input.to_string(),
                path: location,
            });
        }

        Err(ResolveError::NotFound {
            input: input.to_string(),
            path: location,
        })
    }

    /// File stem used to name collected artifacts
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input.clone())
    }
}

fn has_target_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TARGET_EXTENSION))
}

fn zen_files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_target_extension(path))
        .collect();
    files.sort();
    files
}
