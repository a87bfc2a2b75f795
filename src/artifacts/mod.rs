//! Collection of release archives into the shared artifacts directory.

use crate::error::ArtifactError;
use crate::source::Target;
use crate::tool::ReleasePayload;
use std::path::{Path, PathBuf};

/// Multi-part archive extensions kept whole when renaming
const COMPOUND_EXTENSIONS: &[&str] = &[".tar.gz", ".tar.zst", ".tar.xz", ".tar.bz2"];

/// An archive copied into the artifacts directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedArtifact {
    /// Raw input the target came from
    pub input: String,
    /// Version reported by the tool
    pub version: String,
    /// Archive produced by the tool (left in place)
    pub source: PathBuf,
    /// Copy in the artifacts directory
    pub destination: PathBuf,
}

/// Copies archives into one output directory under deterministic names
#[derive(Debug, Clone)]
pub struct ArtifactCollector {
    output_dir: PathBuf,
}

impl ArtifactCollector {
    /// Create a collector writing to `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Make sure the archive the tool reported actually exists.
    ///
    /// Relative archive paths are anchored at `base`.
    pub fn verify_archive(payload: &ReleasePayload, base: &Path) -> Result<PathBuf, ArtifactError> {
        let archive = payload
            .archive_path(base)
            .ok_or_else(|| ArtifactError::Missing {
                archive: PathBuf::new(),
            })?;

        if !archive.is_file() {
            return Err(ArtifactError::Missing { archive });
        }

        Ok(archive)
    }

    /// Copy the reported archive to `<stem>-<version><ext>` in the output directory.
    pub fn collect(
        &self,
        target: &Target,
        payload: &ReleasePayload,
        base: &Path,
    ) -> Result<CollectedArtifact, ArtifactError> {
        let source = Self::verify_archive(payload, base)?;
        let destination = self
            .output_dir
            .join(destination_name(&target.stem(), &payload.version, &source));

        std::fs::create_dir_all(&self.output_dir).map_err(|e| ArtifactError::CopyFailed {
            from: source.clone(),
            to: destination.clone(),
            source: e,
        })?;

        if destination != source {
            std::fs::copy(&source, &destination).map_err(|e| ArtifactError::CopyFailed {
                from: source.clone(),
                to: destination.clone(),
                source: e,
            })?;
        }

        log::info!("Collected {} -> {}", source.display(), destination.display());

        Ok(CollectedArtifact {
            input: target.input.clone(),
            version: payload.version.clone(),
            source,
            destination,
        })
    }
}

/// Destination file name: `<stem>-<version><ext>`, or `<stem><ext>` without a version.
pub fn destination_name(stem: &str, version: &str, archive: &Path) -> String {
    let ext = archive_extension(archive);
    let version = version.trim();
    if version.is_empty() {
        format!("{stem}{ext}")
    } else {
        format!("{stem}-{version}{ext}")
    }
}

/// Archive extension including the leading dot, compound forms kept whole.
fn archive_extension(archive: &Path) -> String {
    let Some(name) = archive.file_name().map(|n| n.to_string_lossy().to_lowercase()) else {
        return String::new();
    };

    if let Some(compound) = COMPOUND_EXTENSIONS.iter().find(|ext| name.ends_with(*ext)) {
        return compound.to_string();
    }

    archive
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn target(path: &Path) -> Target {
        Target {
            input: "boards/Widget".to_string(),
            path: path.to_path_buf(),
        }
    }

    #[test]
    fn destination_name_keeps_compound_extensions() {
        assert_eq!(
            destination_name("Widget", "v1", Path::new("/tmp/Widget-0.3.1.tar.zst")),
            "Widget-v1.tar.zst"
        );
        assert_eq!(
            destination_name("Widget", "v1", Path::new("/tmp/out.zip")),
            "Widget-v1.zip"
        );
        assert_eq!(destination_name("Widget", "", Path::new("out.zip")), "Widget.zip");
        assert_eq!(destination_name("Widget", "v2", Path::new("archive")), "Widget-v2");
    }

    #[test]
    fn collect_copies_byte_identical_and_keeps_source() {
        let ws = TempDir::new().unwrap();
        let archive = ws.path().join("build/release.zip");
        std::fs::create_dir_all(archive.parent().unwrap()).unwrap();
        std::fs::write(&archive, b"PK\x03\x04 archive bytes").unwrap();

        let collector = ArtifactCollector::new(ws.path().join("artifacts"));
        let payload = ReleasePayload {
            archive: "build/release.zip".to_string(),
            version: "v1".to_string(),
        };
        let collected = collector
            .collect(&target(&ws.path().join("boards/Widget/Widget.zen")), &payload, ws.path())
            .unwrap();

        assert_eq!(collected.destination, ws.path().join("artifacts/Widget-v1.zip"));
        assert_eq!(
            std::fs::read(&collected.destination).unwrap(),
            std::fs::read(&archive).unwrap()
        );
        assert!(archive.exists());
        assert_eq!(collected.input, "boards/Widget");
    }

    #[test]
    fn collect_rejects_missing_archive() {
        let ws = TempDir::new().unwrap();
        let collector = ArtifactCollector::new(ws.path().join("artifacts"));
        let zen = ws.path().join("Widget.zen");

        let payload = ReleasePayload {
            archive: ws.path().join("gone.zip").to_string_lossy().into_owned(),
            version: "v1".to_string(),
        };
        assert!(matches!(
            collector.collect(&target(&zen), &payload, ws.path()),
            Err(ArtifactError::Missing { .. })
        ));

        let empty = ReleasePayload::default();
        assert!(matches!(
            collector.collect(&target(&zen), &empty, ws.path()),
            Err(ArtifactError::Missing { .. })
        ));
        assert!(!ws.path().join("artifacts").exists());
    }
}
