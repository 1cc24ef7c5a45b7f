//! On-disk area holding the files stages write.

use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use tforge_models::{ArtifactKind, MediaArtifact};

/// Directory tree with one subdirectory per artifact kind.
#[derive(Debug, Clone)]
pub struct ArtifactArea {
    root: PathBuf,
}

impl ArtifactArea {
    /// Create the area, making `root` and its subdirectories if missing.
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        for kind in ArtifactKind::ALL {
            std::fs::create_dir_all(root.join(kind.dir_name()))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fresh, unique path for an artifact of `kind`. Nothing is written.
    pub fn allocate(&self, kind: ArtifactKind) -> MediaArtifact {
        let file = format!("{}_{}.{}", kind.file_prefix(), Uuid::new_v4(), kind.extension());
        MediaArtifact::new(kind, self.root.join(kind.dir_name()).join(file))
    }

    /// Write `bytes` to a freshly allocated path.
    pub async fn write(&self, kind: ArtifactKind, bytes: &[u8]) -> std::io::Result<MediaArtifact> {
        let artifact = self.allocate(kind);
        tokio::fs::write(artifact.path(), bytes).await?;
        debug!(kind = kind.as_str(), path = %artifact.display(), bytes = bytes.len(), "Artifact written");
        Ok(artifact)
    }
}
