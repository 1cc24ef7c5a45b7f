//! File artifacts produced by pipeline stages.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of file a stage writes into the content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Thumbnail,
    Background,
    Audio,
    Video,
    Metadata,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Thumbnail,
        ArtifactKind::Background,
        ArtifactKind::Audio,
        ArtifactKind::Video,
        ArtifactKind::Metadata,
    ];

    /// Subdirectory of the content area.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactKind::Thumbnail => "thumbnails",
            ArtifactKind::Background => "backgrounds",
            ArtifactKind::Audio => "audio",
            ArtifactKind::Video => "videos",
            ArtifactKind::Metadata => "metadata",
        }
    }

    /// Filename prefix.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Thumbnail => "thumbnail",
            ArtifactKind::Background => "background",
            ArtifactKind::Audio => "voiceover",
            ArtifactKind::Video => "video",
            ArtifactKind::Metadata => "metadata",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Thumbnail | ArtifactKind::Background => "png",
            ArtifactKind::Audio => "mp3",
            ArtifactKind::Video => "mp4",
            ArtifactKind::Metadata => "json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Thumbnail => "thumbnail",
            ArtifactKind::Background => "background",
            ArtifactKind::Audio => "audio",
            ArtifactKind::Video => "video",
            ArtifactKind::Metadata => "metadata",
        }
    }
}

/// Reference to a file written by a stage. Downstream stages only read the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MediaArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

impl MediaArtifact {
    pub fn new(kind: ArtifactKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn display(&self) -> std::path::Display<'_> {
        self.path.display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_layout() {
        assert_eq!(ArtifactKind::Audio.dir_name(), "audio");
        assert_eq!(ArtifactKind::Audio.file_prefix(), "voiceover");
        assert_eq!(ArtifactKind::Audio.extension(), "mp3");
        assert_eq!(ArtifactKind::Video.dir_name(), "videos");
        assert_eq!(ArtifactKind::Thumbnail.extension(), "png");
    }
}
