#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    TarXz,
    TarBz2,
}

impl ArchiveFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
            Self::TarXz => "tar.xz",
            Self::TarBz2 => "tar.bz2",
        }
    }

    /// Name of the external tool that unpacks this format.
    pub fn extractor(self) -> &'static str {
        match self {
            Self::Zip => "unzip",
            Self::TarGz | Self::TarXz | Self::TarBz2 => "tar",
        }
    }

    /// `tar` decompression flag, `None` for zip.
    pub fn tar_flag(self) -> Option<&'static str> {
        match self {
            Self::Zip => None,
            Self::TarGz => Some("z"),
            Self::TarXz => Some("J"),
            Self::TarBz2 => Some("j"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Deb,
    AppImage,
    Archive(ArchiveFormat),
    Binary,
}

// Checked in order; first match wins.
const SUFFIXES: &[(&str, ArtifactKind)] = &[
    (".deb", ArtifactKind::Deb),
    (".appimage", ArtifactKind::AppImage),
    (".zip", ArtifactKind::Archive(ArchiveFormat::Zip)),
    (".tar.gz", ArtifactKind::Archive(ArchiveFormat::TarGz)),
    (".tgz", ArtifactKind::Archive(ArchiveFormat::TarGz)),
    (".tar.xz", ArtifactKind::Archive(ArchiveFormat::TarXz)),
    (".txz", ArtifactKind::Archive(ArchiveFormat::TarXz)),
    (".tar.bz2", ArtifactKind::Archive(ArchiveFormat::TarBz2)),
];

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deb => "deb",
            Self::AppImage => "appimage",
            Self::Archive(ArchiveFormat::Zip) => "zip",
            Self::Archive(_) => "tar",
            Self::Binary => "generic-binary",
        }
    }

    /// Classifies a file name by suffix, ignoring case. Unknown suffixes are
    /// generic binaries.
    pub fn classify(file_name: &str) -> Self {
        Self::matched_suffix(file_name)
            .map(|(_, kind)| kind)
            .unwrap_or(Self::Binary)
    }

    /// File name with the recognized suffix removed. Generic binaries keep
    /// their full name.
    pub fn base_name(file_name: &str) -> &str {
        match Self::matched_suffix(file_name) {
            Some((suffix_len, _)) if suffix_len < file_name.len() => {
                &file_name[..file_name.len() - suffix_len]
            }
            _ => file_name,
        }
    }

    fn matched_suffix(file_name: &str) -> Option<(usize, Self)> {
        let lower = file_name.to_ascii_lowercase();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| lower.ends_with(suffix))
            .map(|(suffix, kind)| (suffix.len(), *kind))
    }
}
