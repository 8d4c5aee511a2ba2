// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! `InRelease` file primitives.

The release descriptor is the top-level metadata stanza of a suite. It
names the suite's components and architectures and carries hash manifests
for every index file beneath `dists/<suite>/`. The published form is
clear-signed (see [crate::pgp]).
*/

use {
    crate::{
        control::{ControlParagraph, ControlParagraphReader},
        digest::ChecksumType,
        error::{FaptlyError, Result},
        pgp::CleartextDocument,
    },
    chrono::{DateTime, TimeZone, Utc},
    mailparse::dateparse,
    std::fmt,
};

/// Formatter string for dates in release files (RFC 1123, UTC).
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S UTC";

/// A Debian machine architecture.
///
/// The OS and ABI are fixed for this repository flavor; only the CPU
/// varies. The pseudo-CPU `all` denotes architecture-independent packages.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Arch {
    pub os: String,
    pub abi: String,
    pub cpu: String,
}

impl Arch {
    pub fn new(cpu: impl ToString) -> Self {
        Self {
            os: "linux".to_string(),
            abi: "gnu".to_string(),
            cpu: cpu.to_string(),
        }
    }

    /// Whether this is the architecture-independent pseudo-value.
    pub fn is_all(&self) -> bool {
        self.cpu == "all"
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cpu)
    }
}

/// One row of a release hash manifest: `<hex> <size> <path>`.
///
/// Paths are relative to `dists/<suite>/`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileHashEntry {
    pub digest: String,
    pub size: u64,
    pub path: String,
}

impl FileHashEntry {
    fn parse(row: &str) -> Result<Self> {
        let mut parts = row.split_ascii_whitespace();

        let digest = parts.next().ok_or(FaptlyError::ReleaseMissingDigest)?;
        let size = parts.next().ok_or(FaptlyError::ReleaseMissingSize)?;
        let path = parts.next().ok_or(FaptlyError::ReleaseMissingPath)?;

        Ok(Self {
            digest: digest.to_string(),
            size: size.parse::<u64>()?,
            path: path.to_string(),
        })
    }

    /// The `by-hash` path variant for this entry.
    ///
    /// Mirrors the digest into an addressable path next to the canonical
    /// one, e.g. `main/binary-amd64/by-hash/SHA256/<hex>`.
    pub fn by_hash_path(&self, checksum: ChecksumType) -> String {
        if let Some((prefix, _)) = self.path.rsplit_once('/') {
            format!("{}/by-hash/{}/{}", prefix, checksum.field_name(), self.digest)
        } else {
            format!("by-hash/{}/{}", checksum.field_name(), self.digest)
        }
    }
}

impl fmt::Display for FileHashEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.digest, self.size, self.path)
    }
}

/// A suite's release descriptor.
#[derive(Clone, Debug, Default)]
pub struct Release {
    pub origin: String,
    pub suite: String,
    pub label: String,
    pub codename: String,
    pub description: String,
    pub components: Vec<String>,
    pub architectures: Vec<Arch>,
    pub date: Option<DateTime<Utc>>,
    pub md5: Vec<FileHashEntry>,
    pub sha1: Vec<FileHashEntry>,
    pub sha256: Vec<FileHashEntry>,
}

impl Release {
    /// Whether the named component is declared by this release.
    pub fn has_component(&self, component: &str) -> bool {
        self.components.iter().any(|c| c == component)
    }

    /// Whether the given CPU belongs to a declared architecture.
    pub fn has_architecture(&self, cpu: &str) -> bool {
        self.architectures.iter().any(|a| a.cpu == cpu)
    }

    /// The manifest rows for a checksum flavor.
    pub fn manifest(&self, checksum: ChecksumType) -> &[FileHashEntry] {
        match checksum {
            ChecksumType::Md5 => &self.md5,
            ChecksumType::Sha1 => &self.sha1,
            ChecksumType::Sha256 => &self.sha256,
        }
    }

    /// Drop all manifest rows, ahead of a rebuild.
    pub fn clear_manifests(&mut self) {
        self.md5.clear();
        self.sha1.clear();
        self.sha256.clear();
    }

    /// Append a manifest row for a checksum flavor.
    pub fn push_manifest_entry(&mut self, checksum: ChecksumType, entry: FileHashEntry) {
        match checksum {
            ChecksumType::Md5 => self.md5.push(entry),
            ChecksumType::Sha1 => self.sha1.push(entry),
            ChecksumType::Sha256 => self.sha256.push(entry),
        }
    }

    /// Parse a release from a clear-signed `InRelease` document.
    ///
    /// The signature is not validated here; callers holding the public key
    /// can verify through [CleartextDocument] directly.
    pub fn from_armored(data: &[u8]) -> Result<Self> {
        let document = CleartextDocument::parse(std::io::Cursor::new(data))?;

        let paragraphs = ControlParagraphReader::new(document.cleartext().as_bytes())
            .collect::<Result<Vec<_>>>()?;

        if paragraphs.len() != 1 {
            return Err(FaptlyError::ReleaseParagraphMismatch(paragraphs.len()));
        }

        Self::from_paragraph(&paragraphs[0])
    }

    /// Construct from a parsed control paragraph.
    pub fn from_paragraph(paragraph: &ControlParagraph) -> Result<Self> {
        let field = |name: &str| paragraph.field_str(name).unwrap_or_default().to_string();

        let components = paragraph
            .field_words("Components")
            .map(|words| words.map(|w| w.to_string()).collect())
            .unwrap_or_default();

        let architectures = paragraph
            .field_words("Architectures")
            .map(|words| words.map(Arch::new).collect())
            .unwrap_or_default();

        // Dates must parse when present.
        let date = match paragraph.field_str("Date") {
            Some(value) => Some(Utc.timestamp(dateparse(value)?, 0)),
            None => None,
        };

        let mut release = Self {
            origin: field("Origin"),
            suite: field("Suite"),
            label: field("Label"),
            codename: field("Codename"),
            description: field("Description"),
            components,
            architectures,
            date,
            ..Self::default()
        };

        for checksum in ChecksumType::all() {
            if let Some(rows) = paragraph.field_lines(checksum.field_name()) {
                for row in rows {
                    let entry = FileHashEntry::parse(row)?;
                    release.push_manifest_entry(checksum, entry);
                }
            }
        }

        Ok(release)
    }

    /// Render the descriptor as a control paragraph.
    pub fn to_paragraph(&self) -> ControlParagraph {
        let mut paragraph = ControlParagraph::default();

        paragraph.set_field_from_string("Origin", self.origin.clone());
        paragraph.set_field_from_string("Suite", self.suite.clone());
        paragraph.set_field_from_string("Label", self.label.clone());
        paragraph.set_field_from_string("Codename", self.codename.clone());
        paragraph.set_field_from_string("Description", self.description.clone());
        paragraph.set_field_from_string("Components", self.components.join(" "));
        paragraph.set_field_from_string(
            "Architectures",
            self.architectures
                .iter()
                .map(|a| a.cpu.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        );

        if let Some(date) = &self.date {
            paragraph.set_field_from_string("Date", date.format(DATE_FORMAT).to_string());
        }

        for checksum in ChecksumType::all() {
            let manifest = self.manifest(checksum);
            if !manifest.is_empty() {
                paragraph.set_multiline_field(
                    checksum.field_name(),
                    manifest.iter().map(|e| e.to_string()),
                );
            }
        }

        paragraph
    }
}
