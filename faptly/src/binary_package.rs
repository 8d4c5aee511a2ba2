// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Binary package index stanzas and `Packages` files. */

use {
    crate::{
        control::{ControlParagraph, ControlParagraphReader},
        error::{FaptlyError, Result},
    },
    std::ops::{Deref, DerefMut},
};

/// A binary package stanza, as seen in a `.deb` control file or a
/// `Packages` index.
///
/// This is a thin wrapper around a [ControlParagraph]: unknown fields
/// round-trip verbatim, and [Deref]/[DerefMut] expose the paragraph API.
/// `Package`, `Version`, and `Architecture` are mandatory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BinaryPackage {
    paragraph: ControlParagraph,
}

impl Deref for BinaryPackage {
    type Target = ControlParagraph;

    fn deref(&self) -> &Self::Target {
        &self.paragraph
    }
}

impl DerefMut for BinaryPackage {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.paragraph
    }
}

impl From<ControlParagraph> for BinaryPackage {
    fn from(paragraph: ControlParagraph) -> Self {
        Self { paragraph }
    }
}

impl std::fmt::Display for BinaryPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.paragraph.fmt(f)
    }
}

impl BinaryPackage {
    /// Parse a stanza from raw control file bytes.
    ///
    /// The input must contain exactly one paragraph carrying the mandatory
    /// fields.
    pub fn from_control_data(data: &[u8]) -> Result<Self> {
        let mut paragraphs =
            ControlParagraphReader::new(data).collect::<Result<Vec<_>>>()?;

        if paragraphs.len() != 1 {
            return Err(FaptlyError::ControlParse(format!(
                "expected 1 control paragraph; got {}",
                paragraphs.len()
            )));
        }

        let package = Self {
            paragraph: paragraphs.remove(0),
        };

        for name in ["Package", "Version", "Architecture"] {
            if package.required_field(name)?.is_empty() {
                return Err(FaptlyError::ControlParse(format!(
                    "required field {} is empty",
                    name
                )));
            }
        }

        Ok(package)
    }

    fn required_field(&self, name: &str) -> Result<&str> {
        self.paragraph.field_str(name).ok_or_else(|| {
            FaptlyError::ControlParse(format!("required field missing: {}", name))
        })
    }

    /// The `Package` field value.
    pub fn package(&self) -> Result<&str> {
        self.required_field("Package")
    }

    /// The `Version` field value.
    pub fn version(&self) -> Result<&str> {
        self.required_field("Version")
    }

    /// The `Architecture` field value (a CPU name, or `all`).
    pub fn architecture(&self) -> Result<&str> {
        self.required_field("Architecture")
    }

    /// The `Source` field, if present.
    pub fn source(&self) -> Option<&str> {
        self.paragraph.field_str("Source")
    }

    /// The `Filename` field: the pool path of the `.deb`.
    pub fn filename(&self) -> Option<&str> {
        self.paragraph.field_str("Filename")
    }

    /// The final path component of `Filename`.
    pub fn basename(&self) -> Option<&str> {
        self.filename().map(|f| match f.rsplit_once('/') {
            Some((_, basename)) => basename,
            None => f,
        })
    }

    /// The `Size` field parsed as bytes.
    pub fn size(&self) -> Option<Result<u64>> {
        self.paragraph.field_u64("Size")
    }
}

/// An ordered `Packages` index: binary package stanzas separated by blank
/// lines, one file per (suite, component, cpu).
#[derive(Clone, Debug, Default)]
pub struct PackagesIndex {
    packages: Vec<BinaryPackage>,
}

impl PackagesIndex {
    /// Parse an index from `Packages` file bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let packages = ControlParagraphReader::new(data)
            .map(|p| p.map(BinaryPackage::from))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { packages })
    }

    /// Serialize the index, one blank line after each stanza.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![];

        for package in &self.packages {
            package.write(&mut buf)?;
            buf.push(b'\n');
        }

        Ok(buf)
    }

    /// Number of stanzas in the index.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Iterate over stanzas in index order.
    pub fn iter(&self) -> impl Iterator<Item = &BinaryPackage> {
        self.packages.iter()
    }

    /// Consume the index, returning its stanzas.
    pub fn into_packages(self) -> Vec<BinaryPackage> {
        self.packages
    }

    /// Find the stanza whose pool basename matches.
    pub fn find_basename(&self, basename: &str) -> Option<&BinaryPackage> {
        self.packages
            .iter()
            .find(|p| p.basename() == Some(basename))
    }

    /// Add a stanza, replacing any prior entry with the same pool basename.
    ///
    /// Re-uploading a package never duplicates its entry.
    pub fn replace(&mut self, package: BinaryPackage) {
        if let Some(basename) = package.basename().map(|b| b.to_string()) {
            self.packages
                .retain(|p| p.basename() != Some(basename.as_str()));
        }

        self.packages.push(package);
    }
}
