// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Content digesting.

Repository metadata carries md5, sha1, and sha256 digests for every
indexed file. [MultiDigester] computes all three in a single pass.
*/

use {
    digest::Digest,
    md5::Md5,
    sha1::Sha1,
    sha2::Sha256,
    std::io::Read,
};

/// Checksum flavors used in repository metadata.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ChecksumType {
    Md5,
    Sha1,
    Sha256,
}

impl ChecksumType {
    /// Emit variants in the order release files list them.
    pub fn all() -> impl Iterator<Item = ChecksumType> {
        [Self::Md5, Self::Sha1, Self::Sha256].into_iter()
    }

    /// Name of the `Release` field holding this variant's manifest.
    ///
    /// Also the directory name for `by-hash` paths.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5Sum",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
        }
    }

    /// Name of the `Packages` stanza field holding this digest for a .deb.
    pub fn index_field_name(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5sum",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
        }
    }
}

/// Lowercase hex digests of one byte stream, all flavors at once.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MultiDigest {
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
}

impl MultiDigest {
    /// Obtain the hex digest for a given [ChecksumType].
    pub fn hex(&self, checksum: ChecksumType) -> &str {
        match checksum {
            ChecksumType::Md5 => &self.md5,
            ChecksumType::Sha1 => &self.sha1,
            ChecksumType::Sha256 => &self.sha256,
        }
    }
}

/// A digester that simultaneously computes md5, sha1, and sha256.
pub struct MultiDigester {
    md5: Md5,
    sha1: Sha1,
    sha256: Sha256,
}

impl Default for MultiDigester {
    fn default() -> Self {
        Self {
            md5: Md5::new(),
            sha1: Sha1::new(),
            sha256: Sha256::new(),
        }
    }
}

impl MultiDigester {
    /// Write content into the digesters.
    pub fn update(&mut self, data: &[u8]) {
        self.md5.update(data);
        self.sha1.update(data);
        self.sha256.update(data);
    }

    /// Finish digesting, consuming the instance.
    pub fn finish(self) -> MultiDigest {
        MultiDigest {
            md5: hex::encode(self.md5.finalize()),
            sha1: hex::encode(self.sha1.finalize()),
            sha256: hex::encode(self.sha256.finalize()),
        }
    }
}

/// Digest a reader to completion, returning its size and digests.
///
/// Content is streamed through the hashers in fixed-size chunks; nothing
/// beyond the chunk buffer is retained.
pub fn digest_reader<R: Read>(reader: &mut R) -> std::io::Result<(u64, MultiDigest)> {
    let mut digester = MultiDigester::default();
    let mut buffer = [0u8; 32768];
    let mut size = 0u64;

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }

        digester.update(&buffer[0..read]);
        size += read as u64;
    }

    Ok((size, digester.finish()))
}

/// Digest an in-memory buffer.
pub fn digest_data(data: &[u8]) -> MultiDigest {
    let mut digester = MultiDigester::default();
    digester.update(data);
    digester.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        let digests = digest_data(b"hello world");

        assert_eq!(digests.md5, "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert_eq!(digests.sha1, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
        assert_eq!(
            digests.sha256,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn empty_input() {
        let digests = digest_data(b"");

        assert_eq!(digests.md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            digests.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn reader_matches_buffer_and_reports_size() -> std::io::Result<()> {
        let data = vec![0xabu8; 100_000];

        let (size, streamed) = digest_reader(&mut std::io::Cursor::new(&data))?;
        assert_eq!(size, data.len() as u64);
        assert_eq!(streamed, digest_data(&data));

        Ok(())
    }

    #[test]
    fn checksum_field_names() {
        assert_eq!(ChecksumType::Md5.field_name(), "MD5Sum");
        assert_eq!(ChecksumType::Md5.index_field_name(), "MD5sum");
        assert_eq!(ChecksumType::Sha256.field_name(), "SHA256");
        assert_eq!(ChecksumType::all().count(), 3);
    }
}
