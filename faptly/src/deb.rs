// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! .deb file reading.

A .deb binary package is an ar archive with 3 members:

1. `debian-binary` holding the version of the binary package format.
2. `control.tar[.<ext>]` holding package metadata.
3. `data.tar[.<ext>]` holding file content.

Only the control metadata is of interest here.
*/

use {
    crate::error::{FaptlyError, Result},
    std::io::{Cursor, Read},
};

fn decompressor(extension: &str, data: Cursor<Vec<u8>>) -> Result<Box<dyn Read>> {
    match extension {
        "" => Ok(Box::new(data)),
        ".gz" => Ok(Box::new(libflate::gzip::Decoder::new(data)?)),
        ".xz" => Ok(Box::new(xz2::read::XzDecoder::new(data))),
        ".bz2" => Ok(Box::new(bzip2::read::BzDecoder::new(data))),
        ".zst" => Ok(Box::new(zstd::Decoder::new(data)?)),
        _ => Err(FaptlyError::UnknownCompression(extension.to_string())),
    }
}

/// Locate the `control` file within a `.deb` archive and return its bytes.
///
/// Walks the outer ar archive for a member named `control.tar*`, selects a
/// decompressor from the member's extension, then walks the inner tar
/// archive for an entry whose name ends in `control`.
pub fn extract_control(data: &[u8]) -> Result<Vec<u8>> {
    let mut archive = ar::Archive::new(Cursor::new(data));

    while let Some(entry) = archive.next_entry() {
        let mut entry = entry.map_err(|e| FaptlyError::NotDebArchive(e.to_string()))?;

        // Member names should be ASCII; some ar writers append a `/`.
        let name = String::from_utf8_lossy(entry.header().identifier())
            .trim_end_matches('/')
            .to_string();

        let extension = match name.strip_prefix("control.tar") {
            Some(extension) => extension.to_string(),
            None => continue,
        };

        let mut member = Vec::with_capacity(entry.header().size() as usize);
        entry
            .read_to_end(&mut member)
            .map_err(|e| FaptlyError::NotDebArchive(e.to_string()))?;

        let reader = decompressor(&extension, Cursor::new(member))?;
        let mut control_tar = tar::Archive::new(reader);

        for tar_entry in control_tar.entries()? {
            let mut tar_entry = tar_entry?;

            if tar_entry.path()?.to_string_lossy().ends_with("control") {
                let mut control = vec![];
                tar_entry.read_to_end(&mut control)?;
                return Ok(control);
            }
        }

        return Err(FaptlyError::ControlFileMissing);
    }

    Err(FaptlyError::ControlFileMissing)
}
