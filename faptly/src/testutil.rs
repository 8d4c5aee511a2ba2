// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Test fixtures: in-memory `.deb` construction and a cached signing key. */

use {
    crate::pgp::{generate_signing_key, Signer},
    once_cell::sync::Lazy,
    pgp::SignedPublicKey,
    std::io::Write,
};

/// Control tar member extensions the extractor must accept.
pub(crate) const CONTROL_COMPRESSIONS: &[&str] = &["", ".gz", ".xz", ".bz2", ".zst"];

static KEYPAIR: Lazy<(Signer, SignedPublicKey)> = Lazy::new(|| {
    let (secret, public) = generate_signing_key("Faptly Test <faptly@example.com>", "")
        .expect("key generation should succeed");
    let signer = Signer::new(secret, "").expect("passphrase-less key should unlock");

    (signer, public)
});

/// A cached passphrase-less signer and its public key.
///
/// RSA generation is slow, so the whole suite shares one key.
pub(crate) fn test_signer() -> (&'static Signer, &'static SignedPublicKey) {
    (&KEYPAIR.0, &KEYPAIR.1)
}

/// Render a minimal binary package control stanza.
pub(crate) fn control_stanza(
    package: &str,
    version: &str,
    architecture: &str,
    source: Option<&str>,
) -> String {
    let mut stanza = format!(
        "Package: {}\nVersion: {}\nArchitecture: {}\nMaintainer: Faptly Test <faptly@example.com>\nDescription: test fixture\n",
        package, version, architecture
    );

    if let Some(source) = source {
        stanza.push_str(&format!("Source: {}\n", source));
    }

    stanza
}

fn tar_with_entry(name: &str, data: &[u8]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    let mut header = tar::Header::new_gnu();
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_size(data.len() as u64);
    builder
        .append_data(&mut header, name, data)
        .expect("tar append should succeed");

    builder.into_inner().expect("tar finish should succeed")
}

fn compress(data: &[u8], extension: &str) -> Vec<u8> {
    match extension {
        "" => data.to_vec(),
        ".gz" => {
            let mut encoder =
                libflate::gzip::Encoder::new(Vec::new()).expect("gzip encoder should open");
            encoder.write_all(data).expect("gzip write should succeed");
            encoder
                .finish()
                .into_result()
                .expect("gzip finish should succeed")
        }
        ".xz" => {
            let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
            encoder.write_all(data).expect("xz write should succeed");
            encoder.finish().expect("xz finish should succeed")
        }
        ".bz2" => {
            let mut encoder =
                bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
            encoder.write_all(data).expect("bz2 write should succeed");
            encoder.finish().expect("bz2 finish should succeed")
        }
        ".zst" => zstd::encode_all(data, 3).expect("zstd encode should succeed"),
        // Deliberately unsupported flavors are passed through uncompressed;
        // the extractor should reject them by extension before decoding.
        _ => data.to_vec(),
    }
}

/// Build a `.deb` whose control tar uses the given member extension.
pub(crate) fn build_deb_with_compression(control: &str, extension: &str) -> Vec<u8> {
    let control_tar = compress(&tar_with_entry("./control", control.as_bytes()), extension);
    let data_tar = compress(&tar_with_entry("./usr/share/doc/fixture", b"fixture\n"), extension);

    let mut builder = ar::Builder::new(Vec::new());

    let debian_binary: &[u8] = b"2.0\n";
    let header = ar::Header::new(b"debian-binary".to_vec(), debian_binary.len() as u64);
    builder
        .append(&header, debian_binary)
        .expect("ar append should succeed");

    let header = ar::Header::new(
        format!("control.tar{}", extension).into_bytes(),
        control_tar.len() as u64,
    );
    builder
        .append(&header, &control_tar[..])
        .expect("ar append should succeed");

    let header = ar::Header::new(
        format!("data.tar{}", extension).into_bytes(),
        data_tar.len() as u64,
    );
    builder
        .append(&header, &data_tar[..])
        .expect("ar append should succeed");

    builder.into_inner().expect("ar finish should succeed")
}

/// Build a gzip-compressed `.deb` from stanza parts.
pub(crate) fn build_deb(
    package: &str,
    version: &str,
    architecture: &str,
    source: Option<&str>,
) -> Vec<u8> {
    build_deb_with_compression(&control_stanza(package, version, architecture, source), ".gz")
}
