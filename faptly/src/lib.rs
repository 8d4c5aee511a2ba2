// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! APT repository management over object storage.

This crate maintains Debian-style binary package repositories whose
backing store is an S3-compatible object store rather than a local
filesystem: the `pool/<suite>/...` package blobs and the
`dists/<suite>/...` metadata tree that APT clients fetch.

# A Tour of Functionality

The [control] module implements the Debian control file format.
[control::ControlParagraph] is an ordered field set that preserves unknown
fields; [control::ControlParagraphReader] streams paragraphs out of
`Packages` files and control stanzas.

The [deb] module reads `.deb` packages. [deb::extract_control()] walks the
outer `ar` archive and the compressed `control.tar` within it to return the
package's control stanza.

The [digest] module computes the md5/sha1/sha256 digests repository
metadata carries. [digest::MultiDigester] feeds all three hashers in a
single pass.

The [pgp] module implements the OpenPGP cleartext signature framework used
by `InRelease` files. [pgp::Signer] clear-signs release descriptors;
[pgp::CleartextDocument] parses and verifies them.

The [release] and [binary_package] modules hold the data model:
[release::Release] is the typed release descriptor with its hash
manifests, [binary_package::BinaryPackage] one index stanza, and
[binary_package::PackagesIndex] a per-(component, architecture) index.

The [store] module abstracts the blob namespace. [store::ObjectStore] is
the engine's single I/O boundary, implemented by [store::s3::S3Store] for
production and [store::memory::MemoryStore] for tests.

The [manager] module ties it together. [manager::Manager] creates,
inspects, and deletes repositories and ingests packages with a
CPU-bounded worker pool, keeping indexes and the signed release
consistent.

Configuration ([config::Config]) is a plain record; front ends decide how
to populate it.
*/

pub mod binary_package;
pub mod config;
pub mod control;
pub mod deb;
pub mod digest;
pub mod error;
pub mod manager;
pub mod pgp;
pub mod release;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;
