// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use thiserror::Error;

/// Primary crate error type.
#[derive(Debug, Error)]
pub enum FaptlyError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("object store error on {0}: {1}")]
    Transport(String, String),

    #[error("repository {0} already exists")]
    RepoExists(String),

    #[error("repository {0} not found")]
    RepoNotFound(String),

    #[error("component {0} is not declared by the repository")]
    UnsupportedComponent(String),

    #[error("architecture {0} is not declared by the repository")]
    UnsupportedArchitecture(String),

    #[error("not a .deb archive: {0}")]
    NotDebArchive(String),

    #[error("unknown compression in .deb archive: {0}")]
    UnknownCompression(String),

    #[error("couldn't find control file in package")]
    ControlFileMissing,

    #[error("control file parse error: {0}")]
    ControlParse(String),

    #[error("expected 1 paragraph in release file; got {0}")]
    ReleaseParagraphMismatch(usize),

    #[error("digest missing from release index entry")]
    ReleaseMissingDigest,

    #[error("size missing from release index entry")]
    ReleaseMissingSize,

    #[error("path missing from release index entry")]
    ReleaseMissingPath,

    #[error("date parsing error: {0:?}")]
    DateParse(#[from] mailparse::MailParseError),

    #[error("integer parsing error: {0:?}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("hex parsing error: {0:?}")]
    Hex(#[from] hex::FromHexError),

    #[error("PGP error: {0:?}")]
    Pgp(#[from] pgp::errors::Error),

    #[error("signing key is locked and the passphrase does not unlock it")]
    KeyLocked,

    #[error("no signing key found in keyring")]
    NoSigningKey,

    #[error("signing failed: {0}")]
    SignFailed(String),

    #[error("YAML error: {0:?}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, FaptlyError>;
