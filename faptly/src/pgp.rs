// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! PGP cleartext signing.

The cleartext signature framework
([RFC 4880 Section 7](https://datatracker.ietf.org/doc/html/rfc4880.html#section-7))
stores a PGP signature inline with the signed text:

```text
-----BEGIN PGP SIGNED MESSAGE-----
Hash: <digest>

<normalized signed content>
-----BEGIN PGP SIGNATURE-----

<signature data>
-----END PGP SIGNATURE-----
```

`InRelease` files are cleartext signatures whose body is the release
paragraph. [Signer] produces them; [CleartextDocument] takes them apart
again and can verify the signature.
*/

use {
    crate::error::{FaptlyError, Result},
    chrono::SubsecRound,
    digest::Digest,
    md5::Md5,
    pgp::{
        crypto::{HashAlgorithm, Hasher, SymmetricKeyAlgorithm},
        packet::{Packet, PacketParser, SignatureConfig, SignatureType, Subpacket},
        types::{KeyTrait, KeyVersion, PublicKeyTrait, SecretKeyTrait},
        Deserializable, KeyType, SecretKeyParamsBuilder, Signature, SignedPublicKey,
        SignedSecretKey,
    },
    sha1::Sha1,
    sha2::{Sha256, Sha512},
    smallvec::{smallvec, SmallVec},
    std::{
        collections::HashMap,
        io::{self, BufRead, Cursor},
    },
};

const HEADER: &str = "-----BEGIN PGP SIGNED MESSAGE-----";
const SIGNATURE_ARMOR: &str = "-----BEGIN PGP SIGNATURE-----";

/// Wrapper around content digesting to work around lack of clone() in the
/// pgp crate's hashers.
#[derive(Clone)]
pub enum CleartextHasher {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl CleartextHasher {
    pub fn md5() -> Self {
        Self::Md5(Md5::new())
    }

    pub fn sha1() -> Self {
        Self::Sha1(Sha1::new())
    }

    pub fn sha256() -> Self {
        Self::Sha256(Sha256::new())
    }

    pub fn sha512() -> Self {
        Self::Sha512(Sha512::new())
    }

    fn from_armor_name(name: &str) -> Option<Self> {
        match name {
            "MD5" => Some(Self::md5()),
            "SHA1" => Some(Self::sha1()),
            "SHA256" => Some(Self::sha256()),
            "SHA512" => Some(Self::sha512()),
            _ => None,
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Md5(_) => HashAlgorithm::MD5,
            Self::Sha1(_) => HashAlgorithm::SHA1,
            Self::Sha256(_) => HashAlgorithm::SHA2_256,
            Self::Sha512(_) => HashAlgorithm::SHA2_512,
        }
    }
}

impl io::Write for CleartextHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Hasher::update(self, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Hasher for CleartextHasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(digest) => digest.update(data),
            Self::Sha1(digest) => digest.update(data),
            Self::Sha256(digest) => digest.update(data),
            Self::Sha512(digest) => digest.update(data),
        }
    }

    fn finish(self: Box<Self>) -> Vec<u8> {
        match *self {
            Self::Md5(digest) => digest.finalize().to_vec(),
            Self::Sha1(digest) => digest.finalize().to_vec(),
            Self::Sha256(digest) => digest.finalize().to_vec(),
            Self::Sha512(digest) => digest.finalize().to_vec(),
        }
    }
}

fn pgp_message_error(message: impl ToString) -> FaptlyError {
    FaptlyError::Pgp(pgp::errors::Error::Message(message.to_string()))
}

/// A parsed PGP cleartext document.
///
/// Holds the dash-unescaped cleartext, the hashers fed with the
/// CRLF-normalized signed content, and the parsed signature packets.
pub struct CleartextDocument {
    cleartext: String,
    hashers: HashMap<u8, CleartextHasher>,
    signatures: Vec<Signature>,
}

impl CleartextDocument {
    /// Parse a cleartext signature document from a reader.
    ///
    /// The signature is parsed but not validated; call [Self::verify()] to
    /// check it against a public key.
    pub fn parse(mut reader: impl BufRead) -> Result<Self> {
        let mut line = String::new();

        reader.read_line(&mut line)?;
        if line.trim_end() != HEADER {
            return Err(pgp_message_error(format!(
                "bad PGP cleartext header; expected {:?}; got {:?}",
                HEADER,
                line.trim_end()
            )));
        }

        // 1 or more `Hash:` armor headers, terminated by an empty line.
        let mut hashers: HashMap<u8, CleartextHasher> = HashMap::new();

        loop {
            line.clear();
            reader.read_line(&mut line)?;

            let line = line.trim_end();
            if line.is_empty() {
                break;
            }

            let names = line.strip_prefix("Hash: ").ok_or_else(|| {
                pgp_message_error(format!("expected Hash: header; got {:?}", line))
            })?;

            for name in names.split(',').map(|n| n.trim()).filter(|n| !n.is_empty()) {
                let hasher = CleartextHasher::from_armor_name(name)
                    .ok_or_else(|| pgp_message_error(format!("unsupported hash type: {}", name)))?;
                hashers.entry(hasher.algorithm() as u8).or_insert(hasher);
            }
        }

        if hashers.is_empty() {
            return Err(pgp_message_error("no Hash headers in cleartext signature"));
        }

        // The dash-escaped cleartext body runs until the signature armor.
        // Per RFC 4880 the signed digest is computed over the body with
        // CRLF line endings and without the line break that precedes the
        // signature armor.
        let mut body: Vec<String> = vec![];

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(pgp_message_error("cleartext ends without a signature"));
            }

            let trimmed = line.trim_end_matches(|c| c == '\r' || c == '\n');

            if trimmed == SIGNATURE_ARMOR {
                break;
            }

            body.push(trimmed.strip_prefix("- ").unwrap_or(trimmed).to_string());
        }

        let signed = body.join("\r\n");
        for hasher in hashers.values_mut() {
            Hasher::update(hasher, signed.as_bytes());
        }

        // The pgp crate's armor reader handles the signature block.
        let mut armor = format!("{}\n", SIGNATURE_ARMOR).into_bytes();
        reader.read_to_end(&mut armor)?;

        let mut dearmor = pgp::armor::Dearmor::new(Cursor::new(armor));
        dearmor.read_header()?;

        if !matches!(dearmor.typ, Some(pgp::armor::BlockType::Signature)) {
            return Err(pgp_message_error("failed to parse PGP signature armor"));
        }

        let mut signatures = vec![];
        for packet in PacketParser::new(dearmor) {
            match packet? {
                Packet::Signature(signature) => signatures.push(signature),
                packet => {
                    return Err(pgp_message_error(format!(
                        "unexpected PGP packet; expected Signature; got {:?}",
                        packet.tag()
                    )));
                }
            }
        }

        let mut cleartext = body.join("\n");
        if !cleartext.is_empty() {
            cleartext.push('\n');
        }

        Ok(Self {
            cleartext,
            hashers,
            signatures,
        })
    }

    /// The signed cleartext, dash escaping reversed, LF line endings.
    pub fn cleartext(&self) -> &str {
        &self.cleartext
    }

    /// Iterate over the parsed signature packets.
    pub fn iter_signatures(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.iter()
    }

    /// Verify signatures made by the given key.
    ///
    /// Returns the number of signatures verified. Errors if the document
    /// carries no signature from the key or a signature is invalid.
    pub fn verify(&self, key: &impl PublicKeyTrait) -> Result<usize> {
        if self.signatures.is_empty() {
            return Err(pgp_message_error("no PGP signatures present"));
        }

        let mut valid = 0;

        for sig in self.signatures.iter() {
            match sig.issuer() {
                Some(issuer) if issuer == &key.key_id() => {}
                _ => continue,
            }

            let mut hasher = Box::new(
                self.hashers
                    .get(&(sig.config.hash_alg as u8))
                    .ok_or_else(|| {
                        pgp_message_error(format!(
                            "no hasher matching signature hash algorithm {:?}",
                            sig.config.hash_alg
                        ))
                    })?
                    .clone(),
            );

            let len = sig.config.hash_signature_data(&mut *hasher)?;
            hasher.update(&sig.config.trailer(len));

            let digest = hasher.finish();

            if digest[0..2] != sig.signed_hash_value {
                return Err(pgp_message_error("invalid signed hash value"));
            }

            key.verify_signature(sig.config.hash_alg, &digest, &sig.signature)?;
            valid += 1;
        }

        match valid {
            0 => Err(pgp_message_error("no signatures signed by provided key")),
            n => Ok(n),
        }
    }
}

/// A clear-signing identity: an unlocked secret key plus its passphrase.
///
/// The key material is parsed and its passphrase validated once, at
/// construction.
#[derive(Clone)]
pub struct Signer {
    key: SignedSecretKey,
    passphrase: String,
}

impl Signer {
    /// Construct from an already-parsed secret key.
    ///
    /// The passphrase must unlock the primary key and every secret subkey.
    pub fn new(key: SignedSecretKey, passphrase: impl ToString) -> Result<Self> {
        let passphrase = passphrase.to_string();

        key.unlock(|| passphrase.clone(), |_| Ok(()))
            .map_err(|_| FaptlyError::KeyLocked)?;

        for subkey in &key.secret_subkeys {
            subkey
                .unlock(|| passphrase.clone(), |_| Ok(()))
                .map_err(|_| FaptlyError::KeyLocked)?;
        }

        Ok(Self { key, passphrase })
    }

    /// Construct from an ASCII armored secret key.
    pub fn from_armored(data: &[u8], passphrase: &str) -> Result<Self> {
        let (key, _headers) = SignedSecretKey::from_armor_single(Cursor::new(data))
            .map_err(|_| FaptlyError::NoSigningKey)?;

        Self::new(key, passphrase)
    }

    /// The secret key backing this signer.
    pub fn secret_key(&self) -> &SignedSecretKey {
        &self.key
    }

    /// Clear-sign a payload, returning the armored document.
    ///
    /// Release descriptors are the only thing this signs, so the framework
    /// is fixed: SHA-256, text mode. The digest covers the payload with
    /// trailing whitespace stripped and CRLF line endings, so the document
    /// verifies however its lines end up terminated in transit.
    pub fn clearsign(&self, data: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(data)
            .map_err(|e| FaptlyError::SignFailed(format!("payload is not UTF-8: {}", e)))?;
        let body = text.lines().map(str::trim_end).collect::<Vec<_>>();

        let signature = self.sign_body(&body)?;

        let mut document = String::with_capacity(data.len() + signature.len() + 64);
        document.push_str(HEADER);
        document.push_str("\nHash: SHA256\n\n");

        for line in &body {
            // Dash escaping keeps body lines distinguishable from armor.
            if line.starts_with('-') || line.starts_with("From ") {
                document.push_str("- ");
            }
            document.push_str(line);
            document.push('\n');
        }

        document.push_str(&signature);

        Ok(document)
    }

    /// Produce the armored signature block over normalized body lines.
    fn sign_body(&self, body: &[&str]) -> Result<String> {
        let signed_text = body.join("\r\n").into_bytes();

        // Issuer subpackets let verifiers pick the right key out of a
        // ring without trial verification.
        let config = SignatureConfig::new_v4(
            Default::default(),
            SignatureType::Text,
            self.key.algorithm(),
            HashAlgorithm::SHA2_256,
            vec![
                Subpacket::SignatureCreationTime(chrono::Utc::now().trunc_subsecs(0)),
                Subpacket::IssuerFingerprint(
                    KeyVersion::V4,
                    SmallVec::from_slice(&self.key.fingerprint()),
                ),
            ],
            vec![Subpacket::Issuer(self.key.key_id())],
        );

        let passphrase = self.passphrase.clone();
        let signature = config
            .sign(&self.key, move || passphrase, Cursor::new(signed_text))
            .map_err(|e| FaptlyError::SignFailed(format!("{:?}", e)))?;

        let mut armor = Cursor::new(Vec::<u8>::new());
        pgp::armor::write(
            &Packet::Signature(signature),
            pgp::armor::BlockType::Signature,
            &mut armor,
            None,
        )
        .map_err(|e| FaptlyError::SignFailed(format!("{:?}", e)))?;

        String::from_utf8(armor.into_inner()).map_err(|e| FaptlyError::SignFailed(e.to_string()))
    }
}

/// Generate a self-signed key pair for signing a repository.
///
/// The shape follows what [Signer] actually does with the key: RSA 2048
/// (fast enough to generate in a test run, accepted by every apt
/// deployment), a SHA-256 hash preference to match the cleartext
/// signatures this crate emits, and signing capability only; a repository
/// identity never certifies other keys, and nothing encrypts to it.
///
/// `user_id` has a format like `Name <email>`. An empty `passphrase`
/// leaves the key unlocked.
pub fn generate_signing_key(
    user_id: &str,
    passphrase: &str,
) -> Result<(SignedSecretKey, SignedPublicKey)> {
    let params = SecretKeyParamsBuilder::default()
        .key_type(KeyType::Rsa(2048))
        .can_sign(true)
        .can_create_certificates(false)
        .primary_user_id(user_id.to_string())
        .preferred_hash_algorithms(smallvec![HashAlgorithm::SHA2_256])
        .preferred_symmetric_algorithms(smallvec![SymmetricKeyAlgorithm::AES256])
        .build()
        .map_err(|e| FaptlyError::SignFailed(e.to_string()))?;

    let lock = || passphrase.to_string();

    let secret = params.generate()?.sign(lock)?;
    let public = secret.public_key().sign(&secret, lock)?;

    Ok((secret, public))
}

#[cfg(test)]
mod tests {
    use {super::*, crate::testutil::test_signer};

    #[test]
    fn sign_parse_verify_round_trip() -> Result<()> {
        let (signer, public_key) = test_signer();

        let payload = b"Origin: Test\nSuite: stable\nDescription: round trip\n";
        let signed = signer.clearsign(payload)?;

        assert!(signed.starts_with(HEADER));
        assert!(signed.contains("Hash: SHA256"));

        let doc = CleartextDocument::parse(std::io::Cursor::new(signed))?;
        assert_eq!(doc.cleartext().as_bytes(), payload);
        assert_eq!(doc.verify(public_key)?, 1);

        Ok(())
    }

    #[test]
    fn dash_escaping_round_trips() -> Result<()> {
        let (signer, _) = test_signer();

        let payload = b"-----leading dashes-----\nFrom the start\nplain\n";
        let signed = signer.clearsign(payload)?;

        assert!(signed.contains("- -----leading dashes-----"));

        let doc = CleartextDocument::parse(std::io::Cursor::new(signed))?;
        assert_eq!(doc.cleartext().as_bytes(), &payload[..]);

        Ok(())
    }

    #[test]
    fn tampered_body_fails_verification() -> Result<()> {
        let (signer, public_key) = test_signer();

        let signed = signer.clearsign(b"Suite: stable\n")?;
        let tampered = signed.replace("stable", "trusty");

        let doc = CleartextDocument::parse(std::io::Cursor::new(tampered))?;
        assert!(doc.verify(public_key).is_err());

        Ok(())
    }

    #[test]
    fn garbage_key_is_no_signing_key() {
        assert!(matches!(
            Signer::from_armored(b"not a key at all", ""),
            Err(FaptlyError::NoSigningKey)
        ));
    }

    #[test]
    fn wrong_passphrase_is_key_locked() -> Result<()> {
        let (key, _) = generate_signing_key("Locked <locked@example.com>", "correct horse")?;

        assert!(matches!(
            Signer::new(key.clone(), "wrong"),
            Err(FaptlyError::KeyLocked)
        ));

        let signer = Signer::new(key, "correct horse")?;
        signer.clearsign(b"payload\n")?;

        Ok(())
    }
}
