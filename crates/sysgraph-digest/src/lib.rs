// SPDX-License-Identifier: Apache-2.0
//! Content addresses for the SysGraph action graph.
//!
//! A [`Digest`] is a `(hash, size)` pair over the bytes of a serialized
//! record. Its canonical string form is `hex/size`. Two resources (or any
//! other digested record) are identical iff their digests are equal — the
//! digest IS the identity, following the same content-address convention as
//! `echo-cas::BlobHash`, extended with an explicit byte count because
//! SysGraph resources (unlike CAS blobs) need size available without a
//! second lookup.
//!
//! Hashing uses SHA-256 and never emits uppercase hex.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod pool;

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

pub use pool::BufferPool;

/// Number of hex characters in a SHA-256 digest (32 bytes × 2).
const SHA256_HEX_LEN: usize = 64;

/// Errors produced while constructing or parsing a [`Digest`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DigestError {
    /// The canonical string had no `/` separator between hash and size.
    #[error("missing '/' separator in digest string {0:?}")]
    MissingSeparator(String),
    /// The size component was not a valid non-negative integer.
    #[error("invalid size in digest string {0:?}")]
    InvalidSize(String),
    /// The hash component was the wrong length for the configured algorithm.
    #[error("invalid hash length: expected {expected}, got {actual}")]
    InvalidHashLength {
        /// Expected hex character count.
        expected: usize,
        /// Actual hex character count found.
        actual: usize,
    },
    /// The hash component contained non-hex or uppercase characters.
    #[error("hash contains non-hex characters: {0:?}")]
    InvalidHashChars(String),
    /// I/O error while hashing a reader or file.
    #[error("io error computing digest: {0}")]
    Io(#[from] std::io::Error),
}

/// A content address: a lowercase-hex hash paired with a byte size.
///
/// Canonical string form is `hash/size`. The empty digest is the digest of
/// a zero-byte blob.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
    hash: String,
    size: i64,
}

impl Digest {
    /// Compute the digest of a byte slice.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self::from_hasher(hasher, bytes.len() as i64)
    }

    /// Compute the digest of a serializable record via its canonical
    /// binary encoding (`bincode`).
    pub fn of_record<T: Serialize>(record: &T) -> Result<Self, DigestError> {
        let bytes = bincode::serialize(record)
            .map_err(|e| DigestError::Io(std::io::Error::other(e.to_string())))?;
        Ok(Self::of_bytes(&bytes))
    }

    /// Compute the digest of a reader's full contents, reusing a shared
    /// buffer pool so repeated large-blob hashing does not allocate a fresh
    /// buffer per call.
    pub fn of_reader<R: Read>(mut reader: R, pool: &BufferPool) -> Result<Self, DigestError> {
        let mut guard = pool.acquire();
        let buf = guard.as_mut();
        let mut hasher = Sha256::new();
        let mut total: i64 = 0;
        loop {
            let n = reader.read(buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            total += n as i64;
        }
        Ok(Self::from_hasher(hasher, total))
    }

    /// Compute the digest of a file's contents on disk.
    pub fn of_file(path: &Path, pool: &BufferPool) -> Result<Self, DigestError> {
        let file = std::fs::File::open(path)?;
        Self::of_reader(file, pool)
    }

    /// The digest of a zero-byte blob.
    pub fn empty() -> Self {
        Self::of_bytes(&[])
    }

    /// Parse a canonical `hash/size` string.
    pub fn parse(s: &str) -> Result<Self, DigestError> {
        let (hash, size_str) = s
            .split_once('/')
            .ok_or_else(|| DigestError::MissingSeparator(s.to_string()))?;
        let size: i64 = size_str
            .parse()
            .map_err(|_| DigestError::InvalidSize(s.to_string()))?;
        if size < 0 {
            return Err(DigestError::InvalidSize(s.to_string()));
        }
        validate_hash(hash)?;
        Ok(Self {
            hash: hash.to_string(),
            size,
        })
    }

    /// The lowercase-hex hash component.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The byte size component.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Render the canonical `hash/size` string form.
    pub fn canonical(&self) -> String {
        format!("{}/{}", self.hash, self.size)
    }

    fn from_hasher(hasher: Sha256, size: i64) -> Self {
        let digest = hasher.finalize();
        let hash = digest.iter().fold(String::with_capacity(64), |mut s, b| {
            use std::fmt::Write as _;
            // `write!` to a String never fails.
            let _ = write!(s, "{b:02x}");
            s
        });
        Self { hash, size }
    }
}

fn validate_hash(hash: &str) -> Result<(), DigestError> {
    if hash.len() != SHA256_HEX_LEN {
        return Err(DigestError::InvalidHashLength {
            expected: SHA256_HEX_LEN,
            actual: hash.len(),
        });
    }
    if !hash.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
        return Err(DigestError::InvalidHashChars(hash.to_string()));
    }
    Ok(())
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DigestVisitor;
        impl Visitor<'_> for DigestVisitor {
            type Value = Digest;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a canonical digest string 'hash/size'")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Digest, E> {
                Digest::parse(v).map_err(de::Error::custom)
            }
        }
        deserializer.deserialize_str(DigestVisitor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_digest_is_stable() {
        let a = Digest::empty();
        let b = Digest::of_bytes(&[]);
        assert_eq!(a, b);
        assert_eq!(a.size(), 0);
    }

    #[test]
    fn canonical_round_trip() {
        let d = Digest::of_bytes(b"hello sysgraph");
        let s = d.canonical();
        let parsed = Digest::parse(&s).unwrap();
        assert_eq!(d, parsed);
    }

    #[test]
    fn parse_rejects_missing_separator() {
        let err = Digest::parse("deadbeef").unwrap_err();
        assert!(matches!(err, DigestError::MissingSeparator(_)));
    }

    #[test]
    fn parse_rejects_negative_size() {
        let hash = "a".repeat(64);
        let err = Digest::parse(&format!("{hash}/-1")).unwrap_err();
        assert!(matches!(err, DigestError::InvalidSize(_)));
    }

    #[test]
    fn parse_rejects_non_numeric_size() {
        let hash = "a".repeat(64);
        let err = Digest::parse(&format!("{hash}/abc")).unwrap_err();
        assert!(matches!(err, DigestError::InvalidSize(_)));
    }

    #[test]
    fn parse_rejects_wrong_hash_length() {
        let err = Digest::parse("abcd/4").unwrap_err();
        assert!(matches!(err, DigestError::InvalidHashLength { .. }));
    }

    #[test]
    fn parse_rejects_uppercase_hex() {
        let hash = "A".repeat(64);
        let err = Digest::parse(&format!("{hash}/0")).unwrap_err();
        assert!(matches!(err, DigestError::InvalidHashChars(_)));
    }

    #[test]
    fn parse_rejects_non_hex_chars() {
        let hash = "g".repeat(64);
        let err = Digest::parse(&format!("{hash}/0")).unwrap_err();
        assert!(matches!(err, DigestError::InvalidHashChars(_)));
    }

    #[test]
    fn never_emits_uppercase() {
        let d = Digest::of_bytes(b"SysGraph");
        assert_eq!(d.hash(), d.hash().to_lowercase());
    }

    #[test]
    fn of_reader_matches_of_bytes() {
        let pool = BufferPool::new();
        let data = vec![0x7au8; 100_000];
        let from_bytes = Digest::of_bytes(&data);
        let from_reader = Digest::of_reader(&data[..], &pool).unwrap();
        assert_eq!(from_bytes, from_reader);
    }

    #[test]
    fn serde_round_trip() {
        let d = Digest::of_bytes(b"round trip me");
        let json = serde_json::to_string(&d).unwrap();
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }

    proptest::proptest! {
        #[test]
        fn canonical_parse_round_trips_any_bytes(data: Vec<u8>) {
            let d = Digest::of_bytes(&data);
            let parsed = Digest::parse(&d.canonical()).unwrap();
            proptest::prop_assert_eq!(d, parsed);
        }
    }
}
