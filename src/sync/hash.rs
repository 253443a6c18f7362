//! Content hashing for change detection.
//!
//! Files are streamed through the selected algorithm in fixed-size chunks so
//! memory use stays flat regardless of file size. BLAKE3 is the default.

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;

use blake3::Hasher as Blake3Hasher;
use md5::{Digest as Md5Digest, Md5};
use sha2::{Digest as Sha2Digest, Sha256};
use xxhash_rust::xxh3::Xxh3;

use crate::sync::error::{Result, SyncError};

/// Read buffer size used while hashing.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Trait for streaming hash implementations.
pub trait Hasher: Send {
    /// Feed the next chunk of data.
    fn update(&mut self, data: &[u8]);

    /// Finalize and return the raw digest bytes.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Digest size in bytes.
    fn output_size(&self) -> usize;
}

pub struct Blake3Wrapper(Blake3Hasher);

impl Hasher for Blake3Wrapper {
    fn update(&mut self, data: &[u8]) {
        // Splits across the rayon pool once the input is large enough to pay off.
        self.0.update_rayon(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        32
    }
}

pub struct Md5Wrapper(Md5);

impl Hasher for Md5Wrapper {
    fn update(&mut self, data: &[u8]) {
        Md5Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Md5Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        16
    }
}

pub struct Sha256Wrapper(Sha256);

impl Hasher for Sha256Wrapper {
    fn update(&mut self, data: &[u8]) {
        Sha2Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Sha2Digest::finalize(self.0).to_vec()
    }

    fn output_size(&self) -> usize {
        32
    }
}

pub struct Xxh128Wrapper(Xxh3);

impl Hasher for Xxh128Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.digest128().to_le_bytes().to_vec()
    }

    fn output_size(&self) -> usize {
        16
    }
}

/// Hash algorithm used to fingerprint file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// BLAKE3, 256-bit (default).
    #[default]
    Blake3,
    /// MD5, 128-bit.
    Md5,
    /// SHA-256.
    Sha256,
    /// XXH3-128, non-cryptographic.
    Xxh128,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Blake3,
        HashAlgorithm::Md5,
        HashAlgorithm::Sha256,
        HashAlgorithm::Xxh128,
    ];

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Xxh128 => "xxh128",
        }
    }

    /// Fresh hasher instance for this algorithm.
    pub fn hasher(&self) -> Box<dyn Hasher> {
        match self {
            HashAlgorithm::Blake3 => Box::new(Blake3Wrapper(Blake3Hasher::new())),
            HashAlgorithm::Md5 => Box::new(Md5Wrapper(Md5Digest::new())),
            HashAlgorithm::Sha256 => Box::new(Sha256Wrapper(Sha2Digest::new())),
            HashAlgorithm::Xxh128 => Box::new(Xxh128Wrapper(Xxh3::new())),
        }
    }

    /// Digest size in bits.
    pub fn output_bits(&self) -> usize {
        self.hasher().output_size() * 8
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "blake3" => Ok(HashAlgorithm::Blake3),
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "xxh128" => Ok(HashAlgorithm::Xxh128),
            _ => Err(SyncError::UnsupportedAlgorithm {
                algorithm: s.to_string(),
            }),
        }
    }
}

/// Fingerprint of a file's full byte content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: HashAlgorithm,
    bytes: Vec<u8>,
}

impl Digest {
    pub fn new(algorithm: HashAlgorithm, bytes: Vec<u8>) -> Self {
        Self { algorithm, bytes }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex rendering of the digest.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Anything that can fingerprint a file on disk.
pub trait DigestSource {
    fn digest(&self, path: &Path) -> Result<Digest>;
}

/// Streams files through a [`HashAlgorithm`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher {
    algorithm: HashAlgorithm,
}

impl ContentHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash everything readable from `reader`.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> std::io::Result<Digest> {
        let mut hasher = self.algorithm.hasher();
        let mut buffer = vec![0u8; CHUNK_SIZE];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Digest::new(self.algorithm, hasher.finalize()))
    }

    /// Hash an in-memory buffer.
    pub fn digest_bytes(&self, data: &[u8]) -> Digest {
        let mut hasher = self.algorithm.hasher();
        hasher.update(data);
        Digest::new(self.algorithm, hasher.finalize())
    }
}

impl DigestSource for ContentHasher {
    fn digest(&self, path: &Path) -> Result<Digest> {
        let file = File::open(path).map_err(|e| SyncError::io(e, "opening file", path))?;
        self.digest_reader(file)
            .map_err(|e| SyncError::io(e, "reading file", path))
    }
}
