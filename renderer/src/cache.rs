use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::RenderError;

/// Inputs that determine one cached fragment. Any change to these
/// produces a different fingerprint and therefore a cache miss.
#[derive(Debug)]
pub struct Fingerprint<'a> {
    /// Language tag of the executable block.
    pub language: &'a str,
    /// Literal code text.
    pub code: &'a str,
    /// Significant digits used when echoing the output.
    pub digits: u32,
    /// Comment marker used when echoing the output.
    pub comment: &'a str,
}

impl Fingerprint<'_> {
    /// SHA-256 of `"{language}:{digits}:{comment}:{code}"`, hex-encoded.
    pub fn compute(&self) -> String {
        let content = format!(
            "{}:{}:{}:{}",
            self.language, self.digits, self.comment, self.code
        );
        hex::encode(Sha256::digest(content.as_bytes()))
    }
}

/// Disk-backed fragment cache: one file per fingerprint, each entry
/// storing a digest of its payload so stale or corrupted entries are
/// detected instead of served. The whole directory may be deleted at
/// any time without correctness loss.
#[derive(Debug)]
pub struct FragmentCache {
    dir: PathBuf,
}

impl FragmentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FragmentCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look up a fragment. `Ok(None)` on a miss. A present entry whose
    /// payload no longer matches its recorded digest is evicted and
    /// reported as `CacheMismatch`, never served.
    pub fn lookup(&self, fingerprint: &str) -> Result<Option<String>, RenderError> {
        let path = self.entry_path(fingerprint);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RenderError::Io(format!(
                    "cannot read cache entry '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        let verified = raw
            .split_once('\n')
            .filter(|(digest, payload)| *digest == payload_digest(payload));

        match verified {
            Some((_, payload)) => Ok(Some(payload.to_string())),
            None => {
                let _ = fs::remove_file(&path);
                Err(RenderError::CacheMismatch {
                    fingerprint: fingerprint.to_string(),
                })
            }
        }
    }

    /// Store a fragment under its fingerprint.
    pub fn store(&self, fingerprint: &str, payload: &str) -> Result<(), RenderError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            RenderError::Io(format!(
                "cannot create cache directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.entry_path(fingerprint);
        let mut entry = String::with_capacity(payload.len() + 65);
        entry.push_str(&payload_digest(payload));
        entry.push('\n');
        entry.push_str(payload);

        fs::write(&path, entry).map_err(|e| {
            RenderError::Io(format!(
                "cannot write cache entry '{}': {}",
                path.display(),
                e
            ))
        })
    }

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(fingerprint)
    }
}

fn payload_digest(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}
