//! Batch round-trip verification
//!
//! Finds resource files under a directory and checks, in parallel, that each
//! one loads and re-serializes to exactly the bytes on disk.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::document::{FileType, RoseDocument};
use crate::error::Result;

/// Outcome of verifying a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyStatus {
    /// Saved bytes are identical to the input.
    Identical,
    /// The file loaded, but saving produced different bytes.
    Mismatch {
        original_len: usize,
        saved_len: usize,
        /// Offset of the first differing byte.
        first_difference: usize,
    },
    /// Loading or saving failed.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct FileVerification {
    pub path: PathBuf,
    pub file_type: FileType,
    pub status: VerifyStatus,
}

/// Result of a batch verification
#[derive(Debug, Clone, Default)]
pub struct BatchVerifyResult {
    /// Files whose saved bytes matched the input
    pub identical_count: usize,
    /// Files that loaded but saved differently
    pub mismatch_count: usize,
    /// Files that failed to load or save
    pub fail_count: usize,
    /// Per-file outcomes, in input order
    pub files: Vec<FileVerification>,
}

impl BatchVerifyResult {
    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn all_identical(&self) -> bool {
        self.identical_count == self.files.len()
    }
}

/// Find all supported resource files in a directory recursively
///
/// Returns a sorted list; files with unrecognised extensions are skipped.
pub fn find_resource_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file() && FileType::from_path(e.path()).is_ok())
        .map(walkdir::DirEntry::into_path)
        .collect();

    files.sort();
    files
}

/// Load `path`, save it to memory and compare with the bytes on disk.
pub fn verify_file(path: &Path) -> Result<VerifyStatus> {
    let file_type = FileType::from_path(path)?;
    let original = std::fs::read(path)?;
    let saved = RoseDocument::from_bytes(file_type, &original)
        .map_err(|e| e.with_path(path))?
        .to_bytes()?;

    if saved == original {
        return Ok(VerifyStatus::Identical);
    }

    let first_difference = original
        .iter()
        .zip(&saved)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| original.len().min(saved.len()));
    Ok(VerifyStatus::Mismatch {
        original_len: original.len(),
        saved_len: saved.len(),
        first_difference,
    })
}

/// Verify many files in parallel
///
/// `progress` is called once per file with the number of files finished so
/// far, the total, and the path just processed.
pub fn batch_verify<F>(files: &[PathBuf], progress: F) -> BatchVerifyResult
where
    F: Fn(usize, usize, &Path) + Send + Sync,
{
    let processed = AtomicUsize::new(0);
    let total = files.len();

    let verified: Vec<FileVerification> = files
        .par_iter()
        .filter_map(|path| {
            let file_type = FileType::from_path(path).ok()?;
            let status = verify_file(path).unwrap_or_else(|e| VerifyStatus::Failed(e.to_string()));

            match &status {
                VerifyStatus::Identical => {}
                VerifyStatus::Mismatch {
                    first_difference, ..
                } => tracing::warn!(
                    "{} does not round-trip (first difference at {first_difference:#x})",
                    path.display()
                ),
                VerifyStatus::Failed(e) => tracing::warn!("Failed {}: {e}", path.display()),
            }

            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(current, total, path);

            Some(FileVerification {
                path: path.clone(),
                file_type,
                status,
            })
        })
        .collect();

    let mut result = BatchVerifyResult::default();
    for file in &verified {
        match file.status {
            VerifyStatus::Identical => result.identical_count += 1,
            VerifyStatus::Mismatch { .. } => result.mismatch_count += 1,
            VerifyStatus::Failed(_) => result.fail_count += 1,
        }
    }
    result.files = verified;

    tracing::debug!(
        "Verified {} files: {} identical, {} mismatched, {} failed",
        result.total(),
        result.identical_count,
        result.mismatch_count,
        result.fail_count
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{RoseFile, TileFile};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_find_resource_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("3DDATA").join("MAPS");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("30_30.TIL"), b"").unwrap();
        std::fs::write(dir.path().join("LIST_NPC.STB"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let files = find_resource_files(dir.path());
        assert_eq!(
            files,
            vec![
                nested.join("30_30.TIL"),
                dir.path().join("LIST_NPC.STB"),
            ]
        );
    }

    #[test]
    fn test_batch_verify() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.til");
        TileFile::with_size(4, 4).save(&good).unwrap();

        let padded = dir.path().join("padded.til");
        let mut bytes = TileFile::with_size(1, 1).to_bytes().unwrap();
        bytes.push(0xFF);
        std::fs::write(&padded, &bytes).unwrap();

        let broken = dir.path().join("broken.stb");
        std::fs::write(&broken, b"XXXX").unwrap();

        let files = vec![broken.clone(), good.clone(), padded.clone()];
        let calls = AtomicUsize::new(0);
        let result = batch_verify(&files, |_, total, _| {
            assert_eq!(total, 3);
            calls.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.total(), 3);
        assert_eq!(result.identical_count, 1);
        assert_eq!(result.mismatch_count, 1);
        assert_eq!(result.fail_count, 1);
        assert!(!result.all_identical());

        assert_eq!(result.files[0].path, broken);
        assert!(matches!(result.files[0].status, VerifyStatus::Failed(_)));
        assert_eq!(result.files[1].status, VerifyStatus::Identical);
        assert_eq!(
            result.files[2].status,
            VerifyStatus::Mismatch {
                original_len: bytes.len(),
                saved_len: bytes.len() - 1,
                first_difference: bytes.len() - 1,
            }
        );
    }
}
