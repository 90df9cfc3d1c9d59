//! CLI command for batch round-trip verification

use std::path::PathBuf;
use std::time::Instant;

use crate::batch::{VerifyStatus, batch_verify, find_resource_files};
use crate::cli::progress::simple_bar;

/// Verify every supported file in `paths` (directories are scanned recursively)
pub fn execute(paths: &[PathBuf], quiet: bool) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(find_resource_files(path));
        } else {
            files.push(path.clone());
        }
    }

    if files.is_empty() {
        println!("No resource files found");
        return Ok(());
    }

    let pb = if quiet {
        None
    } else {
        println!("Found {} files to verify", files.len());
        Some(simple_bar(files.len() as u64, "Verifying"))
    };

    let result = batch_verify(&files, |_, _, _| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    });

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    for file in &result.files {
        match &file.status {
            VerifyStatus::Identical => {}
            VerifyStatus::Mismatch {
                original_len,
                saved_len,
                first_difference,
            } => println!(
                "MISMATCH {} ({original_len} -> {saved_len} bytes, first difference at {first_difference:#x})",
                file.path.display()
            ),
            VerifyStatus::Failed(e) => println!("FAILED   {}: {e}", file.path.display()),
        }
    }

    println!(
        "{} identical, {} mismatched, {} failed ({} files in {:.2}s)",
        result.identical_count,
        result.mismatch_count,
        result.fail_count,
        result.total(),
        start.elapsed().as_secs_f64()
    );

    if !result.all_identical() {
        anyhow::bail!("{} files did not round-trip", result.total() - result.identical_count);
    }
    Ok(())
}
