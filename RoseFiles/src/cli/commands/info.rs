//! CLI command for inspecting resource files

use std::path::PathBuf;

use crate::document::RoseDocument;
use crate::io::CodecOptions;

/// Print the format and summary of each file
///
/// Keeps going after a failure and reports the number of failed files.
pub fn execute(files: &[PathBuf], options: &CodecOptions) -> anyhow::Result<()> {
    let mut failed = 0usize;

    for path in files {
        match RoseDocument::load_with(path, options) {
            Ok(document) => {
                let file_type = document.file_type();
                println!("{}", path.display());
                println!("  Format:  {} ({})", file_type, file_type.description());
                println!("  Size:    {} bytes", std::fs::metadata(path)?.len());
                println!("  Content: {}", document.summary());
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: {e}", path.display());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} files could not be read", files.len());
    }
    Ok(())
}
