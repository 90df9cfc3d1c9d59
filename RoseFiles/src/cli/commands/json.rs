//! CLI commands for converting between resource files and JSON

use std::path::Path;
use std::time::Instant;

use anyhow::Context;

use crate::cli::progress::{DISK, GEAR, LOOKING_GLASS, print_done, print_step};
use crate::document::{FileType, RoseDocument};
use crate::io::CodecOptions;

/// Dump a resource file as JSON to `output`, or stdout
pub fn dump(source: &Path, output: Option<&Path>, options: &CodecOptions) -> anyhow::Result<()> {
    let document = RoseDocument::load_with(source, options)?;
    let json = document.to_json()?;

    match output {
        Some(output) => {
            std::fs::write(output, json)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {} ({})", output.display(), document.summary());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Rebuild a resource file from a JSON dump
pub fn build(source: &Path, destination: &Path, options: &CodecOptions) -> anyhow::Result<()> {
    let start = Instant::now();
    let target = FileType::from_path(destination)?;

    print_step(1, 3, LOOKING_GLASS, &format!("Reading {}...", source.display()));
    let json = std::fs::read_to_string(source)
        .with_context(|| format!("Failed to read {}", source.display()))?;

    print_step(2, 3, GEAR, "Parsing document...");
    let document = RoseDocument::from_json(&json)?;
    if document.file_type() != target {
        anyhow::bail!(
            "{} holds a {} document but {} expects {}",
            source.display(),
            document.file_type(),
            destination.display(),
            target
        );
    }

    print_step(3, 3, DISK, &format!("Writing {}...", destination.display()));
    document.save_with(destination, options)?;

    print_done(start.elapsed());
    Ok(())
}
