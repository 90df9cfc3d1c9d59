use clap::Subcommand;
use std::path::PathBuf;
use std::str::FromStr;

use crate::io::{CodecOptions, TextEncoding};

/// Text codepage override for string fields
#[derive(Debug, Clone, Copy)]
pub struct EncodingArg(pub TextEncoding);

impl FromStr for EncodingArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "euc-kr" | "euckr" | "korean" | "cp949" => Ok(EncodingArg(TextEncoding::EucKr)),
            "utf-8" | "utf8" => Ok(EncodingArg(TextEncoding::Utf8)),
            _ => Err(format!(
                "Invalid encoding '{s}'. Valid values: euc-kr/korean/cp949, utf-8/utf8"
            )),
        }
    }
}

/// Codec options for an optional `--encoding` argument.
pub(crate) fn codec_options(encoding: Option<EncodingArg>) -> CodecOptions {
    match encoding {
        Some(EncodingArg(encoding)) => CodecOptions::new().with_encoding(encoding),
        None => CodecOptions::new(),
    }
}

pub mod execute;
pub mod info;
pub mod json;
pub mod stl;
pub mod verify;

#[derive(Subcommand)]
pub enum Commands {
    /// Show the format and a summary of one or more resource files
    Info {
        /// Resource file(s)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Text encoding override (euc-kr, utf-8)
        #[arg(short, long)]
        encoding: Option<EncodingArg>,
    },

    /// Dump a resource file to JSON
    Dump {
        /// Resource file
        source: PathBuf,

        /// Output JSON file (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Text encoding override (euc-kr, utf-8)
        #[arg(short, long)]
        encoding: Option<EncodingArg>,
    },

    /// Build a resource file from a JSON dump
    Build {
        /// JSON file produced by `dump`
        source: PathBuf,

        /// Output resource file (format taken from the extension)
        destination: PathBuf,

        /// Text encoding override (euc-kr, utf-8)
        #[arg(short, long)]
        encoding: Option<EncodingArg>,
    },

    /// Check that files load and save back to identical bytes
    Verify {
        /// Directories to scan and/or individual files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Look up a string in a string table by key
    StlGet {
        /// STL file
        file: PathBuf,

        /// Row key (e.g. "LNPC001")
        key: String,

        /// Language index
        #[arg(short, long, default_value_t = 0)]
        language: usize,

        /// Also print description and quest messages
        #[arg(short, long)]
        all: bool,
    },
}
