//! # rosefiles
//!
//! A pure-Rust library for reading and writing ROSE Online binary resource files.
//!
//! ## Supported Formats
//!
//! - **ZMS** - Model geometry (versions 5 to 8)
//! - **ZMO** - Skeletal and morph animation
//! - **ZON / TIL / HIM** - Zone descriptions, tile grids and height maps
//! - **IFO** - Per-block map object data
//! - **ZSC** - Model lists and scene object catalogs
//! - **STB / STL** - Data tables and localized string tables
//! - **AIP** - Monster and NPC behaviour scripts
//!
//! ## Quick Start
//!
//! ### Loading a Document
//!
//! ```no_run
//! use rosefiles::prelude::*;
//!
//! let table = DataFile::load("3DDATA/STB/LIST_NPC.STB")?;
//! println!("{} rows, {} columns", table.row_count(), table.column_count());
//!
//! let npc_name = table.cell(1, 0)?;
//! println!("First NPC: {npc_name}");
//! # Ok::<(), rosefiles::Error>(())
//! ```
//!
//! ### Choosing a Text Encoding
//!
//! Strings default to EUC-KR (UTF-8 for string tables). Override per call:
//!
//! ```no_run
//! use rosefiles::prelude::*;
//!
//! let options = CodecOptions::new().with_encoding(TextEncoding::Utf8);
//! let zone = ZoneFile::load_with("3DDATA/MAPS/JUNON/JDT01/JDT01.ZON", &options)?;
//! println!("{}", zone.economy.area_name);
//! # Ok::<(), rosefiles::Error>(())
//! ```
//!
//! ### Working With Any Format
//!
//! ```no_run
//! use rosefiles::prelude::*;
//!
//! let document = RoseDocument::load("3DDATA/AI/AI_JELLYBEAN.AIP")?;
//! println!("{}: {}", document.file_type(), document.summary());
//! std::fs::write("jellybean.json", document.to_json()?)?;
//! # Ok::<(), rosefiles::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `rosefiles` command-line binary

pub mod batch;
pub mod document;
pub mod error;
pub mod formats;
pub mod io;
pub mod types;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::formats::{
        AnimationFile, ArtificialIntelligenceFile, DataFile, HeightmapFile, MapDataFile,
        ModelFile, ModelListFile, RoseFile, StringTableFile, TileFile, ZoneFile,
    };
    pub use crate::io::{CodecOptions, TextEncoding};
    pub use crate::types::{BoundingBox, Color3, Color4, Grid};

    pub use crate::document::{FileType, RoseDocument};
    pub use crate::batch::{BatchVerifyResult, VerifyStatus, batch_verify, find_resource_files};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
