//! Command execution implementations

use super::Commands;
use super::{codec_options, info, json, stl, verify};

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Info { files, encoding } => info::execute(files, &codec_options(*encoding)),
            Commands::Dump {
                source,
                output,
                encoding,
            } => json::dump(source, output.as_deref(), &codec_options(*encoding)),
            Commands::Build {
                source,
                destination,
                encoding,
            } => json::build(source, destination, &codec_options(*encoding)),
            Commands::Verify { paths, quiet } => verify::execute(paths, *quiet),
            Commands::StlGet {
                file,
                key,
                language,
                all,
            } => stl::get(file, key, *language, *all),
        }
    }
}
