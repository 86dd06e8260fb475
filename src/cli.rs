use std::path::PathBuf;

use clap::Parser;

use crate::generate::GenerationMode;

pub const DEFAULT_INPUT_DIR: &str = "CSV_files";
pub const DEFAULT_OUTPUT: &str = "Populate.txt";

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Generate a transactional SQL populate script from CSV files",
    long_about = None
)]
pub struct Cli {
    /// Directory containing the source CSV files
    #[arg(short = 'd', long = "input-dir", default_value = DEFAULT_INPUT_DIR)]
    pub input_dir: PathBuf,
    /// Output script path (`-` writes to stdout)
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,
    /// YAML file replacing the built-in source list and table schemas
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Skip schema validation and emit any numeric-looking value unquoted
    #[arg(long = "untyped")]
    pub untyped: bool,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Print the effective configuration as YAML and exit
    #[arg(long = "print-config")]
    pub print_config: bool,
}

impl Cli {
    pub fn mode(&self) -> GenerationMode {
        if self.untyped {
            GenerationMode::Untyped
        } else {
            GenerationMode::SchemaAware
        }
    }
}
