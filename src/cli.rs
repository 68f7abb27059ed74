use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Mode {
    /// Schema elements drive class generation.
    Element,
    /// Schema types drive class generation; elements with named types are
    /// skipped.
    Type,
}

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[arg(help = "The source file or URL")]
    pub input: String,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory to write generated sources into (stdout when omitted)"
    )]
    pub out_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "element")]
    pub mode: Mode,

    #[arg(long, help = "Package for classes generated from the input schema")]
    pub package: Option<String>,

    #[arg(
        long = "map",
        value_name = "NAMESPACE=PACKAGE",
        help = "Map a namespace to a package (repeatable)"
    )]
    pub map: Vec<String>,

    #[arg(long, help = "Also generate classes for imported schemas")]
    pub generate_imported: bool,

    #[arg(long, help = "Allow a XML Document Type Definition (DTD) to occur")]
    pub allow_dtd: bool,
}
