use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Check LDIF documents against an LDAP schema dump.
#[derive(Debug, Parser)]
#[command(name = "ldifcheck", version)]
pub struct Cmdline {
    /// Enable debug logging.
    #[clap(
        short,
        long,
        global = true,
        env = "LDIFCHECK_DEBUG",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse an LDIF document and print its entries and errors.
    Parse {
        /// LDIF file, or `-` for stdin.
        ldif: PathBuf,
        #[command(flatten)]
        output: OutputOpt,
    },
    /// Parse a schema dump and list its definitions and errors.
    Schema {
        /// Schema dump (`ldapsearch -b cn=Subschema -s base` output), or `-` for stdin.
        schema: PathBuf,
        #[command(flatten)]
        output: OutputOpt,
    },
    /// Validate an LDIF document against a schema dump.
    Validate {
        /// Schema dump to validate against.
        #[clap(short, long, env = "LDIFCHECK_SCHEMA")]
        schema: PathBuf,
        /// LDIF file, or `-` for stdin.
        ldif: PathBuf,
        /// Re-print the entries annotated with warnings.
        #[clap(short, long)]
        annotate: bool,
        #[command(flatten)]
        output: OutputOpt,
    },
}

impl Command {
    pub fn output(&self) -> &OutputOpt {
        match self {
            Command::Parse { output, .. }
            | Command::Schema { output, .. }
            | Command::Validate { output, .. } => output,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct OutputOpt {
    /// Output format.
    #[clap(short, long, value_enum, default_value_t = Format::Text, env = "LDIFCHECK_FORMAT")]
    pub format: Format,
    /// Exit with status 1 when any diagnostic is reported.
    #[clap(long)]
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}
