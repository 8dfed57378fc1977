//! CLI argument shape (§6.4, decided in §11.5): a `clap::Parser`-derived
//! `Args` struct with a `clap::Subcommand` split between the server
//! resolver-skeleton generator and the client request-binding variant.
//! `--version`/`--help` come from clap itself.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "graphengine-codegen")]
#[command(about = "Generates resolver skeletons and client bindings from a GraphQL schema")]
#[command(version)]
pub struct Args {
    /// Directory generated declarations ("header equivalent") are written
    /// under. Defaults to the current directory.
    #[arg(long)]
    pub header_dir: Option<PathBuf>,

    /// Directory generated definitions ("source equivalent") are written
    /// under. Defaults to the current directory.
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Omits `__schema`/`__type` wiring from the generated query root.
    #[arg(long)]
    pub no_introspection: bool,

    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Generates the resolver-skeleton declarations/definitions pair for a
    /// service implementing `schema_file`.
    Server {
        schema_file: PathBuf,
        output_prefix: String,
        output_namespace: String,
    },
    /// Generates typed request bindings for a client operation document
    /// against `schema_file`.
    Client {
        schema_file: PathBuf,
        request_file: PathBuf,
        output_prefix: String,
        output_namespace: String,
    },
}
