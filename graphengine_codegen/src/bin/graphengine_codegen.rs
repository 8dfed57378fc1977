use std::fs;
use std::path::Path;

use clap::Parser;
use graphengine_codegen::args::{Args, Command};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (schema_file, output_prefix, output_namespace, request_file) = match &args.command {
        Command::Server { schema_file, output_prefix, output_namespace } => (schema_file, output_prefix, output_namespace, None),
        Command::Client { schema_file, request_file, output_prefix, output_namespace } => (schema_file, output_prefix, output_namespace, Some(request_file)),
    };

    if args.verbose {
        println!("Reading schema from {}", schema_file.display());
        if let Some(request_file) = request_file {
            println!("Reading request document from {}", request_file.display());
        }
    }

    let schema_source = fs::read_to_string(schema_file).map_err(|err| anyhow::anyhow!("failed to read {}: {err}", schema_file.display()))?;

    // The client variant additionally validates `request_file` parses, but
    // request-bound typed bindings are not generated yet; only the server
    // resolver skeleton is emitted either way.
    if let Some(request_file) = request_file {
        let request_source = fs::read_to_string(request_file).map_err(|err| anyhow::anyhow!("failed to read {}: {err}", request_file.display()))?;
        graphengine::parser::parse_document_source(&request_source, 1)?;
    }

    let artifacts = graphengine_codegen::generate(&schema_source, output_namespace, !args.no_introspection)?;

    let header_dir = args.header_dir.unwrap_or_else(|| Path::new(".").to_owned());
    let source_dir = args.source_dir.unwrap_or_else(|| Path::new(".").to_owned());
    fs::create_dir_all(&header_dir)?;
    fs::create_dir_all(&source_dir)?;

    let declarations_path = header_dir.join(format!("{output_prefix}_types.rs"));
    let definitions_path = source_dir.join(format!("{output_prefix}_resolvers.rs"));
    fs::write(&declarations_path, artifacts.declarations)?;
    fs::write(&definitions_path, artifacts.definitions)?;

    if args.verbose {
        println!("Wrote {}", declarations_path.display());
        println!("Wrote {}", definitions_path.display());
    }

    Ok(())
}
