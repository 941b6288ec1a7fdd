use std::env;
use std::fs;
use std::path::Path;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use turtlelog::{datalog, forward_reason, triples_to_datalog};

#[derive(Parser)]
#[command(name = "turtlelog")]
#[command(about = "Forward-chaining RDFS/OWL reasoner with a Datalog evaluator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run forward reasoning on Turtle ABox and TBox files
    Run {
        /// Instance data (assertions), Turtle format
        abox_path: String,
        /// Schema/ontology definitions, Turtle format
        tbox_path: String,
        /// Output path for the result file
        #[arg(short = 'o', long = "output")]
        output: Option<String>,
        /// Output format: 'ntriple' or 'datalog'
        #[arg(long = "outputType", default_value = "ntriple")]
        output_type: String,
    },
    /// Evaluate a boolean query against a Datalog program
    Dlquery {
        /// Datalog program file
        file: String,
        /// Query, e.g. '?- Ancestor(john, mary).'
        query: String,
    },
    /// Print version and build information
    Version,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            abox_path,
            tbox_path,
            output,
            output_type,
        } => run_reasoning(&abox_path, &tbox_path, output.as_deref(), &output_type),
        Commands::Dlquery { file, query } => run_dlquery(&file, &query),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn run_reasoning(
    abox_path: &str,
    tbox_path: &str,
    output: Option<&str>,
    output_type: &str,
) -> Result<()> {
    if !file_exists(abox_path) {
        bail!("ABox file '{abox_path}' does not exist");
    }
    if !file_exists(tbox_path) {
        bail!("TBox file '{tbox_path}' does not exist");
    }
    if !is_turtle_file(abox_path) {
        bail!("file '{abox_path}' does not appear to be a Turtle file");
    }
    if !is_turtle_file(tbox_path) {
        bail!("file '{tbox_path}' does not appear to be a Turtle file");
    }
    if output_type != "ntriple" && output_type != "datalog" {
        bail!("invalid output type '{output_type}', must be 'ntriple' or 'datalog'");
    }

    let output_path = determine_output_path(output, abox_path);

    let abox = fs::read_to_string(abox_path)
        .with_context(|| format!("reading ABox file '{abox_path}'"))?;
    let tbox = fs::read_to_string(tbox_path)
        .with_context(|| format!("reading TBox file '{tbox_path}'"))?;

    println!("Running forward reasoning on '{abox_path}' and '{tbox_path}'...");
    let triples = forward_reason(&abox, &tbox)?;

    let output_lines = if output_type == "datalog" {
        triples_to_datalog(&triples)
    } else {
        triples
    };

    write_lines(&output_lines, &output_path)
        .with_context(|| format!("writing output file '{output_path}'"))?;

    println!("✓ Forward reasoning completed successfully and saved to: {output_path}");
    println!(
        "  Total triples: {} (format: {output_type})",
        output_lines.len()
    );

    Ok(())
}

fn run_dlquery(file: &str, query: &str) -> Result<()> {
    let content =
        fs::read_to_string(file).with_context(|| format!("reading Datalog file '{file}'"))?;
    let result = datalog::dl_query(&content, query)?;
    println!("{result}");
    Ok(())
}

fn print_version() {
    println!(
        "{} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "  Built with {} on {}",
        env!("BUILD_RUSTC"),
        env!("BUILD_TIMESTAMP")
    );
    println!("  Git ref: {}", env!("GIT_REVISION"));
    println!("  Target: {}", env!("BUILD_TARGET"));
}

fn file_exists(path: &str) -> bool {
    Path::new(path).is_file()
}

fn is_turtle_file(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            ext == "ttl" || ext == "turtle" || ext == "n3"
        })
        .unwrap_or(false)
}

/// Output goes to the explicit `-o` path if given, then to the override env
/// var, then next to the ABox input with `_inferred.nt` appended.
fn determine_output_path(provided: Option<&str>, abox_path: &str) -> String {
    if let Some(path) = provided {
        return path.to_string();
    }

    if let Ok(path) = env::var("GOREASONER_OUTPUT_PATH") {
        if !path.is_empty() {
            return path;
        }
    }

    let mut base = abox_path;
    for ext in [".ttl", ".turtle", ".n3"] {
        base = base.strip_suffix(ext).unwrap_or(base);
    }
    format!("{base}_inferred.nt")
}

fn write_lines(lines: &[String], path: &str) -> std::io::Result<()> {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    fs::write(path, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turtle_extensions_are_case_insensitive() {
        assert!(is_turtle_file("data.ttl"));
        assert!(is_turtle_file("data.TTL"));
        assert!(is_turtle_file("data.turtle"));
        assert!(is_turtle_file("data.N3"));
        assert!(!is_turtle_file("data.rdf"));
        assert!(!is_turtle_file("data"));
    }

    #[test]
    fn default_output_path_strips_the_turtle_extension() {
        env::remove_var("GOREASONER_OUTPUT_PATH");
        assert_eq!(
            determine_output_path(None, "abox.ttl"),
            "abox_inferred.nt"
        );
        assert_eq!(
            determine_output_path(None, "dir/data.turtle"),
            "dir/data_inferred.nt"
        );
        assert_eq!(
            determine_output_path(Some("out.nt"), "abox.ttl"),
            "out.nt"
        );
    }
}
