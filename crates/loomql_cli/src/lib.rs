//! Command-line interface for loomql.
//!
//! # Usage
//!
//! ```bash
//! # Compose fragment files and report violations
//! loomql check query.graphql mutations.graphql
//!
//! # Compose and print the merged SDL
//! loomql print schema/*.graphql
//!
//! # Compose and dump the type graph as JSON
//! loomql graph schema/*.graphql
//! ```
//!
//! Files are composed in the order given, which is also how fragment
//! positions show up in error output.

use clap::{Parser, Subcommand};
use colored::Colorize;
use loomql_compose::{compose, ComposeError, ResolverMap, TypeEntry, TypeGraph};
use loomql_core::Location;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "loomql")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compose fragment files and report every violation
    Check {
        /// Fragment files, in composition order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Compose fragment files and print the merged SDL
    Print {
        /// Fragment files, in composition order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write the SDL here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compose fragment files and dump the type graph as JSON
    Graph {
        /// Fragment files, in composition order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print version information
    Version,
}

pub fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Check { files } => check_files(&files, cli.verbose, cli.quiet),
        Commands::Print { files, output } => print_sdl(&files, output.as_deref(), cli.quiet),
        Commands::Graph { files } => print_graph(&files),
        Commands::Version => {
            println!("loomql {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

fn check_files(
    files: &[PathBuf],
    verbose: bool,
    quiet: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let sources = read_sources(files, verbose)?;

    match compose(&sources, ResolverMap::new()) {
        Ok(schema) => {
            if !quiet {
                println!(
                    "{} {} fragment(s) composed into {} type(s)",
                    "Success:".green().bold(),
                    files.len(),
                    declared_types(schema.graph()),
                );
            }
            Ok(0)
        }
        Err(error) => {
            report(&error, files, &sources);
            Ok(1)
        }
    }
}

fn print_sdl(
    files: &[PathBuf],
    output: Option<&Path>,
    quiet: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let sources = read_sources(files, false)?;

    match compose(&sources, ResolverMap::new()) {
        Ok(schema) => {
            let sdl = schema.to_sdl();
            match output {
                Some(path) => {
                    std::fs::write(path, &sdl)?;
                    if !quiet {
                        println!("{} {}", "Wrote".green(), path.display());
                    }
                }
                None => print!("{sdl}"),
            }
            Ok(0)
        }
        Err(error) => {
            report(&error, files, &sources);
            Ok(1)
        }
    }
}

fn print_graph(files: &[PathBuf]) -> Result<i32, Box<dyn std::error::Error>> {
    let sources = read_sources(files, false)?;

    match compose(&sources, ResolverMap::new()) {
        Ok(schema) => {
            println!("{}", serde_json::to_string_pretty(schema.graph())?);
            Ok(0)
        }
        Err(error) => {
            report(&error, files, &sources);
            Ok(1)
        }
    }
}

fn read_sources(
    files: &[PathBuf],
    verbose: bool,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        if verbose {
            println!("{} {}", "Reading".blue(), file.display());
        }
        debug!(file = %file.display(), "reading fragment");
        sources.push(std::fs::read_to_string(file)?);
    }
    Ok(sources)
}

fn report(error: &ComposeError, files: &[PathBuf], sources: &[String]) {
    eprintln!("{} {error}", "Error:".red().bold());
    match error {
        ComposeError::Syntax { diagnostics } => {
            for diagnostic in diagnostics {
                let place = diagnostic
                    .primary_location()
                    .map(|loc| place_of(loc, files, sources))
                    .unwrap_or_default();
                eprintln!(
                    "  {} {place}[{}] {}",
                    "-->".blue(),
                    diagnostic.code,
                    diagnostic.title
                );
            }
        }
        ComposeError::Invalid { violations } => {
            for violation in violations {
                let place = violation
                    .location()
                    .map(|loc| place_of(loc, files, sources))
                    .unwrap_or_default();
                eprintln!(
                    "  {} {place}[{}] {violation}",
                    "-->".blue(),
                    violation.code()
                );
            }
        }
    }
}

/// Renders a location as `file:line ` for error output.
fn place_of(location: Location, files: &[PathBuf], sources: &[String]) -> String {
    let index = location.fragment.index();
    match (files.get(index), sources.get(index)) {
        (Some(file), Some(source)) => format!(
            "{}:{} ",
            file.display(),
            line_of(source, location.span.start)
        ),
        _ => String::new(),
    }
}

fn line_of(source: &str, offset: u32) -> usize {
    let offset = (offset as usize).min(source.len());
    source.bytes().take(offset).filter(|&b| b == b'\n').count() + 1
}

fn declared_types(graph: &TypeGraph) -> usize {
    graph
        .types()
        .filter(|(_, entry)| !matches!(entry, TypeEntry::Scalar(scalar) if scalar.builtin))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_line_of() {
        assert_eq!(line_of("a\nb\nc", 0), 1);
        assert_eq!(line_of("a\nb\nc", 2), 2);
        assert_eq!(line_of("a\nb\nc", 4), 3);
        assert_eq!(line_of("abc", 99), 1);
    }

    #[test]
    fn test_declared_types_skips_builtins() {
        let sources = ["type Query { ok: Boolean }".to_string()];
        let schema = compose(&sources, ResolverMap::new()).expect("should compose");
        assert_eq!(declared_types(schema.graph()), 1);
    }
}
