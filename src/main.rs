use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use similar::{ChangeTag, TextDiff};

use lua_format_ls::config::{self, Settings};
use lua_format_ls::{FormatError, FormatOutput, format};

mod cli;
use cli::{Cli, Commands};

fn read_all(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn start_dir_for(input_path: &Option<PathBuf>) -> io::Result<PathBuf> {
    if let Some(p) = input_path {
        Ok(p.parent().unwrap_or(Path::new(".")).to_path_buf())
    } else {
        std::env::current_dir()
    }
}

fn print_diff(file_path: &str, original: &str, formatted: &str) {
    let diff = TextDiff::from_lines(original, formatted);

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            println!("---");
        }

        // Print header similar to rustfmt
        println!("Diff in {}:{}:", file_path, group[0].old_range().start + 1);

        for op in group {
            for change in diff.iter_changes(op) {
                let (sign, style) = match change.tag() {
                    ChangeTag::Delete => ("-", "\x1b[31m"), // red
                    ChangeTag::Insert => ("+", "\x1b[32m"), // green
                    ChangeTag::Equal => (" ", "\x1b[0m"),   // normal
                };

                print!("{}{}{}", style, sign, change.value());

                // Reset color at end of line if it was colored
                if change.tag() != ChangeTag::Equal {
                    print!("\x1b[0m");
                }
            }
        }
    }
}

/// Resolve and run one formatter invocation on a fresh runtime. Any failure
/// prints the tool's error output and exits non-zero.
fn run_formatter(input: &str, settings: &Settings, start_dir: &Path, file: Option<&Path>) -> io::Result<FormatOutput> {
    let install_dir = config::install_dir()?;
    let roots = vec![start_dir.to_path_buf()];

    let resolution = match config::resolve(settings, &roots, file, &install_dir) {
        Ok(resolution) => resolution,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    for warning in &resolution.warnings {
        log::warn!("{warning}");
    }

    let rt = tokio::runtime::Runtime::new()?;
    match rt.block_on(format(input, &resolution.invocation)) {
        Ok(output) => Ok(output),
        Err(e) => {
            // Display for a non-zero exit already carries the tool's stderr
            if let FormatError::EmptyOutput { stderr } = &e
                && !stderr.is_empty()
            {
                eprint!("{stderr}");
            }
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Format { file, check, write } => {
            let start_dir = start_dir_for(&file)?;

            let mut settings = Settings {
                config_path: cli.config.as_ref().map(|p| p.to_string_lossy().into_owned()),
                binary_path: cli.binary.as_ref().map(|p| p.to_string_lossy().into_owned()),
            };

            // The command line has no workspace folders; walk ancestor
            // directories of the input for a .lua-format instead
            if settings.config_path.is_none()
                && let Some(found) = config::find_in_tree(&start_dir)
            {
                log::debug!("Using config from: {}", found.display());
                settings.config_path = Some(found.to_string_lossy().into_owned());
            }

            let input = read_all(file.as_ref())?;
            let output = run_formatter(&input, &settings, &start_dir, file.as_deref())?;

            // The tool may chatter on stderr even when it succeeds
            if !output.stderr.is_empty() {
                eprint!("{}", output.stderr);
            }

            if check {
                if input != output.text {
                    let file_name = file.as_ref().and_then(|p| p.to_str()).unwrap_or("<stdin>");
                    print_diff(file_name, &input, &output.text);
                    std::process::exit(1);
                }
                // Only print success message if there's a file (not stdin)
                if file.is_some() {
                    println!("File is correctly formatted");
                }
            } else if write {
                let Some(file_path) = &file else {
                    eprintln!("error: --write requires a file argument");
                    std::process::exit(2);
                };
                fs::write(file_path, &output.text)?;
                println!("Formatted {}", file_path.display());
            } else {
                // Stdin or default: output to stdout
                print!("{}", output.text);
            }

            Ok(())
        }
        #[cfg(feature = "lsp")]
        Commands::Lsp => {
            // LSP needs tokio runtime
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async { lua_format_ls::lsp::run().await })?;
            Ok(())
        }
    }
}
