use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lua-format-ls")]
#[command(author, version)]
#[command(about = "Format Lua source through the lua-format executable")]
#[command(
    long_about = "lua-format-ls is a thin bridge over the external lua-format tool. It pipes \
    documents through the tool on stdin/stdout, as a one-shot CLI or as a language server that \
    editors use for document formatting and syntax-error markers."
)]
#[command(after_help = "\
EXAMPLES:

    # Format a file to stdout
    lua-format-ls format init.lua

    # Format from stdin
    cat init.lua | lua-format-ls format

    # Check if a file is formatted
    lua-format-ls format --check init.lua

    # Format in place
    lua-format-ls format --write init.lua

    # Use a custom style file
    lua-format-ls format --config style/.lua-format init.lua

CONFIGURATION:

lua-format-ls looks for the tool's style file in this order:
  1. Explicit --config path
  2. .lua-format in the input file's directory or its parents
  3. lua-format's built-in defaults

The style file itself belongs to lua-format and is passed through verbatim \
with -c; see the lua-format documentation for its options.

The lua-format binary is located via --binary, a bundled \
bin/<platform>/lua-format next to this executable, or PATH.")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a lua-format style file
    #[arg(long, global = true)]
    #[arg(help = "Path to a lua-format style file (passed to the tool as -c)")]
    #[arg(
        long_help = "Path to a lua-format style file, passed to the tool as -c. If not \
        specified, lua-format-ls searches for .lua-format in the input file's directory and \
        its parents, then falls back to the tool's built-in defaults."
    )]
    pub config: Option<PathBuf>,

    /// Path to the lua-format executable
    #[arg(long, global = true)]
    #[arg(help = "Path to the lua-format executable")]
    #[arg(
        long_help = "Overrides where the lua-format executable is found. If not specified, \
        lua-format-ls looks for a bundled bin/<platform>/lua-format next to its own \
        executable, then for lua-format on PATH."
    )]
    pub binary: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Format a Lua document with lua-format
    #[command(
        long_about = "Pipe a Lua document through the external lua-format tool. By default, \
        outputs the formatted content to stdout. Use --write to format in place or --check \
        to verify formatting without making changes."
    )]
    #[command(after_help = "\
EXAMPLES:

    # Format to stdout
    lua-format-ls format init.lua

    # Format from stdin
    echo 'local x=1' | lua-format-ls format

    # Check formatting (exit code 1 if not formatted)
    lua-format-ls format --check init.lua

    # Format in place
    lua-format-ls format --write init.lua

Syntax errors reported by lua-format (lines like 'line 3:5: unexpected \
symbol') are passed through on stderr and the command exits non-zero.")]
    Format {
        /// Input file (stdin if not provided)
        #[arg(help = "Input file path")]
        #[arg(
            long_help = "Path to the Lua file to format. If not provided, reads from stdin. \
            The file's directory becomes the tool's working directory and the starting point \
            for .lua-format discovery."
        )]
        file: Option<PathBuf>,

        /// Check if the file is formatted without making changes
        #[arg(long)]
        #[arg(help = "Check if file is formatted (exit code 1 if not)")]
        #[arg(
            long_help = "Check if the file is already formatted according to lua-format \
            without making any changes. If the file is not formatted, displays a diff and \
            exits with code 1. If formatted, exits with code 0. Useful for CI/CD pipelines."
        )]
        check: bool,

        /// Format the file in place
        #[arg(long)]
        #[arg(help = "Format the file in place")]
        #[arg(
            long_help = "Write the formatted output back to the input file, modifying it in \
            place. Cannot be used with stdin input. It's recommended to use version control \
            before using this option."
        )]
        write: bool,
    },
    /// Start the Language Server Protocol server
    #[cfg(feature = "lsp")]
    #[command(
        long_about = "Start the lua-format-ls Language Server Protocol (LSP) server for \
        editor integration. The server registers as a document-formatting provider and \
        publishes lua-format's syntax errors as diagnostics."
    )]
    #[command(after_help = "\
The LSP server communicates via stdin/stdout and is typically launched automatically by your \
editor's LSP client. You generally don't need to run this command manually.

Client settings are read from initializationOptions and \
workspace/didChangeConfiguration: configPath (style file, workspace-relative or absolute) \
and binaryPath (lua-format executable override).")]
    Lsp,
}
