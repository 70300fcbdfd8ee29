use std::env;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::formatter::FormatError;

/// Name of the external formatter executable.
pub const BINARY_NAME: &str = "lua-format";

/// Config file read by the external tool, probed for at workspace roots.
pub const CONFIG_FILE_NAME: &str = ".lua-format";

/// Host-provided settings: an optional path to a `.lua-format` style config
/// file and an optional override for the formatter executable. Paths may be
/// absolute or workspace-relative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub config_path: Option<String>,
    pub binary_path: Option<String>,
}

impl Settings {
    /// Parse settings from a JSON value as delivered in
    /// `initializationOptions` or `workspace/didChangeConfiguration`.
    /// Accepts the bare object or one nested under a `"lua-format-ls"`
    /// section, since clients namespace their configuration differently.
    pub fn from_value(value: &serde_json::Value) -> Self {
        if let Some(section) = value.get("lua-format-ls")
            && let Ok(settings) = serde_json::from_value(section.clone())
        {
            return settings;
        }
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

/// One fully resolved formatter invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub binary: PathBuf,
    /// Passed to the tool as `-c <path>` when present
    pub config: Option<PathBuf>,
    /// The document's directory, for file-backed documents
    pub working_dir: Option<PathBuf>,
}

/// A resolved invocation plus any warnings to surface at the call site.
/// Resolution itself never talks to the user.
#[derive(Debug)]
pub struct Resolution {
    pub invocation: Invocation,
    pub warnings: Vec<String>,
}

/// Directory containing the running executable, used to locate a bundled
/// `bin/<platform>/lua-format`.
pub fn install_dir() -> io::Result<PathBuf> {
    let exe = env::current_exe()?;
    Ok(exe.parent().unwrap_or(Path::new(".")).to_path_buf())
}

/// Platform directory names used by the bundled binary layout.
fn platform_dir(os: &str) -> Option<&'static str> {
    match os {
        "linux" => Some("linux"),
        "macos" => Some("darwin"),
        "windows" => Some("win32"),
        _ => None,
    }
}

/// Default executable location: `<install-dir>/bin/<platform>/lua-format`.
/// When no bundled binary is present, fall back to a PATH lookup; if that
/// misses too, keep the bundled path so the spawn reports it as missing.
fn default_binary(install_dir: &Path) -> Result<PathBuf, FormatError> {
    let platform = platform_dir(env::consts::OS)
        .ok_or_else(|| FormatError::UnsupportedPlatform(env::consts::OS.to_string()))?;

    let bundled = install_dir.join("bin").join(platform).join(BINARY_NAME);
    if bundled.is_file() {
        return Ok(bundled);
    }

    log::debug!(
        "No bundled binary at {}, trying PATH",
        bundled.display()
    );
    Ok(which::which(BINARY_NAME).unwrap_or(bundled))
}

/// First workspace root under which `path` exists. Pure; the caller decides
/// how to report a miss.
pub fn resolve_against_roots(path: &Path, roots: &[PathBuf]) -> Option<PathBuf> {
    roots.iter().map(|root| root.join(path)).find(|p| p.exists())
}

/// The workspace folder a document belongs to: the first root that is an
/// ancestor of the document path, else the first root.
fn owning_root<'a>(roots: &'a [PathBuf], document_path: Option<&Path>) -> Option<&'a PathBuf> {
    if let Some(doc) = document_path
        && let Some(root) = roots.iter().find(|root| doc.starts_with(root))
    {
        return Some(root);
    }
    roots.first()
}

fn resolve_binary(
    configured: Option<&str>,
    roots: &[PathBuf],
    install_dir: &Path,
) -> Result<PathBuf, FormatError> {
    let Some(configured) = configured else {
        return default_binary(install_dir);
    };

    let path = Path::new(configured);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    if let Some(resolved) = resolve_against_roots(path, roots) {
        return Ok(resolved);
    }
    // A bare command name may still live on PATH. The original tool ships
    // platform binaries alongside itself; a standalone install cannot.
    if path.components().count() == 1
        && let Ok(found) = which::which(configured)
    {
        return Ok(found);
    }

    Err(FormatError::PathNotFound(path.to_path_buf()))
}

fn resolve_config(
    configured: Option<&str>,
    roots: &[PathBuf],
    document_path: Option<&Path>,
    warnings: &mut Vec<String>,
) -> Option<PathBuf> {
    if let Some(configured) = configured {
        let path = Path::new(configured);
        if path.is_absolute() {
            return Some(path.to_path_buf());
        }
        if let Some(resolved) = resolve_against_roots(path, roots) {
            return Some(resolved);
        }
        // Missing config degrades gracefully: warn and let the tool use its
        // built-in defaults.
        warnings.push(format!(
            "config file '{}' not found in any workspace root, using lua-format defaults",
            configured
        ));
        return None;
    }

    let root = owning_root(roots, document_path)?;
    let probe = root.join(CONFIG_FILE_NAME);
    probe.is_file().then_some(probe)
}

/// Resolve one formatter invocation from host settings.
///
/// A missing binary path is fatal; a missing config path only produces a
/// warning. `document_path` supplies the working directory and picks the
/// workspace folder whose root is probed for a `.lua-format` file.
pub fn resolve(
    settings: &Settings,
    roots: &[PathBuf],
    document_path: Option<&Path>,
    install_dir: &Path,
) -> Result<Resolution, FormatError> {
    let mut warnings = Vec::new();

    // Empty strings come from clients with cleared setting fields
    let configured_binary = settings.binary_path.as_deref().filter(|s| !s.is_empty());
    let configured_config = settings.config_path.as_deref().filter(|s| !s.is_empty());

    let binary = resolve_binary(configured_binary, roots, install_dir)?;
    let config = resolve_config(configured_config, roots, document_path, &mut warnings);
    let working_dir = document_path.and_then(Path::parent).map(Path::to_path_buf);

    Ok(Resolution {
        invocation: Invocation {
            binary,
            config,
            working_dir,
        },
        warnings,
    })
}

/// Walk up from `start_dir` looking for the tool's config file. The CLI has
/// no workspace folders, so discovery follows ancestor directories instead.
pub fn find_in_tree(start_dir: &Path) -> Option<PathBuf> {
    for dir in start_dir.ancestors() {
        let p = dir.join(CONFIG_FILE_NAME);
        if p.is_file() {
            return Some(p);
        }
    }
    None
}
