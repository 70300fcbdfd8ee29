use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_lsp_server::jsonrpc::Result;
use tower_lsp_server::ls_types::*;
use tower_lsp_server::{Client, LanguageServer, LspService, Server};

use crate::config::{self, Settings};
use crate::diagnostics;
use crate::formatter::{self, FormatError};

/// Convert a formatter stderr diagnostic to an LSP diagnostic. The range is
/// zero-width at the reported position.
fn convert_diagnostic(diag: &diagnostics::Diagnostic) -> Diagnostic {
    let position = Position {
        line: diag.line,
        character: diag.column,
    };

    Diagnostic {
        range: Range {
            start: position,
            end: position,
        },
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some("lua-format".to_string()),
        message: diag.message.clone(),
        ..Default::default()
    }
}

/// Range spanning the entire document, trailing newline included. The end
/// character is counted in UTF-16 code units as LSP requires.
fn full_document_range(text: &str) -> Range {
    let mut line = 0u32;
    let mut character = 0u32;
    for c in text.chars() {
        if c == '\n' {
            line += 1;
            character = 0;
        } else {
            character += c.len_utf16() as u32;
        }
    }

    Range {
        start: Position {
            line: 0,
            character: 0,
        },
        end: Position { line, character },
    }
}

fn request_error(e: &FormatError) -> tower_lsp_server::jsonrpc::Error {
    let mut err = tower_lsp_server::jsonrpc::Error::internal_error();
    err.message = e.to_string().into();
    err
}

pub struct LuaFormatLsp {
    client: Client,
    // Use String keys since Uri doesn't implement Send
    document_map: Arc<Mutex<HashMap<String, String>>>,
    workspace_roots: Arc<Mutex<Vec<PathBuf>>>,
    settings: Arc<Mutex<Settings>>,
}

impl LuaFormatLsp {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            document_map: Arc::new(Mutex::new(HashMap::new())),
            workspace_roots: Arc::new(Mutex::new(Vec::new())),
            settings: Arc::new(Mutex::new(Settings::default())),
        }
    }

    /// Test-only window into server state.
    pub fn document_map(&self) -> Arc<Mutex<HashMap<String, String>>> {
        Arc::clone(&self.document_map)
    }

    /// Replace the document's diagnostic set with whatever the formatter's
    /// error stream reported. An empty stream clears the set, so markers
    /// always reflect only the most recent run.
    async fn publish_stderr_diagnostics(&self, uri: Uri, stderr: &str) {
        let lsp_diagnostics: Vec<Diagnostic> = diagnostics::parse_stderr(stderr)
            .iter()
            .map(convert_diagnostic)
            .collect();

        self.client
            .publish_diagnostics(uri, lsp_diagnostics, None)
            .await;
    }
}

impl LanguageServer for LuaFormatLsp {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Record workspace roots in order for relative-path resolution.
        // Try workspace_folders first, fall back to deprecated root_uri
        if let Some(folders) = params.workspace_folders
            && !folders.is_empty()
        {
            let roots: Vec<PathBuf> = folders
                .iter()
                .filter_map(|folder| folder.uri.to_file_path())
                .map(|path| path.into_owned())
                .collect();
            *self.workspace_roots.lock().await = roots;
        } else {
            #[allow(deprecated)]
            if let Some(root_uri) = params.root_uri
                && let Some(path) = root_uri.to_file_path()
            {
                *self.workspace_roots.lock().await = vec![path.into_owned()];
            }
        }

        if let Some(options) = params.initialization_options {
            *self.settings.lock().await = Settings::from_value(&options);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        ..Default::default()
                    },
                )),
                document_formatting_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "lua-format-ls".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "lua-format-ls initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.to_string();

        self.document_map
            .lock()
            .await
            .insert(uri.clone(), params.text_document.text);

        self.client
            .log_message(MessageType::INFO, format!("Opened document: {}", uri))
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.to_string();

        let mut document_map = self.document_map.lock().await;
        if let Some(text) = document_map.get_mut(&uri) {
            // Full sync: every change event carries the complete document
            for change in params.content_changes {
                *text = change.text;
            }
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri.to_string();
        self.document_map.lock().await.remove(&uri);

        // Clear diagnostics
        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let settings = Settings::from_value(&params.settings);
        log::debug!("Settings updated: {:?}", settings);
        *self.settings.lock().await = settings;
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let uri = params.text_document.uri;
        let uri_string = uri.to_string();

        self.client
            .log_message(
                MessageType::INFO,
                format!("Formatting request for {}", uri_string),
            )
            .await;

        // Get document content (clone to avoid holding lock across await)
        let text = {
            let document_map = self.document_map.lock().await;
            match document_map.get(&uri_string) {
                Some(t) => t.clone(),
                None => {
                    self.client
                        .log_message(
                            MessageType::ERROR,
                            format!("Document not found: {}", uri_string),
                        )
                        .await;
                    return Ok(None);
                }
            }
        };

        let document_path = uri.to_file_path().map(|path| path.into_owned());
        let settings = self.settings.lock().await.clone();
        let roots = self.workspace_roots.lock().await.clone();
        let install_dir = config::install_dir().unwrap_or_else(|_| PathBuf::from("."));

        // Resolution failures abort before any process runs, so the
        // document's diagnostics are left untouched.
        let resolution =
            match config::resolve(&settings, &roots, document_path.as_deref(), &install_dir) {
                Ok(resolution) => resolution,
                Err(e) => {
                    self.client
                        .show_message(MessageType::ERROR, e.to_string())
                        .await;
                    return Err(request_error(&e));
                }
            };

        for warning in &resolution.warnings {
            self.client
                .show_message(MessageType::WARNING, warning.clone())
                .await;
        }

        match formatter::format(&text, &resolution.invocation).await {
            Ok(output) => {
                // The tool may report problems even on success
                self.publish_stderr_diagnostics(uri, &output.stderr).await;

                Ok(Some(vec![TextEdit {
                    range: full_document_range(&text),
                    new_text: output.text,
                }]))
            }
            Err(e) => {
                // Diagnostics still reflect the run whenever the process
                // actually ran; a spawn failure leaves them untouched.
                if let Some(stderr) = e.stderr() {
                    self.publish_stderr_diagnostics(uri, stderr).await;
                }

                self.client
                    .show_message(MessageType::ERROR, e.to_string())
                    .await;
                Err(request_error(&e))
            }
        }
    }
}

pub async fn run() -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(LuaFormatLsp::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
