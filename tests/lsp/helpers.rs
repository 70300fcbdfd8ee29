//! Test helpers for LSP integration testing
//!
//! This module provides utilities to test LSP functionality in-memory
//! without spawning the binary or dealing with stdio protocol.

#[cfg(unix)]
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_lsp_server::ls_types::*;
use tower_lsp_server::{LanguageServer, LspService};

use lua_format_ls::lsp::LuaFormatLsp;

/// Test harness for LSP integration tests.
///
/// Wraps a `LuaFormatLsp` instance created via `LspService::new`.
/// Provides helper methods for common LSP operations.
pub struct TestLspServer {
    lsp: Arc<LuaFormatLsp>,
}

impl TestLspServer {
    /// Create a new test LSP server.
    ///
    /// This creates a real `LuaFormatLsp` instance with a real `Client`,
    /// using the same `LspService::new` pattern as production code.
    pub fn new() -> Self {
        // Use Arc to share ownership between the closure and our return value
        let lsp_arc: Arc<std::sync::Mutex<Option<Arc<LuaFormatLsp>>>> =
            Arc::new(std::sync::Mutex::new(None));
        let lsp_arc_clone = Arc::clone(&lsp_arc);

        let (_service, _socket) = LspService::new(move |client| {
            let lsp = Arc::new(LuaFormatLsp::new(client));
            *lsp_arc_clone.lock().unwrap() = Some(Arc::clone(&lsp));

            // Return the Arc wrapped in a struct that implements LanguageServer
            LspWrapper { inner: lsp }
        });

        // Extract the LuaFormatLsp Arc
        let lsp = lsp_arc
            .lock()
            .unwrap()
            .take()
            .expect("LuaFormatLsp should have been initialized");

        Self { lsp }
    }

    /// Run the `initialize` handshake with the given settings, simulating a
    /// client that passes them as `initializationOptions`.
    pub async fn initialize_with_options(&self, options: serde_json::Value) {
        let params = InitializeParams {
            initialization_options: Some(options),
            ..Default::default()
        };

        self.lsp.initialize(params).await.unwrap();
    }

    /// Open a document with the given URI and content.
    ///
    /// Simulates the `textDocument/didOpen` notification.
    pub async fn open_document(&self, uri: &str, content: &str) {
        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.parse().unwrap(),
                language_id: "lua".to_string(),
                version: 0,
                text: content.to_string(),
            },
        };

        self.lsp.did_open(params).await;
    }

    /// Close a document.
    ///
    /// Simulates the `textDocument/didClose` notification.
    pub async fn close_document(&self, uri: &str) {
        let params = DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier {
                uri: uri.parse().unwrap(),
            },
        };

        self.lsp.did_close(params).await;
    }

    /// Replace a document's content.
    ///
    /// Simulates the `textDocument/didChange` notification with FULL sync.
    pub async fn edit_document(&self, uri: &str, text: &str) {
        let params = DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri.parse().unwrap(),
                version: 1,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: text.to_string(),
            }],
        };

        self.lsp.did_change(params).await;
    }

    /// Format a document, panicking if the request is rejected.
    ///
    /// Simulates the `textDocument/formatting` request.
    pub async fn format_document(&self, uri: &str) -> Option<Vec<TextEdit>> {
        self.try_format_document(uri).await.unwrap()
    }

    /// Format a document, returning the raw request result so failure paths
    /// can be asserted on.
    pub async fn try_format_document(
        &self,
        uri: &str,
    ) -> tower_lsp_server::jsonrpc::Result<Option<Vec<TextEdit>>> {
        let params = DocumentFormattingParams {
            text_document: TextDocumentIdentifier {
                uri: uri.parse().unwrap(),
            },
            options: FormattingOptions {
                tab_size: 2,
                insert_spaces: true,
                ..Default::default()
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
        };

        self.lsp.formatting(params).await
    }

    /// Push new settings, simulating `workspace/didChangeConfiguration`.
    pub async fn change_configuration(&self, settings: serde_json::Value) {
        let params = DidChangeConfigurationParams { settings };
        self.lsp.did_change_configuration(params).await;
    }

    /// Get the current content of a document from the server's state.
    ///
    /// This is a test-only method to inspect internal state.
    pub async fn get_document_content(&self, uri: &str) -> Option<String> {
        let doc_map = self.lsp.document_map();
        let docs = doc_map.lock().await;
        docs.get(uri).cloned()
    }
}

/// Wrapper that delegates all LanguageServer methods to the inner Arc.
///
/// This is needed because LspService requires ownership of the LanguageServer
/// impl, but we also need to retain a reference for testing.
struct LspWrapper {
    inner: Arc<LuaFormatLsp>,
}

impl LanguageServer for LspWrapper {
    async fn initialize(
        &self,
        params: InitializeParams,
    ) -> tower_lsp_server::jsonrpc::Result<InitializeResult> {
        self.inner.initialize(params).await
    }

    async fn initialized(&self, params: InitializedParams) {
        self.inner.initialized(params).await
    }

    async fn shutdown(&self) -> tower_lsp_server::jsonrpc::Result<()> {
        self.inner.shutdown().await
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.inner.did_open(params).await
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.inner.did_change(params).await
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.inner.did_close(params).await
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.inner.did_change_configuration(params).await
    }

    async fn formatting(
        &self,
        params: DocumentFormattingParams,
    ) -> tower_lsp_server::jsonrpc::Result<Option<Vec<TextEdit>>> {
        self.inner.formatting(params).await
    }
}

/// Write a small executable shell script that stands in for lua-format.
#[cfg(unix)]
pub fn fake_formatter(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
