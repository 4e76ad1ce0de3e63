// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Capabilities a connection borrows from its host

use std::fmt;
use std::sync::Arc;

use crate::http::{
    DiagnosticSink, FsLocalFiles, LocalFiles, SchemeClassifier, TracingSink, UriClassifier,
};

/// Host capabilities injected into a connection
#[derive(Clone)]
pub struct ConnectionContext {
    /// Decides which URIs go over the network
    pub classifier: Arc<dyn UriClassifier>,
    /// Opens local files and attachments
    pub local_files: Arc<dyn LocalFiles>,
    /// Receives network diagnostics
    pub diagnostics: Arc<dyn DiagnosticSink>,
}

impl ConnectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classifier(mut self, classifier: Arc<dyn UriClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn local_files(mut self, local_files: Arc<dyn LocalFiles>) -> Self {
        self.local_files = local_files;
        self
    }

    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }
}

impl Default for ConnectionContext {
    fn default() -> Self {
        Self {
            classifier: Arc::new(SchemeClassifier),
            local_files: Arc::new(FsLocalFiles::new()),
            diagnostics: Arc::new(TracingSink),
        }
    }
}

impl fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionContext").finish_non_exhaustive()
    }
}
