use std::path::Path;

use once_cell::sync::Lazy;

use crate::language::Language;
use crate::record::{NormalizedRecord, ParseFailure};
use crate::walker;

/// A parsing capability for one language: source text in, ordered normalized
/// records (or a parse-failure signal) out.
pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> Language;

    fn parse(&self, source: &str) -> Result<Vec<NormalizedRecord>, ParseFailure>;
}

/// The built-in adapter: a tree-sitter walk parameterized by language.
///
/// `parse` builds a fresh parser per call, so one adapter instance can serve
/// any number of parallel build tasks.
pub struct TreeSitterAdapter {
    language: Language,
}

impl TreeSitterAdapter {
    #[must_use]
    pub const fn new(language: Language) -> Self {
        Self { language }
    }
}

impl LanguageAdapter for TreeSitterAdapter {
    fn language(&self) -> Language {
        self.language
    }

    fn parse(&self, source: &str) -> Result<Vec<NormalizedRecord>, ParseFailure> {
        walker::parse_source(self.language, source)
    }
}

/// Extension-keyed lookup of language adapters. Selection is by file
/// extension only; adapters never sniff content.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn LanguageAdapter>>,
}

static DEFAULT_REGISTRY: Lazy<AdapterRegistry> = Lazy::new(AdapterRegistry::with_default_adapters);

impl AdapterRegistry {
    /// Registry with the four built-in tree-sitter adapters.
    #[must_use]
    pub fn with_default_adapters() -> Self {
        let mut registry = Self {
            adapters: Vec::new(),
        };
        for language in Language::SUPPORTED {
            registry.register(Box::new(TreeSitterAdapter::new(language)));
        }
        registry
    }

    /// Shared process-wide registry of built-in adapters.
    #[must_use]
    pub fn global() -> &'static AdapterRegistry {
        &DEFAULT_REGISTRY
    }

    pub fn register(&mut self, adapter: Box<dyn LanguageAdapter>) {
        self.adapters.push(adapter);
    }

    #[must_use]
    pub fn for_language(&self, language: Language) -> Option<&dyn LanguageAdapter> {
        self.adapters
            .iter()
            .find(|a| a.language() == language)
            .map(AsRef::as_ref)
    }

    #[must_use]
    pub fn for_path(&self, path: impl AsRef<Path>) -> Option<&dyn LanguageAdapter> {
        self.for_language(Language::from_path(path))
    }

    /// Whether any registered adapter handles this path's extension.
    #[must_use]
    pub fn supports(&self, path: impl AsRef<Path>) -> bool {
        self.for_path(path).is_some()
    }
}
