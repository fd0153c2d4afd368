use std::collections::HashMap;

use atlas_model::NodeId;

/// One name declared somewhere in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub id: NodeId,
    pub name: String,
    pub path: String,
    /// Directory of `path`, `"."` for files in the repo root.
    pub package: String,
}

impl Declaration {
    #[must_use]
    pub fn new(id: NodeId, name: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let package = package_of(&path);
        Self {
            id,
            name: name.into(),
            path,
            package,
        }
    }
}

/// Name -> declarations map over every declared construct in the repo, in
/// file order so candidate lists are deterministic.
#[derive(Debug, Default)]
pub struct SymbolTable {
    by_name: HashMap<String, Vec<Declaration>>,
    len: usize,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, decl: Declaration) {
        self.by_name
            .entry(decl.name.clone())
            .or_default()
            .push(decl);
        self.len += 1;
    }

    /// Every declaration of `name`, in insertion order. Empty when the name
    /// is not declared anywhere.
    #[must_use]
    pub fn candidates(&self, name: &str) -> &[Declaration] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

pub(crate) fn package_of(path: &str) -> String {
    match path.rfind('/') {
        Some(i) => path[..i].to_string(),
        None => ".".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn candidates_preserve_insertion_order() {
        let mut table = SymbolTable::new();
        table.insert(Declaration::new(NodeId::from("a"), "parse", "src/a.rs"));
        table.insert(Declaration::new(NodeId::from("b"), "parse", "src/b.rs"));
        table.insert(Declaration::new(NodeId::from("c"), "other", "src/c.rs"));

        let found = table.candidates("parse");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, NodeId::from("a"));
        assert_eq!(found[1].id, NodeId::from("b"));
        assert_eq!(table.len(), 3);
        assert!(table.candidates("missing").is_empty());
    }

    #[test]
    fn package_is_dirname_or_dot() {
        let nested = Declaration::new(NodeId::from("x"), "f", "src/net/tcp.rs");
        assert_eq!(nested.package, "src/net");
        let top = Declaration::new(NodeId::from("y"), "g", "main.py");
        assert_eq!(top.package, ".");
    }
}
