use atlas_model::{Node, NodeId, NodeKind, Span};

use atlas_adapters::{CallSite, Language, NormalizedRecord, ParseFailure};

/// Upper bound on the raw-text excerpt stored per node.
const EXCERPT_CAP: usize = 1200;

/// One file's contribution to the hierarchy: the File node and its subtree
/// in source order, plus the call sites found inside it keyed by caller id.
#[derive(Debug, Clone)]
pub struct FileTree {
    /// File node first, then nested constructs in source order.
    pub nodes: Vec<Node>,
    pub calls: Vec<(NodeId, CallSite)>,
    pub parse_failed: bool,
}

impl FileTree {
    #[must_use]
    pub fn file_id(&self) -> &NodeId {
        // Construction always puts the File node first.
        &self.nodes[0].id
    }
}

/// Build a File node and its nested Class/Function/Block subtree from one
/// file's parse outcome.
///
/// The walk keeps a stack of currently open enclosing constructs: each record
/// becomes a child of the innermost construct whose span still contains it,
/// and spans come straight from parse positions. A parse failure is recovered
/// here into a bare degraded File node; an empty file yields a bare File
/// node.
#[must_use]
pub fn build_file_tree(
    path: &str,
    lang: Language,
    parent: &NodeId,
    text: &str,
    parsed: Result<Vec<NormalizedRecord>, ParseFailure>,
) -> FileTree {
    let line_count = text.lines().count().max(1);
    let file_name = path.rsplit('/').next().unwrap_or(path);

    let mut file_node = Node::new(
        NodeKind::File,
        path,
        file_name,
        Some(Span::new(1, line_count)),
    );
    file_node.parent = Some(parent.clone());
    file_node.lang = Some(lang.as_str().to_string());
    file_node.excerpt = bounded(text);

    let records = match parsed {
        Ok(records) => records,
        Err(failure) => {
            log::warn!("parse failed for {path}: {failure}");
            file_node.parse_failed = true;
            return FileTree {
                nodes: vec![file_node],
                calls: Vec::new(),
                parse_failed: true,
            };
        }
    };

    let lines: Vec<&str> = text.lines().collect();
    let mut nodes = vec![file_node];
    let mut calls = Vec::new();
    // Indices into `nodes` of the open construct chain; the File node stays
    // at the bottom.
    let mut stack: Vec<usize> = vec![0];

    for record in records {
        while stack.len() > 1 {
            let top = &nodes[*stack.last().unwrap_or(&0)];
            let enclosing = top.span.is_some_and(|s| s.contains(record.span));
            if enclosing {
                break;
            }
            stack.pop();
        }
        let parent_idx = *stack.last().unwrap_or(&0);

        let mut node = Node::new(record.kind, path, &record.name, Some(record.span));
        node.parent = Some(nodes[parent_idx].id.clone());
        node.lang = Some(lang.as_str().to_string());
        node.signature = record.signature;
        if !record.doc.is_empty() {
            node.doc = Some(record.doc);
        }
        node.excerpt = bounded(&slice_lines(&lines, record.span));

        let id = node.id.clone();
        nodes[parent_idx].children.push(id.clone());
        for call in record.calls {
            calls.push((id.clone(), call));
        }

        nodes.push(node);
        stack.push(nodes.len() - 1);
    }

    FileTree {
        nodes,
        calls,
        parse_failed: false,
    }
}

fn slice_lines(lines: &[&str], span: Span) -> String {
    let start = span.start.saturating_sub(1).min(lines.len());
    let end = span.end.min(lines.len());
    lines[start..end].join("\n")
}

fn bounded(text: &str) -> String {
    if text.len() <= EXCERPT_CAP {
        return text.to_string();
    }
    let mut cut = EXCERPT_CAP;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text[..cut].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_model::DocMeta;
    use pretty_assertions::assert_eq;

    fn record(kind: NodeKind, name: &str, start: usize, end: usize) -> NormalizedRecord {
        NormalizedRecord {
            kind,
            name: name.to_string(),
            span: Span::new(start, end),
            signature: None,
            doc: DocMeta::default(),
            calls: Vec::new(),
        }
    }

    fn pkg_id() -> NodeId {
        NodeId::from("pkg-under-test")
    }

    #[test]
    fn nests_records_by_span() {
        let text = "class A:\n    def m(self):\n        pass\n\ndef top():\n    pass\n";
        let records = vec![
            record(NodeKind::Class, "A", 1, 3),
            record(NodeKind::Function, "m", 2, 3),
            record(NodeKind::Function, "top", 5, 6),
        ];
        let tree = build_file_tree("pkg/a.py", Language::Python, &pkg_id(), text, Ok(records));

        assert_eq!(tree.nodes.len(), 4);
        let file = &tree.nodes[0];
        let class_a = &tree.nodes[1];
        let method_m = &tree.nodes[2];
        let top = &tree.nodes[3];

        assert_eq!(file.kind, NodeKind::File);
        assert_eq!(file.parent.as_ref(), Some(&pkg_id()));
        assert_eq!(file.children, vec![class_a.id.clone(), top.id.clone()]);
        assert_eq!(class_a.parent.as_ref(), Some(&file.id));
        assert_eq!(class_a.children, vec![method_m.id.clone()]);
        assert_eq!(method_m.parent.as_ref(), Some(&class_a.id));
        assert_eq!(top.parent.as_ref(), Some(&file.id));
    }

    #[test]
    fn every_child_span_is_contained_in_its_parent() {
        let text = "fn outer() {\n    fn inner() {}\n}\nfn other() {}\n";
        let records = vec![
            record(NodeKind::Function, "outer", 1, 3),
            record(NodeKind::Block, "inner", 2, 2),
            record(NodeKind::Function, "other", 4, 4),
        ];
        let tree = build_file_tree("src/x.rs", Language::Rust, &pkg_id(), text, Ok(records));

        for node in &tree.nodes[1..] {
            let parent = tree
                .nodes
                .iter()
                .find(|n| Some(&n.id) == node.parent.as_ref())
                .expect("parent in same file tree");
            let parent_span = parent.span.expect("file-level nodes have spans");
            assert!(parent_span.contains(node.span.unwrap()));
        }
    }

    #[test]
    fn parse_failure_yields_degraded_bare_file() {
        let tree = build_file_tree(
            "src/broken.py",
            Language::Python,
            &pkg_id(),
            "def broken(:\n",
            Err(ParseFailure::Syntax),
        );

        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.parse_failed);
        let file = &tree.nodes[0];
        assert!(file.parse_failed);
        assert!(file.children.is_empty());
        assert_eq!(file.kind, NodeKind::File);
    }

    #[test]
    fn empty_file_yields_bare_file_node() {
        let tree = build_file_tree("src/empty.rs", Language::Rust, &pkg_id(), "", Ok(vec![]));
        assert_eq!(tree.nodes.len(), 1);
        assert!(!tree.parse_failed);
        assert_eq!(tree.nodes[0].span, Some(Span::new(1, 1)));
    }

    #[test]
    fn calls_are_keyed_by_their_enclosing_node() {
        let text = "fn a() {\n    b();\n}\n";
        let mut rec = record(NodeKind::Function, "a", 1, 3);
        rec.calls.push(CallSite {
            symbol: "b".to_string(),
            line: 2,
            snippet: "b();".to_string(),
        });
        let tree = build_file_tree("src/a.rs", Language::Rust, &pkg_id(), text, Ok(vec![rec]));

        assert_eq!(tree.calls.len(), 1);
        assert_eq!(tree.calls[0].0, tree.nodes[1].id);
        assert_eq!(tree.calls[0].1.symbol, "b");
    }

    #[test]
    fn ids_are_stable_across_rebuilds() {
        let text = "fn a() {}\n";
        let build = || {
            build_file_tree(
                "src/a.rs",
                Language::Rust,
                &pkg_id(),
                text,
                Ok(vec![record(NodeKind::Function, "a", 1, 1)]),
            )
        };
        let first: Vec<NodeId> = build().nodes.into_iter().map(|n| n.id).collect();
        let second: Vec<NodeId> = build().nodes.into_iter().map(|n| n.id).collect();
        assert_eq!(first, second);
    }
}
