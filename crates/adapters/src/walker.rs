use tree_sitter::{Node, Parser};

use atlas_model::{DocMeta, NodeKind, Param, Span};

use crate::language::Language;
use crate::record::{CallSite, NormalizedRecord, ParseFailure};

const SIGNATURE_CAP: usize = 400;
const SNIPPET_CAP: usize = 160;

/// Parse `src` and emit normalized records in source order.
///
/// A tree containing syntax errors is rejected wholesale: partially parsed
/// structure would produce unstable spans, and the caller's recovery path (a
/// degraded file node) is well defined.
pub(crate) fn parse_source(
    lang: Language,
    src: &str,
) -> Result<Vec<NormalizedRecord>, ParseFailure> {
    let grammar = lang.grammar()?;
    let mut parser = Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| ParseFailure::Grammar(e.to_string()))?;
    let tree = parser.parse(src, None).ok_or(ParseFailure::NoTree)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(ParseFailure::Syntax);
    }

    let mut walker = Walker {
        lang,
        src,
        records: Vec::new(),
        class_stack: Vec::new(),
        fn_stack: Vec::new(),
    };
    walker.visit(root);
    Ok(walker.records)
}

/// Depth-first walk collecting class/function/block records and the call
/// sites inside function bodies.
struct Walker<'s> {
    lang: Language,
    src: &'s str,
    records: Vec<NormalizedRecord>,
    /// Names of enclosing class-like constructs, innermost last.
    class_stack: Vec<String>,
    /// Indices into `records` of enclosing function-like constructs.
    fn_stack: Vec<usize>,
}

enum Construct {
    Class { name: String },
    Function { name: String },
    Call,
    Other,
}

impl<'s> Walker<'s> {
    fn visit(&mut self, node: Node<'s>) {
        match self.classify(node) {
            Construct::Class { name } => {
                let mut record = NormalizedRecord::new(NodeKind::Class, &name, span_of(node));
                record.signature = Some(self.signature(node));
                self.records.push(record);
                self.class_stack.push(name);
                self.visit_children(node);
                self.class_stack.pop();
            }
            Construct::Function { name } => {
                // A function nested inside another function is a block scope,
                // a function directly inside a class-like construct is a
                // method.
                let kind = if self.fn_stack.is_empty() {
                    NodeKind::Function
                } else {
                    NodeKind::Block
                };
                let is_method = self.fn_stack.is_empty() && !self.class_stack.is_empty();

                let mut record = NormalizedRecord::new(kind, &name, span_of(node));
                record.signature = Some(self.signature(node));
                record.doc = self.doc_meta(node, is_method);
                let idx = self.records.len();
                self.records.push(record);
                self.fn_stack.push(idx);
                self.visit_children(node);
                self.fn_stack.pop();
            }
            Construct::Call => {
                self.record_call(node);
                self.visit_children(node);
            }
            Construct::Other => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'s>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child);
        }
    }

    fn classify(&self, node: Node<'s>) -> Construct {
        let kind = node.kind();
        match self.lang {
            Language::Rust => match kind {
                "struct_item" | "enum_item" | "trait_item" | "union_item" => {
                    self.named_class(node)
                }
                "impl_item" => match node.child_by_field_name("type") {
                    Some(ty) => Construct::Class {
                        name: self.text(ty).to_string(),
                    },
                    None => Construct::Other,
                },
                "function_item" | "function_signature_item" => self.named_function(node),
                "call_expression" => Construct::Call,
                _ => Construct::Other,
            },
            Language::Python => match kind {
                "class_definition" => self.named_class(node),
                "function_definition" => self.named_function(node),
                "call" => Construct::Call,
                _ => Construct::Other,
            },
            Language::JavaScript | Language::TypeScript => match kind {
                "class_declaration" | "interface_declaration" | "enum_declaration" => {
                    self.named_class(node)
                }
                "function_declaration" | "generator_function_declaration"
                | "method_definition" => self.named_function(node),
                // `const f = (..) => ..` and `const f = function (..) ..`
                // declare searchable functions in JS/TS codebases; local
                // closures inside function bodies stay anonymous noise.
                "variable_declarator" if self.fn_stack.is_empty() => {
                    match node.child_by_field_name("value").map(|v| v.kind()) {
                        Some("arrow_function" | "function_expression" | "function") => {
                            self.named_function(node)
                        }
                        _ => Construct::Other,
                    }
                }
                "call_expression" => Construct::Call,
                _ => Construct::Other,
            },
            Language::Unknown => Construct::Other,
        }
    }

    fn named_class(&self, node: Node<'s>) -> Construct {
        match node.child_by_field_name("name") {
            Some(name) => Construct::Class {
                name: self.text(name).to_string(),
            },
            None => Construct::Other,
        }
    }

    fn named_function(&self, node: Node<'s>) -> Construct {
        match node.child_by_field_name("name") {
            Some(name) => Construct::Function {
                name: self.text(name).to_string(),
            },
            None => Construct::Other,
        }
    }

    fn record_call(&mut self, node: Node<'s>) {
        let Some(&caller_idx) = self.fn_stack.last() else {
            // Top-level expression; no caller to attach to.
            return;
        };
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let Some(symbol) = trailing_identifier(function, self.src) else {
            return;
        };
        let snippet = first_line(self.text(node), SNIPPET_CAP);
        self.records[caller_idx].calls.push(CallSite {
            symbol,
            line: node.start_position().row + 1,
            snippet,
        });
    }

    fn doc_meta(&self, node: Node<'s>, is_method: bool) -> DocMeta {
        let target = self.definition_node(node);
        let mut doc = DocMeta {
            is_method,
            owner: if is_method {
                self.class_stack.last().cloned()
            } else {
                None
            },
            is_async: self.is_async(target),
            params: self.extract_params(target),
            returns: self.extract_return(target),
            raises: self.extract_raises(target),
            decorators: self.extract_decorators(target),
        };
        if doc.is_empty() {
            doc = DocMeta::default();
        }
        doc
    }

    /// For `const f = () => ..` the interesting grammar fields live on the
    /// function value, not the declarator.
    fn definition_node(&self, node: Node<'s>) -> Node<'s> {
        if node.kind() == "variable_declarator" {
            if let Some(value) = node.child_by_field_name("value") {
                return value;
            }
        }
        node
    }

    fn is_async(&self, node: Node<'s>) -> bool {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "async" => return true,
                // Rust: `async` hides inside the modifier list.
                "function_modifiers" => return self.text(child).contains("async"),
                _ => {}
            }
        }
        false
    }

    fn extract_params(&self, node: Node<'s>) -> Vec<Param> {
        let Some(params) = node
            .child_by_field_name("parameters")
            .or_else(|| node.child_by_field_name("parameter"))
        else {
            return Vec::new();
        };
        if params.kind() != "parameters" && params.kind() != "formal_parameters" {
            // Single bare parameter (`x => ..`).
            return vec![Param {
                name: self.text(params).to_string(),
                annotation: None,
                has_default: false,
            }];
        }

        let mut out = Vec::new();
        let mut cursor = params.walk();
        for child in params.named_children(&mut cursor) {
            if let Some(param) = self.extract_param(child) {
                out.push(param);
            }
        }
        out
    }

    fn extract_param(&self, node: Node<'s>) -> Option<Param> {
        let kind = node.kind();
        match kind {
            "comment" | "type_parameter" => None,
            "identifier" => Some(Param {
                name: self.text(node).to_string(),
                annotation: None,
                has_default: false,
            }),
            // Rust
            "parameter" => Some(Param {
                name: node
                    .child_by_field_name("pattern")
                    .map_or_else(|| self.text(node).to_string(), |p| self.text(p).to_string()),
                annotation: node
                    .child_by_field_name("type")
                    .map(|t| self.text(t).to_string()),
                has_default: false,
            }),
            "self_parameter" => Some(Param {
                name: self.text(node).to_string(),
                annotation: None,
                has_default: false,
            }),
            // Python
            "typed_parameter" => Some(Param {
                name: node
                    .named_child(0)
                    .map_or_else(String::new, |n| self.text(n).to_string()),
                annotation: node
                    .child_by_field_name("type")
                    .map(|t| self.text(t).to_string()),
                has_default: false,
            }),
            "default_parameter" | "typed_default_parameter" => Some(Param {
                name: node
                    .child_by_field_name("name")
                    .map_or_else(String::new, |n| self.text(n).to_string()),
                annotation: node
                    .child_by_field_name("type")
                    .map(|t| self.text(t).to_string()),
                has_default: true,
            }),
            "list_splat_pattern" | "dictionary_splat_pattern" | "rest_pattern" => Some(Param {
                name: self.text(node).to_string(),
                annotation: None,
                has_default: false,
            }),
            // JavaScript
            "assignment_pattern" => Some(Param {
                name: node
                    .child_by_field_name("left")
                    .map_or_else(String::new, |n| self.text(n).to_string()),
                annotation: None,
                has_default: true,
            }),
            "object_pattern" | "array_pattern" => Some(Param {
                name: first_line(self.text(node), 80),
                annotation: None,
                has_default: false,
            }),
            // TypeScript
            "required_parameter" | "optional_parameter" => Some(Param {
                name: node
                    .child_by_field_name("pattern")
                    .map_or_else(String::new, |n| self.text(n).to_string()),
                annotation: node
                    .child_by_field_name("type")
                    .map(|t| strip_annotation(self.text(t))),
                has_default: node.child_by_field_name("value").is_some(),
            }),
            _ => None,
        }
    }

    fn extract_return(&self, node: Node<'s>) -> Option<String> {
        let ret = node.child_by_field_name("return_type")?;
        Some(strip_annotation(self.text(ret)))
    }

    fn extract_raises(&self, node: Node<'s>) -> Vec<String> {
        let statement_kind = match self.lang {
            Language::Python => "raise_statement",
            Language::JavaScript | Language::TypeScript => "throw_statement",
            _ => return Vec::new(),
        };
        let mut raises = Vec::new();
        collect_raised(node, statement_kind, self.src, &mut raises);
        raises.sort();
        raises.dedup();
        raises
    }

    fn extract_decorators(&self, node: Node<'s>) -> Vec<String> {
        if self.lang != Language::Python {
            return Vec::new();
        }
        let Some(parent) = node.parent() else {
            return Vec::new();
        };
        if parent.kind() != "decorated_definition" {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut cursor = parent.walk();
        for child in parent.children(&mut cursor) {
            if child.kind() == "decorator" {
                let text = first_line(self.text(child), 80);
                out.push(text.trim_start_matches('@').to_string());
            }
        }
        out
    }

    fn signature(&self, node: Node<'s>) -> String {
        first_line(self.text(node), SIGNATURE_CAP)
    }

    fn text(&self, node: Node<'s>) -> &'s str {
        &self.src[node.byte_range()]
    }
}

fn span_of(node: Node<'_>) -> Span {
    Span::new(node.start_position().row + 1, node.end_position().row + 1)
}

fn first_line(text: &str, cap: usize) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    line.chars().take(cap).collect()
}

/// `": Foo"` type annotations keep their punctuation in some grammars.
fn strip_annotation(text: &str) -> String {
    text.trim_start_matches(':').trim().to_string()
}

/// Find the last identifier-like token under `node`: `a.b.c()` resolves to
/// `c`, `crate::parse::run()` to `run`. Scoped wrappers are traversed rather
/// than taken whole.
fn trailing_identifier(node: Node<'_>, src: &str) -> Option<String> {
    if is_identifier_like(node.kind()) {
        return Some(src[node.byte_range()].to_string());
    }
    let mut cursor = node.walk();
    let mut last = None;
    for child in node.children(&mut cursor) {
        if let Some(found) = trailing_identifier(child, src) {
            last = Some(found);
        }
    }
    last
}

fn is_identifier_like(kind: &str) -> bool {
    if kind == "identifier" {
        return true;
    }
    // Composite identifiers (`crate::foo`) are resolved to their last
    // segment by traversal instead.
    if matches!(kind, "scoped_identifier" | "scoped_type_identifier") {
        return false;
    }
    kind.ends_with("_identifier")
}

fn collect_raised(node: Node<'_>, statement_kind: &str, src: &str, out: &mut Vec<String>) {
    if node.kind() == statement_kind {
        let mut cursor = node.walk();
        if let Some(expr) = node.named_children(&mut cursor).next() {
            let target = match expr.kind() {
                "call" | "call_expression" => expr.child_by_field_name("function"),
                "new_expression" => expr.child_by_field_name("constructor"),
                _ => Some(expr),
            };
            if let Some(name) = target.and_then(|t| trailing_identifier(t, src)) {
                out.push(name);
            }
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_raised(child, statement_kind, src, out);
    }
}
