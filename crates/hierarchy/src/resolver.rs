use atlas_adapters::CallSite;
use atlas_model::{CallEdge, CalleeRef, NodeId, UnresolvedReason};

use crate::symbols::{package_of, SymbolTable};

/// The call sites collected for one caller node, keyed by the file the
/// caller lives in.
#[derive(Debug, Clone)]
pub struct CallerCalls {
    pub caller: NodeId,
    pub path: String,
    pub sites: Vec<CallSite>,
}

/// Outcome of linking every collected call site against the symbol table.
#[derive(Debug, Default)]
pub struct Resolution {
    pub edges: Vec<CallEdge>,
    /// Callers whose site list was cut at the per-caller cap.
    pub truncated: Vec<NodeId>,
    pub resolved: usize,
    pub ambiguous: usize,
    pub not_found: usize,
}

/// Links callee names to declarations with scope preference: a declaration
/// in the caller's own file wins over one elsewhere in the caller's package,
/// which wins over one anywhere in the repo. A single survivor in the best
/// populated tier resolves; several survivors stay unresolved as ambiguous
/// rather than guessing.
#[derive(Debug)]
pub struct Resolver {
    table: SymbolTable,
    site_cap: usize,
}

impl Resolver {
    #[must_use]
    pub fn new(table: SymbolTable, site_cap: usize) -> Self {
        Self { table, site_cap }
    }

    /// Resolve every caller's sites in input order. Output edge order is a
    /// pure function of input order, so sorted callers give identical edge
    /// files across rebuilds.
    #[must_use]
    pub fn resolve(&self, callers: &[CallerCalls]) -> Resolution {
        let mut out = Resolution::default();
        for caller in callers {
            if caller.sites.len() > self.site_cap {
                log::debug!(
                    "caller in {} has {} call sites, keeping {}",
                    caller.path,
                    caller.sites.len(),
                    self.site_cap
                );
                out.truncated.push(caller.caller.clone());
            }
            for site in caller.sites.iter().take(self.site_cap) {
                let callee = self.resolve_site(&caller.path, &site.symbol);
                match &callee {
                    CalleeRef::Resolved { .. } => out.resolved += 1,
                    CalleeRef::Unresolved { reason, .. } => match reason {
                        UnresolvedReason::Ambiguous => out.ambiguous += 1,
                        UnresolvedReason::NotFound => out.not_found += 1,
                    },
                }
                out.edges.push(CallEdge {
                    caller: caller.caller.clone(),
                    callee,
                    path: caller.path.clone(),
                    line: site.line,
                    snippet: site.snippet.clone(),
                });
            }
        }
        out
    }

    fn resolve_site(&self, caller_path: &str, symbol: &str) -> CalleeRef {
        let candidates = self.table.candidates(symbol);
        if candidates.is_empty() {
            return CalleeRef::Unresolved {
                symbol: symbol.to_string(),
                reason: UnresolvedReason::NotFound,
            };
        }

        let package = package_of(caller_path);
        let same_file: Vec<_> = candidates
            .iter()
            .filter(|d| d.path == caller_path)
            .collect();
        let tier = if same_file.is_empty() {
            let same_package: Vec<_> = candidates
                .iter()
                .filter(|d| d.package == package)
                .collect();
            if same_package.is_empty() {
                candidates.iter().collect()
            } else {
                same_package
            }
        } else {
            same_file
        };

        match tier.as_slice() {
            [only] => CalleeRef::Resolved {
                id: only.id.clone(),
                symbol: symbol.to_string(),
            },
            _ => CalleeRef::Unresolved {
                symbol: symbol.to_string(),
                reason: UnresolvedReason::Ambiguous,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Declaration;
    use pretty_assertions::assert_eq;

    fn site(symbol: &str, line: usize) -> CallSite {
        CallSite {
            symbol: symbol.to_string(),
            line,
            snippet: format!("{symbol}()"),
        }
    }

    fn caller(id: &str, path: &str, sites: Vec<CallSite>) -> CallerCalls {
        CallerCalls {
            caller: NodeId::from(id),
            path: path.to_string(),
            sites,
        }
    }

    fn table(decls: &[(&str, &str, &str)]) -> SymbolTable {
        let mut table = SymbolTable::new();
        for (id, name, path) in decls {
            table.insert(Declaration::new(NodeId::from(*id), *name, *path));
        }
        table
    }

    #[test]
    fn unique_declaration_resolves() {
        let resolver = Resolver::new(table(&[("g1", "g", "src/util.rs")]), 200);
        let out = resolver.resolve(&[caller("f1", "src/main.rs", vec![site("g", 4)])]);

        assert_eq!(out.resolved, 1);
        assert_eq!(out.edges.len(), 1);
        let edge = &out.edges[0];
        assert_eq!(
            edge.callee,
            CalleeRef::Resolved {
                id: NodeId::from("g1"),
                symbol: "g".to_string()
            }
        );
        assert_eq!(edge.line, 4);
        assert_eq!(edge.path, "src/main.rs");
    }

    #[test]
    fn missing_name_stays_not_found() {
        let resolver = Resolver::new(table(&[]), 200);
        let out = resolver.resolve(&[caller("f1", "a.py", vec![site("println", 1)])]);
        assert_eq!(out.not_found, 1);
        assert_eq!(
            out.edges[0].callee,
            CalleeRef::Unresolved {
                symbol: "println".to_string(),
                reason: UnresolvedReason::NotFound
            }
        );
    }

    #[test]
    fn equal_candidates_stay_ambiguous() {
        let decls = table(&[("a", "run", "pkg/a.py"), ("b", "run", "pkg/b.py")]);
        let resolver = Resolver::new(decls, 200);
        let out = resolver.resolve(&[caller("f1", "pkg/c.py", vec![site("run", 9)])]);

        assert_eq!(out.ambiguous, 1);
        assert_eq!(out.resolved, 0);
        assert_eq!(
            out.edges[0].callee,
            CalleeRef::Unresolved {
                symbol: "run".to_string(),
                reason: UnresolvedReason::Ambiguous
            }
        );
    }

    #[test]
    fn same_file_beats_other_candidates() {
        let decls = table(&[
            ("near", "helper", "src/a.rs"),
            ("far", "helper", "src/b.rs"),
            ("wider", "helper", "other/c.rs"),
        ]);
        let resolver = Resolver::new(decls, 200);
        let out = resolver.resolve(&[caller("f1", "src/a.rs", vec![site("helper", 2)])]);

        assert_eq!(out.resolved, 1);
        assert!(matches!(
            &out.edges[0].callee,
            CalleeRef::Resolved { id, .. } if id == &NodeId::from("near")
        ));
    }

    #[test]
    fn same_package_beats_global() {
        let decls = table(&[
            ("pkg", "helper", "src/b.rs"),
            ("global", "helper", "other/c.rs"),
        ]);
        let resolver = Resolver::new(decls, 200);
        let out = resolver.resolve(&[caller("f1", "src/a.rs", vec![site("helper", 2)])]);

        assert_eq!(out.resolved, 1);
        assert!(matches!(
            &out.edges[0].callee,
            CalleeRef::Resolved { id, .. } if id == &NodeId::from("pkg")
        ));
    }

    #[test]
    fn recursion_resolves_to_the_caller_itself() {
        let decls = table(&[("fib", "fib", "math.py")]);
        let resolver = Resolver::new(decls, 200);
        let out = resolver.resolve(&[caller("fib", "math.py", vec![site("fib", 3)])]);
        assert_eq!(out.resolved, 1);
        assert!(matches!(
            &out.edges[0].callee,
            CalleeRef::Resolved { id, .. } if id == &NodeId::from("fib")
        ));
    }

    #[test]
    fn repeated_sites_emit_one_edge_each() {
        let decls = table(&[("g1", "g", "a.py")]);
        let resolver = Resolver::new(decls, 200);
        let out = resolver.resolve(&[caller(
            "f1",
            "a.py",
            vec![site("g", 2), site("g", 3), site("g", 7)],
        )]);
        assert_eq!(out.edges.len(), 3);
        assert_eq!(out.resolved, 3);
        let lines: Vec<usize> = out.edges.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 3, 7]);
    }

    #[test]
    fn per_caller_cap_drops_excess_sites() {
        let decls = table(&[("g1", "g", "a.py")]);
        let resolver = Resolver::new(decls, 2);
        let out = resolver.resolve(&[
            caller("big", "a.py", vec![site("g", 1), site("g", 2), site("g", 3)]),
            caller("small", "a.py", vec![site("g", 5)]),
        ]);

        assert_eq!(out.edges.len(), 3);
        assert_eq!(out.truncated, vec![NodeId::from("big")]);
        assert_eq!(
            out.edges.iter().filter(|e| e.caller == NodeId::from("big")).count(),
            2
        );
    }
}
