//! Repository discovery: a gitignore-aware walk that yields the supported
//! source files in a stable order.

use std::path::Path;

use ignore::WalkBuilder;

use atlas_adapters::AdapterRegistry;
use atlas_indexer::SourceFile;

/// Dependency and artifact directories pruned even when no ignore file
/// mentions them.
const PRUNED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "__pycache__",
    "venv",
    "dist",
    "build",
    "vendor",
    "coverage",
];

/// Walks `root` and returns every file a registered adapter can parse,
/// sorted by repo-relative path. Unreadable entries are logged and skipped;
/// only a root that is not a directory is an error.
pub fn scan_repository(root: &Path) -> anyhow::Result<Vec<SourceFile>> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let registry = AdapterRegistry::global();
    let mut sources = Vec::new();

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_exclude(true)
        .require_git(false)
        .filter_entry(keep_entry)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("walk error under {}: {err}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ty| ty.is_file()) {
            continue;
        }
        let path = entry.path();
        if !registry.supports(path) {
            continue;
        }
        match relative_path(root, path) {
            Some(rel) => sources.push(SourceFile::new(rel, path)),
            None => log::warn!("skipping {} outside the scan root", path.display()),
        }
    }

    sources.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    log::info!(
        "scan found {} supported files under {}",
        sources.len(),
        root.display()
    );
    Ok(sources)
}

/// Forward-slash path relative to the scan root. Node identity hangs off
/// this string, so it must come out the same on every platform.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|part| part.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

fn keep_entry(entry: &ignore::DirEntry) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    if !entry.file_type().is_some_and(|ty| ty.is_dir()) {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    !PRUNED_DIRS.contains(&name.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "def f():\n    pass\n").unwrap();
    }

    fn rel_paths(sources: &[SourceFile]) -> Vec<&str> {
        sources.iter().map(|s| s.rel_path.as_str()).collect()
    }

    #[test]
    fn collects_supported_files_sorted() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b/util.py");
        touch(dir.path(), "a/main.py");
        touch(dir.path(), "notes.txt");

        let sources = scan_repository(dir.path()).unwrap();
        assert_eq!(rel_paths(&sources), vec!["a/main.py", "b/util.py"]);
    }

    #[test]
    fn prunes_dependency_and_hidden_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app.py");
        touch(dir.path(), "node_modules/lib.py");
        touch(dir.path(), "target/gen.py");
        touch(dir.path(), "venv/site.py");
        touch(dir.path(), ".hidden/secret.py");

        let sources = scan_repository(dir.path()).unwrap();
        assert_eq!(rel_paths(&sources), vec!["app.py"]);
    }

    #[test]
    fn honors_gitignore_without_a_git_dir() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "kept.py");
        touch(dir.path(), "generated/out.py");
        fs::write(dir.path().join(".gitignore"), "generated/\n").unwrap();

        let sources = scan_repository(dir.path()).unwrap();
        assert_eq!(rel_paths(&sources), vec!["kept.py"]);
    }

    #[test]
    fn non_directory_roots_are_errors() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "lone.py");

        assert!(scan_repository(&dir.path().join("missing")).is_err());
        assert!(scan_repository(&dir.path().join("lone.py")).is_err());
    }
}
