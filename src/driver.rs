//! File discovery, parsing, and the per-run analysis loop.
//!
//! The driver walks the given paths for Go files, parses them, builds one
//! [`PackageIndex`] over the whole set, and runs the analyzer on each file.
//! Files are analyzed in parallel; each task only reads the shared index
//! and config. Findings are merged into a deterministic order.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::{debug, warn};
use tree_sitter::{Parser, Tree};

use crate::analyzer::{self, AnalysisContext, Finding};
use crate::ast;
use crate::config::Config;
use crate::error::{CapError, Result};
use crate::index::PackageIndex;

/// One parsed Go file.
#[derive(Debug)]
pub struct SourceFile {
    /// Path the file was loaded from.
    pub path: PathBuf,
    /// Full source text.
    pub source: String,
    /// Parsed syntax tree.
    pub tree: Tree,
    /// Package the file declares.
    pub package: String,
}

/// A parser configured for Go.
pub fn go_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| CapError::TreeSitter(e.to_string()))?;
    Ok(parser)
}

/// Parse Go source into a [`SourceFile`].
pub fn parse_source(path: impl Into<PathBuf>, source: impl Into<String>) -> Result<SourceFile> {
    let path = path.into();
    let source = source.into();
    let mut parser = go_parser()?;
    let tree = parser.parse(&source, None).ok_or_else(|| CapError::Parse {
        file: path.display().to_string(),
        message: "parser produced no tree".to_string(),
    })?;
    let package = package_name(&source, &tree).ok_or_else(|| CapError::Parse {
        file: path.display().to_string(),
        message: "missing package clause".to_string(),
    })?;
    Ok(SourceFile {
        path,
        source,
        tree,
        package,
    })
}

/// Read and parse a Go file from disk.
pub fn load_file(path: &Path) -> Result<SourceFile> {
    let source =
        std::fs::read_to_string(path).map_err(|e| CapError::io_with_path(e, path))?;
    parse_source(path, source)
}

fn package_name(source: &str, tree: &Tree) -> Option<String> {
    let clause = ast::named_children(tree.root_node())
        .into_iter()
        .find(|n| n.kind() == "package_clause")?;
    let ident = ast::named_children(clause)
        .into_iter()
        .find(|n| n.kind() == "package_identifier")?;
    Some(ast::node_text(source, ident).to_string())
}

/// Collect `.go` files under the given paths, sorted. Honors ignore files
/// the way the walker defaults do; explicit file arguments are taken as-is.
pub fn discover(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkBuilder::new(path).build() {
            let entry = entry.map_err(|e| CapError::Config(e.to_string()))?;
            if entry.file_type().is_some_and(|t| t.is_file())
                && entry.path().extension().is_some_and(|ext| ext == "go")
            {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Analyze every Go file under the given paths and return the merged
/// findings. Unparsable files are reported and skipped; they do not abort
/// the run.
pub fn analyze_paths(paths: &[PathBuf], config: &Config) -> Result<Vec<Finding>> {
    let mut files = Vec::new();
    for path in discover(paths)? {
        match load_file(&path) {
            Ok(file) => files.push(file),
            Err(err) => warn!(path = %path.display(), %err, "skipping file"),
        }
    }
    debug!(files = files.len(), "starting analysis");

    let index = PackageIndex::new(&files);
    let mut findings: Vec<Finding> = files
        .par_iter()
        .map(|file| {
            let oracle = index.oracle_for(file);
            let ctx = AnalysisContext {
                file: file.path.as_path(),
                source: &file.source,
                root: file.tree.root_node(),
                package: &file.package,
                oracle: &oracle,
                config,
            };
            analyzer::run(&ctx)
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    findings.sort_by(|a, b| a.location.cmp(&b.location));
    Ok(findings)
}

/// Render findings as `file:line:col: message` lines.
#[must_use]
pub fn render_text(findings: &[Finding]) -> String {
    let mut out = String::new();
    for finding in findings {
        out.push_str(&format!("{}: {}\n", finding.location, finding.message));
    }
    out
}

/// Render findings as pretty-printed JSON.
pub fn render_json(findings: &[Finding]) -> Result<String> {
    Ok(serde_json::to_string_pretty(findings)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_source_extracts_package() {
        let file = parse_source("x.go", "package mypkg\n").unwrap();
        assert_eq!(file.package, "mypkg");
    }

    #[test]
    fn test_parse_source_requires_package_clause() {
        let err = parse_source("x.go", "func main() {}\n").unwrap_err();
        assert!(matches!(err, CapError::Parse { .. }));
    }

    #[test]
    fn test_discover_filters_to_go_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "package a\n").unwrap();
        fs::write(dir.path().join("b.txt"), "not go\n").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.go"), "package c\n").unwrap();

        let files = discover(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.go", "c.go"]);
    }

    #[test]
    fn test_analyze_paths_skips_unparsable_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.go"), "not really go at all {{{").unwrap();
        fs::write(
            dir.path().join("ok.go"),
            "package main\n\nfunc main() {}\n",
        )
        .unwrap();

        let findings = analyze_paths(&[dir.path().to_path_buf()], &Config::default()).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_render_text_format() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("main.go"),
            r#"package main

type I interface {
	Do()
}

type T struct{}

func (t T) Do() {}

func with(cb func(v I)) { cb(T{}) }

func main() {
	outer := T{}
	with(func(v I) {
		outer.Do()
	})
}
"#,
        )
        .unwrap();

        let findings = analyze_paths(&[dir.path().to_path_buf()], &Config::default()).unwrap();
        assert_eq!(findings.len(), 1);
        let text = render_text(&findings);
        assert!(text.contains("main.go:16:3: captured variable outer implements interface I"));
    }
}
