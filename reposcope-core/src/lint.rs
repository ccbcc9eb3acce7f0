//! Lint engines: a builtin rule set and an external command wrapper.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use tree_sitter::Node;

use crate::config::LintConfig;
use crate::error::{ReposcopeError, Result};
use crate::metrics::{node_text, parse_python};

const MAX_LINE_LENGTH: usize = 100;

/// Produces free-form diagnostics for a source text.
#[cfg_attr(test, mockall::automock)]
pub trait LintEngine {
    /// Lint `text`, naming it `display_name` in the output. Empty output means no issues.
    fn lint(&self, text: &str, display_name: &str) -> Result<String>;
}

impl<T: LintEngine + ?Sized> LintEngine for Box<T> {
    fn lint(&self, text: &str, display_name: &str) -> Result<String> {
        (**self).lint(text, display_name)
    }
}

/// Build the configured lint engine.
pub fn build_linter(
    config: &LintConfig,
    source_suffix: &str,
) -> Result<Box<dyn LintEngine + Send + Sync>> {
    if config.command.is_empty() {
        return Ok(Box::new(BuiltinLinter::new()));
    }
    let mut linter = CommandLinter::new(&config.command, source_suffix)?;
    if let Some(dir) = &config.scratch_dir {
        linter = linter.with_scratch_dir(dir);
    }
    Ok(Box::new(linter))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LintIssue {
    line: usize,
    column: usize,
    code: &'static str,
    symbol: &'static str,
    message: String,
}

/// In-memory linter covering common Python style and safety rules.
#[derive(Debug, Default, Clone)]
pub struct BuiltinLinter;

impl BuiltinLinter {
    /// Create a new builtin linter.
    pub fn new() -> Self {
        Self
    }
}

impl LintEngine for BuiltinLinter {
    fn lint(&self, text: &str, display_name: &str) -> Result<String> {
        let tree = parse_python(text)?;
        let mut issues = line_issues(text);
        let root = tree.root_node();
        if let Some(first) = first_statement(root) {
            if !is_docstring(first) {
                issues.push(LintIssue {
                    line: 1,
                    column: 0,
                    code: "C0114",
                    symbol: "missing-module-docstring",
                    message: "Missing module docstring".to_string(),
                });
            }
        }
        tree_issues(root, text, &mut issues);
        issues.sort_by(|a, b| (a.line, a.column, a.code).cmp(&(b.line, b.column, b.code)));

        let mut output = String::new();
        for issue in &issues {
            let _ = writeln!(
                output,
                "{display_name}:{}:{}: {}: {} ({})",
                issue.line, issue.column, issue.code, issue.message, issue.symbol
            );
        }
        Ok(output.trim_end().to_string())
    }
}

fn line_issues(text: &str) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        let length = line.chars().count();
        if length > MAX_LINE_LENGTH {
            issues.push(LintIssue {
                line: index + 1,
                column: 0,
                code: "C0301",
                symbol: "line-too-long",
                message: format!("Line too long ({length}/{MAX_LINE_LENGTH})"),
            });
        }
        if line.ends_with([' ', '\t']) {
            issues.push(LintIssue {
                line: index + 1,
                column: line.trim_end().chars().count(),
                code: "C0303",
                symbol: "trailing-whitespace",
                message: "Trailing whitespace".to_string(),
            });
        }
    }
    if !text.is_empty() && !text.ends_with('\n') {
        issues.push(LintIssue {
            line: text.lines().count(),
            column: 0,
            code: "C0304",
            symbol: "missing-final-newline",
            message: "Final newline missing".to_string(),
        });
    }
    issues
}

fn tree_issues(node: Node<'_>, source: &str, issues: &mut Vec<LintIssue>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|name| node_text(name, source))
                    .unwrap_or_default();
                let documented = child
                    .child_by_field_name("body")
                    .and_then(first_statement)
                    .is_some_and(is_docstring);
                if !name.starts_with('_') && !documented {
                    issues.push(LintIssue {
                        line: child.start_position().row + 1,
                        column: child.start_position().column,
                        code: "C0116",
                        symbol: "missing-function-docstring",
                        message: "Missing function or method docstring".to_string(),
                    });
                }
            }
            "wildcard_import" => {
                let module = node
                    .child_by_field_name("module_name")
                    .map(|module| node_text(module, source))
                    .unwrap_or("module");
                issues.push(LintIssue {
                    line: node.start_position().row + 1,
                    column: node.start_position().column,
                    code: "W0401",
                    symbol: "wildcard-import",
                    message: format!("Wildcard import {module}"),
                });
            }
            "except_clause" if is_bare_except(child) => {
                issues.push(LintIssue {
                    line: child.start_position().row + 1,
                    column: child.start_position().column,
                    code: "W0702",
                    symbol: "bare-except",
                    message: "No exception type(s) specified".to_string(),
                });
            }
            _ => {}
        }
        tree_issues(child, source, issues);
    }
}

fn first_statement(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let first = node
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    first
}

fn is_docstring(node: Node<'_>) -> bool {
    if node.kind() != "expression_statement" {
        return false;
    }
    node.named_child(0)
        .is_some_and(|expr| matches!(expr.kind(), "string" | "concatenated_string"))
}

fn is_bare_except(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let bare = node
        .named_children(&mut cursor)
        .all(|child| matches!(child.kind(), "block" | "comment"));
    bare
}

/// Runs an external linter against a scoped temporary copy of the source.
#[derive(Debug, Clone)]
pub struct CommandLinter {
    program: String,
    args: Vec<String>,
    suffix: String,
    scratch_dir: Option<PathBuf>,
}

impl CommandLinter {
    /// Create a linter from a command line such as `["pylint", "--score=n"]`.
    pub fn new(command: &[String], suffix: &str) -> Result<Self> {
        let Some((program, args)) = command.split_first() else {
            return Err(ReposcopeError::Other("lint command is empty".to_string()));
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            suffix: suffix.to_string(),
            scratch_dir: None,
        })
    }

    /// Create scratch files under `dir` instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    fn run(&self, path: &Path, display_name: &str) -> Result<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(ReposcopeError::from)?;
        let merged = merged_output(&output);
        if !output.status.success() && merged.is_empty() {
            return Err(ReposcopeError::Other(format!(
                "{} failed with status {}",
                self.program, output.status
            )));
        }
        Ok(rename_scratch(&merged, path, display_name))
    }
}

impl LintEngine for CommandLinter {
    fn lint(&self, text: &str, display_name: &str) -> Result<String> {
        // The scratch file is removed on drop if anything below fails early.
        let mut builder = tempfile::Builder::new();
        builder.prefix("reposcope-lint-").suffix(&self.suffix);
        let mut scratch = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        scratch.write_all(text.as_bytes())?;
        scratch.flush()?;

        let outcome = self.run(scratch.path(), display_name);
        let scratch_path = scratch.path().to_path_buf();
        if let Err(err) = scratch.close() {
            log::warn!(
                "Failed to remove lint scratch file {}: {err}",
                scratch_path.display()
            );
        }
        outcome
    }
}

fn merged_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut merged = String::new();
    if !stdout.trim().is_empty() {
        merged.push_str(stdout.trim());
    }
    if !stderr.trim().is_empty() {
        if !merged.is_empty() {
            merged.push('\n');
        }
        merged.push_str(stderr.trim());
    }
    merged
}

fn rename_scratch(output: &str, path: &Path, display_name: &str) -> String {
    let renamed = output.replace(path.to_string_lossy().as_ref(), display_name);
    let scratch_stem = path.file_stem().map(|stem| stem.to_string_lossy());
    let display_stem = Path::new(display_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_else(|| display_name.into());
    match scratch_stem {
        Some(stem) if !stem.is_empty() => renamed.replace(stem.as_ref(), display_stem.as_ref()),
        _ => renamed,
    }
}
