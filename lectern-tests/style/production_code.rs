//! Production Code Enforcement
//!
//! Library and binary code propagates errors instead of panicking and carries
//! no dead code allowances. Everything from the first `#[cfg(test)]` line of a
//! file onwards is test code and exempt, as are dedicated test files.

use std::fs;
use std::path::{Path, PathBuf};

/// Crate source directories checked, relative to the workspace root.
const CHECKED_SOURCES: &[&str] = &["lectern-core/src", "lectern-web/src", "lectern-cli/src"];

/// Forbidden patterns and why they are rejected.
const FORBIDDEN: &[(&str, &str)] = &[
    ("#[allow(dead_code)]", "dead code allowance"),
    (".unwrap()", "panicking unwrap"),
    (".expect(", "panicking expect"),
];

/// A forbidden pattern found in production code
#[derive(Debug)]
struct Violation {
    file_path: String,
    line_number: usize,
    rule: &'static str,
    context: String,
}

/// Checker for forbidden patterns in production code
struct ProductionCodeChecker {
    violations: Vec<Violation>,
    files_checked: usize,
}

impl ProductionCodeChecker {
    fn new() -> Self {
        Self {
            violations: Vec::new(),
            files_checked: 0,
        }
    }

    fn find_rust_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::find_rust_files(&path, files)?;
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                files.push(path);
            }
        }
        Ok(())
    }

    /// Dedicated test helpers are compiled only for tests.
    fn is_test_file(path: &Path) -> bool {
        let path_str = path.to_string_lossy().to_lowercase();
        path_str.contains("test_") || path_str.ends_with("tests.rs")
    }

    /// Checks source text, stopping at the first test module.
    fn check_source(&mut self, file_path: &str, content: &str) {
        self.files_checked += 1;

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with("#[cfg(test)]") {
                break;
            }
            if trimmed.starts_with("//") {
                continue;
            }

            for (pattern, rule) in FORBIDDEN {
                if trimmed.contains(pattern) {
                    self.violations.push(Violation {
                        file_path: file_path.to_string(),
                        line_number: index + 1,
                        rule,
                        context: trimmed.to_string(),
                    });
                }
            }
        }
    }

    fn check_workspace(&mut self, root: &Path) -> std::io::Result<()> {
        let mut files = Vec::new();
        for source in CHECKED_SOURCES {
            Self::find_rust_files(&root.join(source), &mut files)?;
        }

        for file in files {
            if Self::is_test_file(&file) {
                continue;
            }
            let content = fs::read_to_string(&file)?;
            self.check_source(&file.to_string_lossy(), &content);
        }
        Ok(())
    }

    fn report_violations(&self) -> bool {
        if self.violations.is_empty() {
            println!(
                "Production code enforcement: {} files checked, no violations found",
                self.files_checked
            );
            return true;
        }

        println!("Production code violations found:");
        for violation in &self.violations {
            println!(
                "{}:{} ({})",
                violation.file_path, violation.line_number, violation.rule
            );
            println!("  {}", violation.context);
        }
        println!();
        println!("Propagate errors with `?` or handle them; move panicking helpers into tests.");

        false
    }
}
