//! Repository URL validation and interactive prompting.

use std::io::{BufRead, Write};
use std::sync::LazyLock;

use regex::Regex;

use crate::CliResult;

static GITHUB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://github\.com/[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+/?$")
        .expect("GitHub URL pattern compiles")
});

/// Whether `url` names a GitHub repository (`https://github.com/<owner>/<repo>`).
pub(crate) fn validate_github_url(url: &str) -> bool {
    GITHUB_URL.is_match(url.trim())
}

/// Use the given URL, or prompt until a valid one is entered.
pub(crate) fn resolve_url(url: Option<String>) -> CliResult<String> {
    match url {
        Some(url) => {
            let trimmed = url.trim();
            if !validate_github_url(trimmed) {
                return Err(format!("invalid GitHub repository URL: {trimmed}").into());
            }
            Ok(trimmed.to_string())
        }
        None => {
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            prompt_for_url(&mut stdin.lock(), &mut stdout)
        }
    }
}

/// Prompt on `output` and read from `input` until a valid URL arrives.
pub(crate) fn prompt_for_url<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> CliResult<String> {
    loop {
        write!(output, "Enter GitHub repository URL: ")?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err("no repository URL provided".into());
        }
        let candidate = line.trim();
        if validate_github_url(candidate) {
            return Ok(candidate.to_string());
        }
        writeln!(
            output,
            "Invalid GitHub URL. Please enter a valid GitHub repository URL."
        )?;
    }
}
