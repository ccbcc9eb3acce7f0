//! Markdown, styled HTML and JSON renderers.

use std::fmt::Write;

use pulldown_cmark::{Event, Options, Parser, html};
use serde::Serialize;

use crate::report::{Block, ReportDocument, Section};

const STYLED_TITLE: &str = "Repository Analysis Report";

const STYLE_RULES: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; }
h1, h2, h3, h4 { color: #333; }
code { background-color: #f4f4f4; padding: 2px 4px; }
pre { background-color: #f4f4f4; padding: 10px; overflow-x: auto; }
pre code { padding: 0; }";

/// Render a report document as Markdown.
pub fn render_markdown(document: &ReportDocument) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {}\n", document.title);
    for section in &document.sections {
        append_section(&mut output, section, 2);
    }
    let trimmed = output.trim_end().len();
    output.truncate(trimmed);
    output.push('\n');
    output
}

/// Render Markdown as a self-contained HTML document.
///
/// Raw HTML in the Markdown is emitted as escaped text.
pub fn render_styled(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        other => other,
    });
    let mut body = String::new();
    html::push_html(&mut body, parser);

    let mut output = String::new();
    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html>");
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, "<meta charset=\"utf-8\">");
    let _ = writeln!(output, "<title>{STYLED_TITLE}</title>");
    let _ = writeln!(output, "<style>\n{STYLE_RULES}\n</style>");
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");
    output.push_str(&body);
    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");
    output
}

/// Render any serializable payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

fn append_section(output: &mut String, section: &Section, depth: usize) {
    let _ = writeln!(output, "{} {}\n", "#".repeat(depth), section.heading);
    let mut in_lines = false;
    for block in &section.body {
        match block {
            Block::Line(line) => {
                let _ = writeln!(output, "{line}");
                in_lines = true;
            }
            Block::Code(code) => {
                if in_lines {
                    let _ = writeln!(output);
                }
                let fence = code_fence(code);
                let _ = writeln!(
                    output,
                    "{fence}text\n{}\n{fence}\n",
                    code.trim_end_matches('\n')
                );
                in_lines = false;
            }
            Block::Section(inner) => {
                if in_lines {
                    let _ = writeln!(output);
                }
                append_section(output, inner, depth + 1);
                in_lines = false;
            }
        }
    }
    if in_lines {
        let _ = writeln!(output);
    }
}

/// A backtick fence longer than any backtick run in `code`.
fn code_fence(code: &str) -> String {
    let longest = code
        .split(|ch| ch != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}
