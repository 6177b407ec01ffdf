//! Markup pipeline: HTML re-indentation
//!
//! Streams each HTML document through quick-xml and re-emits every node on
//! its own line with tab indentation. Tag structure, attributes, text,
//! comments, and the doctype pass through byte-for-byte; only the
//! inter-node whitespace changes. Void elements never open an indent
//! level, and `<script>`/`<style>` bodies are raw text, copied through
//! untouched.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use super::{discover_files, pattern_prefix, TaskContext, TaskError};

/// Error in the markup pipeline
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MarkupError {
    /// Malformed markup
    #[error("HTML error in {}: {}", .file.display(), .message)]
    Parse { file: PathBuf, message: String },
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTML5 void elements: no end tag, no children.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Run the markup task: format every HTML source under the glob.
///
/// Returns the list of files written to the dist tree.
pub fn run(ctx: &TaskContext) -> Result<Vec<PathBuf>, TaskError> {
    let src_dir = ctx.src_dir();
    let pattern = &ctx.config().markup.sources;
    let markup_root = src_dir.join(pattern_prefix(pattern));
    let out_dir = ctx.dist_dir();

    let mut outputs = Vec::new();
    for file in discover_files(&src_dir, pattern)? {
        let rel = file.strip_prefix(&markup_root).unwrap_or(&file).to_path_buf();
        let dest = out_dir.join(&rel);

        let source = fs::read_to_string(&file).map_err(MarkupError::Io)?;
        let formatted = format_html(&source)
            .map_err(|e| MarkupError::Parse { file: file.clone(), message: e.to_string() })?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(MarkupError::Io)?;
        }
        fs::write(&dest, formatted).map_err(MarkupError::Io)?;
        outputs.push(dest);
    }

    Ok(outputs)
}

/// Re-indent an HTML document with tabs, one node per line.
///
/// `<script>` and `<style>` bodies are raw text in HTML: a `<` inside them
/// is not a tag open, and reflowing their whitespace can change meaning.
/// On such a start tag the body is copied through byte-for-byte up to the
/// matching close tag, and parsing resumes after it.
pub fn format_html(source: &str) -> Result<String, quick_xml::Error> {
    let mut out = String::new();
    let mut depth: usize = 0;
    let mut remaining = source;

    'chunks: loop {
        let mut reader = Reader::from_str(remaining);
        // HTML is not XML: tolerate unmatched and case-mismatched end tags
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.trim_text_start = true;
        config.trim_text_end = true;

        loop {
            match reader.read_event()? {
                Event::Eof => break 'chunks,
                // XML declarations and processing instructions do not occur in
                // HTML documents; drop them rather than guess at formatting.
                Event::Decl(_) | Event::PI(_) => {}
                Event::DocType(e) => {
                    push_line(
                        &mut out,
                        depth,
                        &format!("<!DOCTYPE {}>", String::from_utf8_lossy(&e)),
                    );
                }
                Event::Start(e) => {
                    push_line(&mut out, depth, &format!("<{}>", String::from_utf8_lossy(&e)));

                    let name = e.name().as_ref().to_ascii_lowercase();
                    if is_raw_text(&name) {
                        let consumed = reader.buffer_position() as usize;
                        let close_name = String::from_utf8_lossy(&name).into_owned();
                        let (body, rest) = split_raw_text(&remaining[consumed..], &close_name);

                        // No reindent: a tab inside a template literal or
                        // multi-line string would change the content
                        let body = body.trim_matches(|c| c == '\r' || c == '\n');
                        if !body.trim().is_empty() {
                            out.push_str(body);
                            out.push('\n');
                        }
                        push_line(&mut out, depth, &format!("</{}>", close_name));

                        remaining = rest;
                        continue 'chunks;
                    }

                    if !is_void(e.name().as_ref()) {
                        depth += 1;
                    }
                }
                Event::Empty(e) => {
                    push_line(&mut out, depth, &format!("<{}/>", String::from_utf8_lossy(&e)));
                }
                Event::End(e) => {
                    if !is_void(e.name().as_ref()) {
                        depth = depth.saturating_sub(1);
                    }
                    push_line(&mut out, depth, &format!("</{}>", String::from_utf8_lossy(&e)));
                }
                Event::Text(e) => {
                    let text = String::from_utf8_lossy(&e);
                    if !text.trim().is_empty() {
                        push_line(&mut out, depth, text.trim());
                    }
                }
                Event::CData(e) => {
                    push_line(
                        &mut out,
                        depth,
                        &format!("<![CDATA[{}]]>", String::from_utf8_lossy(&e)),
                    );
                }
                Event::Comment(e) => {
                    push_line(&mut out, depth, &format!("<!--{}-->", String::from_utf8_lossy(&e)));
                }
            }
        }
    }

    Ok(out)
}

/// Elements whose body is raw text rather than markup.
fn is_raw_text(name: &[u8]) -> bool {
    name == b"script" || name == b"style"
}

/// Split a raw-text element body from the input at its close tag.
///
/// Returns the body (everything before `</name`) and the input after the
/// close tag's `>`. An unclosed element runs to the end of the input.
fn split_raw_text<'a>(input: &'a str, name: &str) -> (&'a str, &'a str) {
    let close = format!("</{}", name);
    let lower = input.to_ascii_lowercase();
    let Some(start) = lower.find(&close) else {
        return (input, "");
    };
    let end = input[start..].find('>').map(|i| start + i + 1).unwrap_or(input.len());
    (&input[..start], &input[end..])
}

fn push_line(out: &mut String, depth: usize, content: &str) {
    for _ in 0..depth {
        out.push('\t');
    }
    out.push_str(content);
    out.push('\n');
}

fn is_void(name: &[u8]) -> bool {
    let lower = name.to_ascii_lowercase();
    VOID_ELEMENTS.iter().any(|v| v.as_bytes() == lower.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    #[test]
    fn test_format_indents_with_tabs() {
        let html = "<html><body><p>Hi</p></body></html>";
        let formatted = format_html(html).unwrap();
        let lines: Vec<&str> = formatted.lines().collect();

        assert_eq!(lines[0], "<html>");
        assert_eq!(lines[1], "\t<body>");
        assert_eq!(lines[2], "\t\t<p>");
        assert_eq!(lines[3], "\t\t\tHi");
        assert_eq!(lines[4], "\t\t</p>");
        assert_eq!(lines[5], "\t</body>");
        assert_eq!(lines[6], "</html>");
    }

    #[test]
    fn test_format_preserves_attributes_and_entities() {
        let html = "<a href=\"/about\" class='nav'>Q &amp; A</a>";
        let formatted = format_html(html).unwrap();

        assert!(formatted.contains("href=\"/about\""));
        assert!(formatted.contains("class='nav'"));
        assert!(formatted.contains("Q &amp; A"));
    }

    #[test]
    fn test_format_doctype_and_comment() {
        let html = "<!DOCTYPE html><!-- header --><div></div>";
        let formatted = format_html(html).unwrap();
        let lines: Vec<&str> = formatted.lines().collect();

        assert_eq!(lines[0], "<!DOCTYPE html>");
        assert_eq!(lines[1], "<!-- header -->");
    }

    #[test]
    fn test_void_elements_do_not_indent() {
        let html = "<head><meta charset=\"utf-8\"><title>t</title></head>";
        let formatted = format_html(html).unwrap();
        let lines: Vec<&str> = formatted.lines().collect();

        assert_eq!(lines[0], "<head>");
        assert_eq!(lines[1], "\t<meta charset=\"utf-8\">");
        // title stays at the same depth as meta
        assert_eq!(lines[2], "\t<title>");
    }

    #[test]
    fn test_inline_script_body_left_verbatim() {
        let html =
            "<html><body><script>if (a < b && c) { go(); }</script></body></html>";
        let formatted = format_html(html).unwrap();

        assert!(formatted.contains("if (a < b && c) { go(); }"));
        // The close tags stay properly nested after the script block
        let script_end = formatted.find("</script>").unwrap();
        let body_end = formatted.find("</body>").unwrap();
        assert!(script_end < body_end);
        assert_eq!(formatted.lines().last(), Some("</html>"));
    }

    #[test]
    fn test_multiline_script_keeps_its_own_whitespace() {
        let html = "<body><script>\nconst s = `a\n  b`;\n</script></body>";
        let formatted = format_html(html).unwrap();

        // Lines inside the script are not reindented
        assert!(formatted.contains("const s = `a\n  b`;"));
    }

    #[test]
    fn test_inline_style_body_left_verbatim() {
        let html = "<head><style>nav > a { margin: 0; }</style></head>";
        let formatted = format_html(html).unwrap();

        assert!(formatted.contains("nav > a { margin: 0; }"));
        assert!(formatted.contains("</style>"));
    }

    #[test]
    fn test_empty_script_with_src_attribute() {
        let html = "<body><script src=\"app.min.js\"></script></body>";
        let formatted = format_html(html).unwrap();
        let lines: Vec<&str> = formatted.lines().collect();

        assert_eq!(lines[0], "<body>");
        assert_eq!(lines[1], "\t<script src=\"app.min.js\">");
        assert_eq!(lines[2], "\t</script>");
        assert_eq!(lines[3], "</body>");
    }

    #[test]
    fn test_split_raw_text() {
        assert_eq!(split_raw_text("x < y</script><p>", "script"), ("x < y", "<p>"));
        assert_eq!(split_raw_text("a{}</STYLE>rest", "style"), ("a{}", "rest"));
        // Unclosed element runs to the end of the input
        assert_eq!(split_raw_text("let a = 1;", "script"), ("let a = 1;", ""));
    }

    #[test]
    fn test_run_mirrors_relative_paths() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src/pages");
        fs::create_dir_all(&src).unwrap();
        fs::write(temp.path().join("src/index.html"), "<p>root</p>").unwrap();
        fs::write(src.join("about.html"), "<p>about</p>").unwrap();

        let ctx = TaskContext::new(SiteConfig::default(), temp.path().to_path_buf());
        let outputs = run(&ctx).unwrap();

        assert_eq!(outputs.len(), 2);
        assert!(temp.path().join("dist/index.html").exists());
        assert!(temp.path().join("dist/pages/about.html").exists());
    }
}
