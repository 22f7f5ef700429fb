//! Script ingestion from plain files and literate Markdown.
//!
//! A `.md` input is prose with the script spread over fenced blocks tagged
//! `bindef`; anything else is script from the first line to the last. Every
//! extracted line keeps its line number in the original file.

use std::path::Path;

/// Fence info string that marks script blocks in Markdown.
pub const FENCE_TAG: &str = "bindef";

/// One script line and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// Line text without the newline.
    pub text: String,
    /// 1-indexed line in the original file.
    pub number: usize,
}

/// Script text extracted from one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Name used in error locations (`<stdin>` for piped input).
    pub name: String,
    /// Script lines in document order.
    pub lines: Vec<SourceLine>,
}

impl Source {
    /// Extracts the script from `content` read from `path`.
    #[must_use]
    pub fn from_file(path: &Path, content: &str) -> Self {
        let lines = if is_markdown(path) {
            fenced_lines(content)
        } else {
            plain_lines(content)
        };
        Self {
            name: path.display().to_string(),
            lines,
        }
    }

    /// Plain script text under an arbitrary name.
    #[must_use]
    pub fn from_text(name: impl Into<String>, content: &str) -> Self {
        Self {
            name: name.into(),
            lines: plain_lines(content),
        }
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

fn plain_lines(content: &str) -> Vec<SourceLine> {
    content
        .lines()
        .zip(1..)
        .map(|(text, number)| SourceLine {
            text: text.to_string(),
            number,
        })
        .collect()
}

/// Collects the bodies of fences tagged [`FENCE_TAG`].
///
/// A block ends at a backtick fence at least as long as the one that opened
/// it; shorter fences inside are ordinary content.
fn fenced_lines(content: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut open: Option<usize> = None;

    for (text, number) in content.lines().zip(1..) {
        match (open, fence_width(text)) {
            (Some(width), Some(found)) if found >= width => open = None,
            (Some(_), _) => lines.push(SourceLine {
                text: text.to_string(),
                number,
            }),
            (None, Some(found)) => {
                let info = text.trim_start()[found..].trim();
                if info.split_whitespace().next() == Some(FENCE_TAG) {
                    open = Some(found);
                }
            }
            (None, None) => {}
        }
    }

    lines
}

/// Number of leading backticks when `line` is a fence (three or more).
fn fence_width(line: &str) -> Option<usize> {
    let width = line.trim_start().bytes().take_while(|&b| b == b'`').count();
    (width >= 3).then_some(width)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{fence_width, Source};

    fn texts(source: &Source) -> Vec<(&str, usize)> {
        source
            .lines
            .iter()
            .map(|line| (line.text.as_str(), line.number))
            .collect()
    }

    #[test]
    fn plain_files_keep_every_line() {
        let source = Source::from_file(Path::new("fixture.bd"), "u8 1\n# note\nu16 2\n");
        assert_eq!(texts(&source), [("u8 1", 1), ("# note", 2), ("u16 2", 3)]);
        assert_eq!(source.name, "fixture.bd");
    }

    #[test]
    fn markdown_keeps_only_tagged_fences() {
        let content = "# Header\n\n```bindef\nu8 1\n```\n\n```rust\nfn main() {}\n```\n\n```bindef\nstr \"x\"\n```\n";
        let source = Source::from_file(Path::new("fixture.md"), content);
        assert_eq!(texts(&source), [("u8 1", 4), ("str \"x\"", 12)]);
    }

    #[test]
    fn longer_fences_contain_shorter_ones() {
        let content = "````bindef\nu8 1\n```\nu8 2\n````\n";
        let source = Source::from_file(Path::new("doc.MD"), content);
        assert_eq!(texts(&source), [("u8 1", 2), ("```", 3), ("u8 2", 4)]);
    }

    #[test]
    fn unterminated_fence_runs_to_end_of_file() {
        let source = Source::from_file(Path::new("doc.md"), "```bindef\nu8 1\n");
        assert_eq!(texts(&source), [("u8 1", 2)]);
    }

    #[test]
    fn tag_must_match_exactly() {
        let source = Source::from_file(Path::new("doc.md"), "```bindefx\nu8 1\n```\n");
        assert!(source.lines.is_empty());
    }

    #[test]
    fn fence_detection() {
        assert_eq!(fence_width("```"), Some(3));
        assert_eq!(fence_width("  ````bindef"), Some(4));
        assert_eq!(fence_width("``"), None);
        assert_eq!(fence_width("u8 1"), None);
    }
}
