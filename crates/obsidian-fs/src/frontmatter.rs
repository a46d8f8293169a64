//! YAML frontmatter for generated Obsidian notes
//!
//! Notes are laid out as a fixed-order frontmatter block followed by one
//! blank line and the body:
//! ```markdown
//! ---
//! title: Kaelen the Silent
//! date: 2025-03-14T09:26:53+01:00
//! tags:
//! - npc
//! ---
//!
//! A disgraced royal cartographer selling forged maps to survive.
//! ```

use serde::{Deserialize, Serialize};

/// Frontmatter fields written at the top of every generated note.
///
/// Field order here is the key order in the rendered YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteFrontmatter {
    pub title: String,
    /// ISO-8601 creation timestamp
    pub date: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A note split into frontmatter and body.
///
/// `body` borrows from the raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNote<'a> {
    /// Parsed frontmatter, or None if the block is missing or not valid YAML
    pub frontmatter: Option<NoteFrontmatter>,
    /// Everything after the blank line that follows the closing `---`
    pub body: &'a str,
}

/// Render the frontmatter block, including both `---` delimiters.
///
/// The `tags` key is omitted when there are no tags.
pub fn render_frontmatter(frontmatter: &NoteFrontmatter) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    Ok(format!("---\n{}---\n", yaml))
}

/// Build the full note text: frontmatter, one blank line, then the body verbatim.
pub fn build_note(frontmatter: &NoteFrontmatter, body: &str) -> Result<String, serde_yaml::Error> {
    Ok(format!("{}\n{}", render_frontmatter(frontmatter)?, body))
}

/// Split raw note text into the frontmatter YAML and the remaining content,
/// without parsing the YAML.
///
/// Returns (None, raw) when there is no complete frontmatter block.
pub fn split_frontmatter(raw: &str) -> (Option<&str>, &str) {
    let Some(after_opening) = raw.strip_prefix("---") else {
        return (None, raw);
    };
    let Some(yaml_start) = strip_newline(after_opening) else {
        return (None, raw);
    };

    // Closing delimiter must sit on its own line
    let mut offset = 0;
    for line in yaml_start.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            let yaml = &yaml_start[..offset];
            let rest = &yaml_start[offset + line.len()..];
            return (Some(yaml), rest);
        }
        offset += line.len();
    }

    (None, raw)
}

/// Parse a note produced by [`build_note`] back into its parts.
pub fn parse_note(raw: &str) -> ParsedNote<'_> {
    let (yaml, content) = split_frontmatter(raw);
    let Some(yaml) = yaml else {
        return ParsedNote {
            frontmatter: None,
            body: raw,
        };
    };

    let frontmatter = serde_yaml::from_str::<NoteFrontmatter>(yaml).ok();
    let body = strip_newline(content).unwrap_or(content);

    ParsedNote { frontmatter, body }
}

fn strip_newline(s: &str) -> Option<&str> {
    s.strip_prefix("\r\n").or_else(|| s.strip_prefix('\n'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(tags: &[&str]) -> NoteFrontmatter {
        NoteFrontmatter {
            title: "Kaelen".to_string(),
            date: "2025-03-14T09:26:53+01:00".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn sample_titled(title: &str) -> NoteFrontmatter {
        NoteFrontmatter {
            title: title.to_string(),
            ..sample(&[])
        }
    }

    #[test]
    fn render_without_tags_omits_tags_key() {
        let rendered = render_frontmatter(&sample(&[])).unwrap();
        assert_eq!(
            rendered,
            "---\ntitle: Kaelen\ndate: 2025-03-14T09:26:53+01:00\n---\n"
        );
    }

    #[test]
    fn render_with_tags_lists_each_tag() {
        let rendered = render_frontmatter(&sample(&["npc", "tavern"])).unwrap();
        assert!(rendered.starts_with("---\ntitle: Kaelen\ndate: 2025-03-14T09:26:53+01:00\ntags:\n"));
        assert!(rendered.contains("- npc\n"));
        assert!(rendered.contains("- tavern\n"));
        assert!(rendered.ends_with("\n---\n"));
    }

    #[test]
    fn build_separates_body_with_one_blank_line() {
        let note = build_note(&sample(&[]), "A silent wanderer.").unwrap();
        assert!(note.ends_with("---\n\nA silent wanderer."));
        assert!(!note.contains("---\n\n\n"));
    }

    #[test]
    fn parse_recovers_frontmatter_and_body() {
        let fm = sample(&["npc"]);
        let note = build_note(&fm, "Line one\n\nLine two\n").unwrap();
        let parsed = parse_note(&note);

        assert_eq!(parsed.frontmatter, Some(fm));
        assert_eq!(parsed.body, "Line one\n\nLine two\n");
    }

    #[test]
    fn parse_keeps_body_leading_blank_lines_beyond_separator() {
        let note = build_note(&sample(&[]), "\nIndented start").unwrap();
        assert_eq!(parse_note(&note).body, "\nIndented start");
    }

    #[test]
    fn titles_with_yaml_syntax_round_trip() {
        for title in [
            "Kaelen: the Silent",
            "\"Quoted\" Kaelen",
            "# Not a comment",
            "[Bracketed] Vex",
            "Old Tom #2",
        ] {
            let fm = sample_titled(title);
            let note = build_note(&fm, "Body").unwrap();
            let parsed = parse_note(&note);
            assert_eq!(parsed.frontmatter, Some(fm), "title {:?}", title);
            assert_eq!(parsed.body, "Body");
        }
    }

    #[test]
    fn multiline_title_cannot_close_frontmatter_early() {
        let fm = sample_titled("Vex\n---\ninjected");
        let note = build_note(&fm, "Body").unwrap();
        let parsed = parse_note(&note);

        assert_eq!(parsed.frontmatter, Some(fm));
        assert_eq!(parsed.body, "Body");
    }

    #[test]
    fn tags_with_yaml_syntax_round_trip() {
        let fm = sample(&["npc: hostile", "- dash", "#hash"]);
        let note = build_note(&fm, "Body").unwrap();
        assert_eq!(parse_note(&note).frontmatter, Some(fm));
    }

    #[test]
    fn parse_tolerates_invalid_yaml() {
        let raw = "---\ntitle: [unclosed\n---\n\nBody";
        let parsed = parse_note(raw);
        assert!(parsed.frontmatter.is_none());
        assert_eq!(parsed.body, "Body");
    }

    #[test]
    fn parse_without_frontmatter_returns_raw_body() {
        let parsed = parse_note("Just content");
        assert!(parsed.frontmatter.is_none());
        assert_eq!(parsed.body, "Just content");
    }

    #[test]
    fn split_note_with_crlf_line_endings() {
        let raw = "---\r\ntitle: Test\r\n---\r\n\r\nContent";
        let (yaml, content) = split_frontmatter(raw);
        assert_eq!(yaml, Some("title: Test\r\n"));
        assert_eq!(content, "\r\nContent");
    }

    #[test]
    fn split_note_with_incomplete_frontmatter() {
        let raw = "---\ntitle: Test\nNo closing delimiter";
        let (yaml, content) = split_frontmatter(raw);
        assert!(yaml.is_none());
        assert_eq!(content, raw);
    }

    #[test]
    fn split_requires_newline_after_opening_delimiter() {
        let raw = "---title: Test\n---\n";
        assert_eq!(split_frontmatter(raw), (None, raw));
    }
}
