//! Reading and writing the YAML frontmatter block of a Markdown document.

use serde_yaml::Value;
use siblink_core::frontmatter::split_frontmatter;
use siblink_core::Frontmatter;

/// A document split into its parsed frontmatter and untouched body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument<'a> {
    /// Parsed metadata block. Empty when the document has none.
    pub frontmatter: Frontmatter,
    /// Everything after the closing delimiter, byte for byte.
    pub body: &'a str,
    /// Line terminator of the source text, reused when rendering.
    pub line_ending: &'static str,
}

impl<'a> ParsedDocument<'a> {
    /// Parse a document's frontmatter.
    ///
    /// A document without a block, or with an empty one, parses to an empty
    /// mapping. A block that is not valid YAML, or whose top level is not a
    /// mapping, is an error carrying the parser message.
    pub fn parse(text: &'a str) -> Result<Self, String> {
        let (block, body) = split_frontmatter(text);
        let frontmatter = match block {
            None => Frontmatter::new(),
            Some(yaml) if yaml.trim().is_empty() => Frontmatter::new(),
            Some(yaml) => match serde_yaml::from_str::<Value>(yaml) {
                Ok(Value::Mapping(mapping)) => mapping,
                Ok(Value::Null) => Frontmatter::new(),
                Ok(other) => {
                    return Err(format!(
                        "expected a mapping at the top level, found {}",
                        value_kind(&other)
                    ))
                }
                Err(err) => return Err(err.to_string()),
            },
        };
        Ok(Self {
            frontmatter,
            body,
            line_ending: detect_line_ending(text),
        })
    }

    /// Render the document back to text.
    ///
    /// An empty mapping renders without a block. The block uses the line
    /// terminator the document was read with.
    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        if self.frontmatter.is_empty() {
            return Ok(self.body.to_string());
        }
        let mut yaml = serde_yaml::to_string(&self.frontmatter)?;
        let eol = self.line_ending;
        if eol != "\n" {
            yaml = yaml.replace('\n', eol);
        }
        Ok(format!("---{eol}{yaml}---{eol}{}", self.body))
    }
}

/// `\r\n` when the first line of `text` ends with one, `\n` otherwise.
fn detect_line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(i) if text[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_without_block() {
        let doc = ParsedDocument::parse("# Title\n\nBody\n").unwrap();
        assert!(doc.frontmatter.is_empty());
        assert_eq!(doc.body, "# Title\n\nBody\n");
    }

    #[test]
    fn test_parse_block() {
        let doc = ParsedDocument::parse("---\ntitle: Alice\ntags: [person]\n---\nBody\n").unwrap();
        assert_eq!(doc.frontmatter.get("title").and_then(Value::as_str), Some("Alice"));
        assert!(doc.frontmatter.get("tags").unwrap().is_sequence());
        assert_eq!(doc.body, "Body\n");
    }

    #[test]
    fn test_empty_block_is_empty_mapping() {
        let doc = ParsedDocument::parse("---\n---\nBody").unwrap();
        assert!(doc.frontmatter.is_empty());
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let err = ParsedDocument::parse("---\ntitle: [unclosed\n---\nBody").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_non_mapping_block_is_error() {
        let err = ParsedDocument::parse("---\n- a\n- b\n---\nBody").unwrap_err();
        assert!(err.contains("sequence"));
    }

    #[test]
    fn test_render_keeps_key_order_and_body() {
        let text = "---\nzeta: 1\nalpha: two\nmiddle: true\n---\n# Body\n\ntext\n";
        let mut doc = ParsedDocument::parse(text).unwrap();
        doc.frontmatter.insert(
            Value::String("mentions".into()),
            Value::Sequence(vec![Value::String("[[Bob]]".into())]),
        );

        let rendered = doc.render().unwrap();
        let reparsed = ParsedDocument::parse(&rendered).unwrap();
        let keys: Vec<&str> = reparsed.frontmatter.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "middle", "mentions"]);
        assert_eq!(reparsed.body, "# Body\n\ntext\n");
    }

    #[test]
    fn test_render_adds_block_to_plain_document() {
        let mut doc = ParsedDocument::parse("Just text\n").unwrap();
        doc.frontmatter.insert(
            Value::String("mentions".into()),
            Value::Sequence(vec![Value::String("[[Alice]]".into())]),
        );

        let rendered = doc.render().unwrap();
        assert!(rendered.starts_with("---\nmentions:\n"));
        assert!(rendered.ends_with("---\nJust text\n"));
    }

    #[test]
    fn test_render_keeps_crlf_line_endings() {
        let mut doc = ParsedDocument::parse("---\r\ntitle: Bob\r\n---\r\n# Bob\r\n").unwrap();
        assert_eq!(doc.line_ending, "\r\n");
        doc.frontmatter.insert(
            Value::String("mentions".into()),
            Value::Sequence(vec![Value::String("[[Alice]]".into())]),
        );

        let rendered = doc.render().unwrap();
        assert!(rendered.starts_with("---\r\ntitle: Bob\r\nmentions:\r\n- "));
        assert!(rendered.contains("[[Alice]]"));
        assert!(rendered.ends_with("\r\n---\r\n# Bob\r\n"));
        assert!(!rendered.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn test_crlf_document_without_block_gets_crlf_block() {
        let mut doc = ParsedDocument::parse("# Bob\r\n").unwrap();
        doc.frontmatter.insert(
            Value::String("mentions".into()),
            Value::Sequence(vec![Value::String("[[Alice]]".into())]),
        );

        let rendered = doc.render().unwrap();
        assert!(rendered.starts_with("---\r\nmentions:\r\n"));
        assert!(rendered.ends_with("---\r\n# Bob\r\n"));
    }

    #[test]
    fn test_render_empty_mapping_is_body_only() {
        let doc = ParsedDocument::parse("body").unwrap();
        assert_eq!(doc.render().unwrap(), "body");
    }
}
