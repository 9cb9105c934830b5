//! Frontmatter block delimiting.

/// Split a document into its leading `---` delimited metadata block and the
/// body that follows it.
///
/// The block must open on the first line and close on a line consisting of
/// `---`. An unclosed block is not a block: the whole text is returned as body.
pub fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }

    (None, text)
}
