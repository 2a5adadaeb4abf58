//! Process-substitution extraction.
//!
//! A parse-only primitive: `<( … )` spans are lifted out of a token stream as
//! standalone sub-command strings. Nothing in the executor consumes the
//! result; wiring a substitution's output into process creation is a separate
//! concern this module does not take on.

/// Whether a [`CommandElement`] is an ordinary argument or the flattened text
/// of a `<( … )` span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Argument,
    Substitution,
}

/// One token of a command line after substitution extraction. The caller
/// owns the whole list for one parse pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandElement {
    pub content: String,
    pub kind: ElementKind,
}

impl CommandElement {
    fn argument(content: &str) -> CommandElement {
        CommandElement {
            content: content.to_string(),
            kind: ElementKind::Argument,
        }
    }

    fn substitution(content: String) -> CommandElement {
        CommandElement {
            content,
            kind: ElementKind::Substitution,
        }
    }
}

/// Scans the two-token bracket `<(` … `)`. Tokens inside the bracket are
/// space-joined into one `Substitution` element; tokens outside become
/// `Argument` elements. The flag reports whether any substitution was seen.
///
/// An unterminated `<(` drops its buffered text but still sets the flag,
/// matching the historic behavior.
pub fn extract_and_verify_subcommands(line: &str) -> (Vec<CommandElement>, bool) {
    let mut elements = Vec::new();
    let mut contains_substitution = false;
    let mut subcommand: Option<String> = None;

    for token in line.split(' ').filter(|t| !t.is_empty()) {
        match token {
            "<(" => {
                contains_substitution = true;
                subcommand = Some(String::new());
            }
            ")" => {
                let content = subcommand.take().unwrap_or_default();
                elements.push(CommandElement::substitution(content));
            }
            _ => match subcommand.as_mut() {
                Some(buffer) => {
                    if !buffer.is_empty() {
                        buffer.push(' ');
                    }
                    buffer.push_str(token);
                }
                None => elements.push(CommandElement::argument(token)),
            },
        }
    }

    (elements, contains_substitution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_tokens_become_arguments() {
        let (elements, found) = extract_and_verify_subcommands("diff a b");
        assert!(!found);
        assert_eq!(
            elements,
            vec![
                CommandElement::argument("diff"),
                CommandElement::argument("a"),
                CommandElement::argument("b"),
            ]
        );
    }

    #[test]
    fn lifts_substitution_spans() {
        let (elements, found) = extract_and_verify_subcommands("diff <( ls a ) <( ls b )");
        assert!(found);
        assert_eq!(
            elements,
            vec![
                CommandElement::argument("diff"),
                CommandElement::substitution("ls a".to_string()),
                CommandElement::substitution("ls b".to_string()),
            ]
        );
    }

    #[test]
    fn substitution_text_is_space_joined() {
        let (elements, _) = extract_and_verify_subcommands("<( sort -u  file )");
        assert_eq!(elements[0].content, "sort -u file");
        assert_eq!(elements[0].kind, ElementKind::Substitution);
    }

    #[test]
    fn unterminated_span_sets_flag_and_drops_buffer() {
        let (elements, found) = extract_and_verify_subcommands("cat <( ls");
        assert!(found);
        assert_eq!(elements, vec![CommandElement::argument("cat")]);
    }

    #[test]
    fn empty_span_yields_empty_subcommand() {
        let (elements, found) = extract_and_verify_subcommands("cat <( )");
        assert!(found);
        assert_eq!(elements[1].content, "");
        assert_eq!(elements[1].kind, ElementKind::Substitution);
    }
}
