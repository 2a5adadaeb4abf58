//! Pipeline validation and splitting.
//!
//! Validation and splitting are deliberately independent: [`extract_pipe_commands`]
//! cuts on the literal `" | "` separator without judging well-formedness, so
//! callers must run [`commandline_is_pipe`] first to reject malformed
//! pipelines instead of silently getting wrong stage boundaries.

use crate::error::PipelineError;

/// Hard cap on the number of stages in one pipeline.
pub const MAX_STAGES: usize = 16;

/// Token-scan validation of pipe syntax: every `|` token must be followed by
/// a token that exists and is not itself `|`. Returns `true` only when the
/// line contains at least one well-formed pipe.
pub fn commandline_is_pipe(line: &str) -> bool {
    let mut tokens = line.split(' ').filter(|t| !t.is_empty()).peekable();
    if tokens.peek() == Some(&"|") {
        return false;
    }
    let mut well_formed = false;
    while let Some(token) = tokens.next() {
        if token == "|" {
            match tokens.peek() {
                Some(&next) if next != "|" => well_formed = true,
                _ => return false,
            }
        }
    }
    well_formed
}

/// Splits a command line into ordered stage strings on the literal `" | "`
/// separator. A non-empty remainder after the last separator is the final
/// stage. More than [`MAX_STAGES`] stages is an error, never a silent cap.
pub fn extract_pipe_commands(line: &str) -> Result<Vec<String>, PipelineError> {
    let mut stages = Vec::new();
    let mut rest = line;
    while let Some(idx) = rest.find(" | ") {
        stages.push(rest[..idx].to_string());
        rest = &rest[idx + 3..];
    }
    if !rest.is_empty() {
        stages.push(rest.to_string());
    }

    if stages.len() > MAX_STAGES {
        return Err(PipelineError::TooManyStages { limit: MAX_STAGES });
    }
    Ok(stages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_pipes() {
        assert!(commandline_is_pipe("a | b | c"));
        assert!(commandline_is_pipe("echo hi | cat"));
    }

    #[test]
    fn rejects_doubled_pipe() {
        assert!(!commandline_is_pipe("a | | b"));
    }

    #[test]
    fn rejects_trailing_pipe() {
        assert!(!commandline_is_pipe("a |"));
    }

    #[test]
    fn rejects_leading_pipe() {
        assert!(!commandline_is_pipe("|"));
        assert!(!commandline_is_pipe("| a"));
    }

    #[test]
    fn plain_command_is_not_a_pipe() {
        assert!(!commandline_is_pipe("ls -l"));
    }

    #[test]
    fn splits_in_order() {
        let stages = extract_pipe_commands("a | b | c").unwrap();
        assert_eq!(stages, vec!["a", "b", "c"]);
    }

    #[test]
    fn single_stage_passes_through() {
        assert_eq!(extract_pipe_commands("ls -l").unwrap(), vec!["ls -l"]);
    }

    #[test]
    fn separator_must_be_space_delimited() {
        // "a|b" is one token, not a pipe; splitting leaves it whole
        assert_eq!(extract_pipe_commands("a|b").unwrap(), vec!["a|b"]);
    }

    #[test]
    fn empty_line_yields_no_stages() {
        assert!(extract_pipe_commands("").unwrap().is_empty());
    }

    #[test]
    fn stage_count_is_capped() {
        let line = vec!["x"; MAX_STAGES + 1].join(" | ");
        assert_eq!(
            extract_pipe_commands(&line),
            Err(PipelineError::TooManyStages { limit: MAX_STAGES })
        );
    }

    #[test]
    fn splitting_alone_does_not_validate() {
        // callers must run commandline_is_pipe first; the splitter is blind
        assert_eq!(extract_pipe_commands("a | ").unwrap(), vec!["a"]);
    }
}
