//! Discord size limits and helpers that keep replies inside them

/// Longest message body Discord accepts, in characters
pub const MESSAGE_LIMIT: usize = 2000;

/// Longest embed description Discord accepts, in characters
pub const EMBED_DESCRIPTION_LIMIT: usize = 4096;

/// Longest audit log reason Discord accepts, in characters
pub const REASON_LIMIT: usize = 512;

/// Longest reminder text accepted by `/remindme`
pub const REMINDER_LIMIT: usize = 1000;

const ELLIPSIS: char = '…';

/// Room kept at the end of a listing for the "…and N more" line
const OVERFLOW_RESERVE: usize = 32;

/// Cut `text` to at most `max_chars` characters, ending in an ellipsis when cut
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut cut = text.chars().take(max_chars - 1).collect::<String>();
    cut.push(ELLIPSIS);
    cut
}

/// Join `lines` with newlines into at most `max_chars` characters
///
/// Lines are kept in order until the next one would not fit. `total` is the
/// full number of entries the lines were taken from; when any are left out a
/// final "…and N more" line says how many. A single line longer than the
/// budget is truncated rather than dropped.
#[must_use]
pub fn join_within(lines: &[String], total: usize, max_chars: usize) -> String {
    let budget = max_chars.saturating_sub(OVERFLOW_RESERVE);
    let mut out = String::new();
    let mut used = 0;
    let mut shown = 0;

    for line in lines {
        let separator = usize::from(shown > 0);
        let remaining = budget.saturating_sub(used + separator);
        let length = line.chars().count();
        if length > remaining {
            if shown == 0 && remaining > 0 {
                out.push_str(&truncate(line, remaining));
                shown = 1;
            }
            break;
        }
        if separator == 1 {
            out.push('\n');
        }
        out.push_str(line);
        used += separator + length;
        shown += 1;
    }

    let hidden = total.saturating_sub(shown);
    if hidden > 0 {
        if shown > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{ELLIPSIS}and {hidden} more"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly", 7), "exactly");
        assert_eq!(truncate("too long", 4), "too…");
        assert_eq!(truncate("ééééé", 3).chars().count(), 3);
        assert_eq!(truncate("anything", 0), "");
    }

    #[test]
    fn test_join_within_keeps_everything_that_fits() {
        let lines = vec!["a".to_string(), "b".to_string()];
        assert_eq!(join_within(&lines, 2, 100), "a\nb");
    }

    #[test]
    fn test_join_within_counts_hidden_entries() {
        let lines = (0..50).map(|i| format!("{i:0>40}")).collect::<Vec<_>>();
        let joined = join_within(&lines, 60, MESSAGE_LIMIT);
        assert!(joined.chars().count() <= MESSAGE_LIMIT);
        let shown = joined.lines().count() - 1;
        assert!(joined.ends_with(&format!("…and {} more", 60 - shown)));
    }

    #[test]
    fn test_join_within_truncates_a_single_huge_line() {
        let lines = vec!["x".repeat(5000), "y".to_string()];
        let joined = join_within(&lines, 2, MESSAGE_LIMIT);
        assert!(joined.chars().count() <= MESSAGE_LIMIT);
        assert!(joined.starts_with("xxx"));
        assert!(joined.ends_with("…and 1 more"));
    }
}
