use crate::host::TextMetrics;

/// Fixed padding subtracted from the wrap budget so text never touches the
/// window border.
pub const WRAP_MARGIN_PX: u32 = 36;

/// Greedy single-pass word wrap against a pixel budget.
///
/// Lines break at the last space seen once the measured width plus
/// [`WRAP_MARGIN_PX`] exceeds `budget_px`. Whitespace at line boundaries is
/// trimmed. There is no hyphenation: a single word wider than the budget is
/// emitted as one overflowing line. Pure; identical input yields identical
/// output.
pub fn wrap(text: &str, budget_px: u32, metrics: &dyn TextMetrics) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut line_start = 0usize;
    let mut last_space = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        if chars[i] == ' ' {
            last_space = i;
        }

        let measured: String = chars[line_start..=i].iter().collect();
        let width = metrics.measure(measured.trim());

        if width + WRAP_MARGIN_PX > budget_px && last_space > line_start {
            // Cut at the last space and resume just after it. A word too wide
            // for the budget never advances last_space past line_start, so it
            // falls through and overflows on the next break instead of
            // spinning here.
            let line: String = chars[line_start..last_space].iter().collect();
            push_line(&mut out, line.trim());
            line_start = last_space + 1;
            i = line_start;
            continue;
        }

        i += 1;
    }

    if line_start < chars.len() {
        let tail: String = chars[line_start..].iter().collect();
        let tail = tail.trim();
        if !tail.is_empty() {
            push_line(&mut out, tail);
        }
    }

    out
}

fn push_line(out: &mut String, line: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(line);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ten pixels per character, the width model used across these tests.
    struct CharAdvance;

    impl TextMetrics for CharAdvance {
        fn measure(&self, text: &str) -> u32 {
            text.chars().count() as u32 * 10
        }
    }

    fn lines(text: &str, budget_px: u32) -> Vec<String> {
        wrap(text, budget_px, &CharAdvance)
            .split('\n')
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(wrap("", 200, &CharAdvance), "");
    }

    #[test]
    fn short_text_is_a_single_line() {
        assert_eq!(wrap("hello there", 200, &CharAdvance), "hello there");
    }

    #[test]
    fn quick_brown_fox_respects_budget_minus_margin() {
        let wrapped = lines("The quick brown fox", 100);
        assert_eq!(wrapped, vec!["The", "quick", "brown", "fox"]);
        for line in &wrapped {
            assert!(
                CharAdvance.measure(line) + WRAP_MARGIN_PX <= 100,
                "line '{line}' exceeds budget"
            );
        }
    }

    #[test]
    fn words_survive_in_order() {
        let source = "one two three four five six seven eight nine ten";
        let rejoined = wrap(source, 120, &CharAdvance).replace('\n', " ");
        let rejoined: Vec<&str> = rejoined.split_whitespace().collect();
        let original: Vec<&str> = source.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn overlong_word_overflows_on_its_own_line() {
        let wrapped = lines("a incomprehensibilities b", 100);
        assert_eq!(wrapped, vec!["a", "incomprehensibilities", "b"]);
    }

    #[test]
    fn word_with_no_spaces_is_one_overflowing_line() {
        assert_eq!(
            wrap("supercalifragilistic", 80, &CharAdvance),
            "supercalifragilistic"
        );
    }

    #[test]
    fn budget_below_margin_still_terminates() {
        let wrapped = lines("tiny budget case here", 10);
        assert_eq!(wrapped, vec!["tiny", "budget", "case", "here"]);
    }

    #[test]
    fn boundary_whitespace_is_trimmed() {
        let wrapped = wrap("  leading and trailing  padding here  ", 140, &CharAdvance);
        for line in wrapped.split('\n') {
            assert_eq!(line, line.trim());
            assert!(!line.is_empty());
        }
    }

    #[test]
    fn wrap_is_idempotent_on_identical_input() {
        let a = wrap("the same text measured twice over", 110, &CharAdvance);
        let b = wrap("the same text measured twice over", 110, &CharAdvance);
        assert_eq!(a, b);
    }
}
