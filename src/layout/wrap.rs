use super::measure::estimate_width;

// Unit-like tokens that must stay glued to a preceding standalone numeral:
// "30 min" or "2 hrs" reads wrong when the number ends a line alone.
const KEEP_TOGETHER_UNITS: [&str; 16] = [
    "min", "mins", "minute", "minutes", "hr", "hrs", "hour", "hours", "day", "days", "sec", "secs",
    "second", "seconds", "am", "pm",
];

/// Wrap `lines` so every output line's estimated width at `font_size` stays
/// within `max_width`. Splits only at whitespace; lines that already fit pass
/// through unchanged, empty input lines are skipped. A single word wider than
/// the budget is emitted on its own line rather than broken apart.
pub fn wrap_lines(lines: &[String], max_width: f32, font_size: f32) -> Vec<String> {
    let mut out = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if estimate_width(trimmed, font_size) <= max_width {
            out.push(trimmed.to_string());
            continue;
        }
        wrap_single(trimmed, max_width, font_size, &mut out);
    }
    out
}

fn wrap_single(line: &str, max_width: f32, font_size: f32, out: &mut Vec<String>) {
    let words = merge_keep_together(line);
    let mut current = String::new();
    for word in words {
        if current.is_empty() {
            current = word;
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if estimate_width(&candidate, font_size) <= max_width {
            current = candidate;
        } else {
            out.push(current);
            current = word;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

fn merge_keep_together(line: &str) -> Vec<String> {
    let raw: Vec<&str> = line.split_whitespace().collect();
    let mut merged = Vec::with_capacity(raw.len());
    let mut index = 0;
    while index < raw.len() {
        let word = raw[index];
        if index + 1 < raw.len() && is_numeral(word) && is_unit_token(raw[index + 1]) {
            merged.push(format!("{} {}", word, raw[index + 1]));
            index += 2;
        } else {
            merged.push(word.to_string());
            index += 1;
        }
    }
    merged
}

fn is_numeral(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|ch| ch.is_ascii_digit())
}

fn is_unit_token(token: &str) -> bool {
    let stripped = token.trim_end_matches(['.', ',', '!', '?', ':', ';']);
    let lower = stripped.to_lowercase();
    KEEP_TOGETHER_UNITS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn short_lines_pass_through() {
        let wrapped = wrap_lines(&owned(&["hello world"]), 10_000.0, 48.0);
        assert_eq!(wrapped, vec!["hello world"]);
    }

    #[test]
    fn empty_lines_are_skipped() {
        let wrapped = wrap_lines(&owned(&["", "  ", "keep"]), 10_000.0, 48.0);
        assert_eq!(wrapped, vec!["keep"]);
    }

    #[test]
    fn wraps_at_whitespace_preserving_word_order() {
        let input = owned(&["alpha beta gamma delta epsilon"]);
        let wrapped = wrap_lines(&input, 300.0, 48.0);
        assert!(wrapped.len() > 1);
        let rejoined = wrapped.join(" ");
        assert_eq!(rejoined, "alpha beta gamma delta epsilon");
    }

    #[test]
    fn every_multi_word_line_is_within_budget() {
        let input = owned(&["the quick brown fox jumps over the lazy dog"]);
        let max_width = 260.0;
        for line in wrap_lines(&input, max_width, 40.0) {
            if line.contains(' ') {
                assert!(estimate_width(&line, 40.0) <= max_width, "overflow: {:?}", line);
            }
        }
    }

    #[test]
    fn oversized_single_word_still_emitted() {
        let input = owned(&["unsplittablemegaword tail"]);
        let wrapped = wrap_lines(&input, 120.0, 48.0);
        assert!(wrapped.contains(&"unsplittablemegaword".to_string()));
        assert!(wrapped.contains(&"tail".to_string()));
    }

    #[test]
    fn greedy_packing_is_maximal() {
        // each line would overflow if it also took the first word of the next
        let input = owned(&["one two three four five six seven"]);
        let max_width = 280.0;
        let font_size = 40.0;
        let wrapped = wrap_lines(&input, max_width, font_size);
        for pair in wrapped.windows(2) {
            let head = pair[1].split_whitespace().next().unwrap();
            let widened = format!("{} {}", pair[0], head);
            assert!(estimate_width(&widened, font_size) > max_width);
        }
    }

    #[test]
    fn numeral_unit_pair_never_splits() {
        let text = owned(&["30 min more"]);
        let font_size = 40.0;
        let pair_width = estimate_width("30 min", font_size);
        // any budget wide enough for the pair keeps it on one line
        for max_width in [pair_width, pair_width + 20.0, pair_width + 200.0] {
            let wrapped = wrap_lines(&text, max_width, font_size);
            let holds_pair = wrapped.iter().any(|line| line.contains("30 min"));
            assert!(holds_pair, "pair split at width {}: {:?}", max_width, wrapped);
        }
    }

    #[test]
    fn unit_with_trailing_punctuation_still_merges() {
        let wrapped = wrap_lines(&owned(&["done in 5 mins. promise"]), 170.0, 40.0);
        assert!(wrapped.iter().any(|line| line.contains("5 mins.")), "{:?}", wrapped);
    }

    #[test]
    fn plain_numeral_without_unit_wraps_normally() {
        let input = owned(&["chapter 30 ends here soon enough"]);
        let wrapped = wrap_lines(&input, 240.0, 40.0);
        assert_eq!(wrapped.join(" "), "chapter 30 ends here soon enough");
    }
}
