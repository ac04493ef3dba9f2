use super::measure::estimate_width;
use super::wrap::wrap_lines;
use super::{LINE_HEIGHT_FACTOR, MAX_TEXT_LINES, Role};

/// Outcome of the auto-fit search: the chosen font size and the wrapping it
/// produced.
#[derive(Debug, Clone)]
pub struct WrapResult {
    pub font_size: f32,
    pub lines: Vec<String>,
    pub line_height: f32,
    pub max_line_width: f32,
}

/// Pick the largest font size from the role's ladder whose wrapping stays
/// within the line limit. If even the smallest step overflows, its wrapping
/// is used anyway; the band grows instead of the call failing.
pub fn autofit(lines: &[String], role: Role, max_width: f32) -> WrapResult {
    let ladder = role.ladder();
    let mut font_size = ladder[ladder.len() - 1];
    let mut wrapped = Vec::new();
    for &size in ladder {
        let candidate = wrap_lines(lines, max_width, size);
        let fits = candidate.len() <= MAX_TEXT_LINES;
        font_size = size;
        wrapped = candidate;
        if fits {
            break;
        }
    }

    let max_line_width = wrapped
        .iter()
        .map(|line| estimate_width(line, font_size))
        .fold(0.0, f32::max);

    WrapResult {
        font_size,
        line_height: font_size * LINE_HEIGHT_FACTOR,
        max_line_width,
        lines: wrapped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn hook_scenario_keeps_first_ladder_step() {
        // safe max width for any position is 1080 - 64 - 120 = 896
        let lines = owned(&["I screenshot it.", "Then it dies."]);
        let result = autofit(&lines, Role::Hook, 896.0);
        assert_eq!(result.font_size, 96.0);
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0], "I screenshot it.");
        assert_eq!(result.lines[1], "Then it dies.");
        assert!((result.line_height - 129.6).abs() < 1e-3);
    }

    #[test]
    fn body_scenario_steps_down_to_64() {
        // 40 characters; at 76 every word lands on its own line (4 > 3),
        // at 64 the words pair up into exactly two lines
        let lines = owned(&["fragmented screenshot galleries overflow"]);
        let result = autofit(&lines, Role::Body, 784.0);
        assert_eq!(result.font_size, 64.0);
        assert_eq!(
            result.lines,
            vec!["fragmented screenshot", "galleries overflow"]
        );
    }

    #[test]
    fn falls_back_to_smallest_step_when_nothing_fits() {
        let lines = owned(&[
            "a very long opening line that cannot possibly fit in three rows",
        ]);
        let result = autofit(&lines, Role::Cta, 180.0);
        assert_eq!(result.font_size, 38.0);
        assert!(result.lines.len() > MAX_TEXT_LINES);
        let rejoined = result.lines.join(" ");
        assert_eq!(
            rejoined,
            "a very long opening line that cannot possibly fit in three rows"
        );
    }

    #[test]
    fn autofit_is_idempotent_at_chosen_size() {
        let lines = owned(&["fragmented screenshot galleries overflow"]);
        let first = autofit(&lines, Role::Body, 784.0);
        let again = wrap_lines(&lines, 784.0, first.font_size);
        assert_eq!(first.lines, again);
    }

    #[test]
    fn max_line_width_matches_widest_line() {
        let lines = owned(&["short", "a considerably longer line of text"]);
        let result = autofit(&lines, Role::Body, 896.0);
        let widest = result
            .lines
            .iter()
            .map(|line| estimate_width(line, result.font_size))
            .fold(0.0, f32::max);
        assert_eq!(result.max_line_width, widest);
    }

    #[test]
    fn empty_input_yields_empty_wrap() {
        let result = autofit(&[], Role::Hook, 896.0);
        assert_eq!(result.font_size, 96.0);
        assert!(result.lines.is_empty());
        assert_eq!(result.max_line_width, 0.0);
    }
}
