/// Character budget for one summarizer input.
pub const INPUT_CHAR_CAP: usize = 6000;

/// Shrink an over-budget input by keeping the head (70% of the budget) and
/// the tail (25%), joined by an ellipsis line. Declarations and early logic
/// live at the top of most constructs and returns at the bottom, which is
/// why the middle is what gets dropped.
#[must_use]
pub fn compress_input(text: &str) -> String {
    compress_to(text, INPUT_CHAR_CAP)
}

fn compress_to(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head_budget = max_chars * 7 / 10;
    let tail_budget = max_chars / 4;
    let head: String = text.chars().take(head_budget).collect();
    let tail_start = text.chars().count() - tail_budget;
    let tail: String = text.chars().skip(tail_start).collect();
    format!("{}\n...\n{}", head.trim_end(), tail.trim_start())
}
