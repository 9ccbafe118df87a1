//! Bounded-size output capture.

/// Truncate text to `max_chars` while preserving head and tail portions.
///
/// Text at or under the limit is returned unchanged. Longer text is split
/// into a head of `floor(max_chars * split_ratio)` characters and a tail of
/// the remainder, with a literal marker between them recording the original
/// length.
pub fn truncate_output(text: &str, max_chars: usize, split_ratio: f64) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let total = text.chars().count();
    let marker = format!(
        "\n[--- OUTPUT TRUNCATED | middle omitted | original length={} chars ---]\n",
        total
    );

    let head_size = (max_chars as f64 * split_ratio).floor() as usize;
    let tail_size = max_chars - head_size;

    let head: String = text.chars().take(head_size).collect();
    let tail: String = if tail_size > 0 {
        text.chars().skip(total - tail_size).collect()
    } else {
        String::new()
    };

    format!("{}{}{}", head, marker, tail)
}
