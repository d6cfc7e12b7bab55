//! Output truncation helpers.
//!
//! Command output ends up in log lines and in error values that the board
//! and HTTP API may show, and it can be arbitrarily large (a verbose
//! `apt-get update`, a failing `tar` listing every file). The head carries the
//! invocation context and the tail carries the final error, so the middle is
//! what gets dropped.

/// Default maximum characters kept per output stream.
pub const DEFAULT_MAX_CHARS: usize = 16_000;

/// Cap `output` at `max_chars` characters by omitting its middle.
///
/// Splits on character boundaries, never inside a multi-byte sequence.
pub fn truncate_output(output: &str, max_chars: usize) -> String {
    let total = output.chars().count();
    if total <= max_chars {
        return output.to_owned();
    }

    let half = max_chars / 2;
    let head_end = byte_offset(output, half);
    let tail_start = byte_offset(output, total - half);
    let omitted = total - 2 * half;

    format!(
        "{}\n... [{omitted} chars omitted] ...\n{}",
        &output[..head_end],
        &output[tail_start..]
    )
}

/// Byte offset of the `n`-th character (or the end of `s`).
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Keep only the last `n` non-empty lines of `output`, used in log fields.
pub fn tail_lines(output: &str, n: usize) -> String {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_unchanged() {
        assert_eq!(truncate_output("Installed: 1.4.2", 100), "Installed: 1.4.2");
        assert_eq!(truncate_output("", 10), "");
    }

    #[test]
    fn exact_limit_is_not_truncated() {
        let s = "x".repeat(64);
        assert_eq!(truncate_output(&s, 64), s);
    }

    #[test]
    fn long_output_keeps_both_ends() {
        let input = format!("{}{}{}", "A".repeat(50), "B".repeat(100), "C".repeat(50));
        let result = truncate_output(&input, 100);
        assert!(result.starts_with(&"A".repeat(50)));
        assert!(result.ends_with(&"C".repeat(50)));
        assert!(result.contains("[100 chars omitted]"));
        assert!(!result.contains('B'));
    }

    #[test]
    fn multibyte_chars_are_counted_not_bytes() {
        // 10 chars, 30 bytes
        let s = "€".repeat(10);
        assert_eq!(truncate_output(&s, 10), s);

        let long = "€".repeat(40);
        let result = truncate_output(&long, 10);
        assert!(result.contains("[30 chars omitted]"));
    }

    #[test]
    fn tail_lines_skips_blank_lines() {
        let out = "one\n\ntwo\nthree\n\n";
        assert_eq!(tail_lines(out, 2), "two\nthree");
        assert_eq!(tail_lines(out, 10), "one\ntwo\nthree");
    }
}
