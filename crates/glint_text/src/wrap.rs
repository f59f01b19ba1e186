//! Greedy word wrapping
//!
//! Break opportunities come from the Unicode line breaking algorithm
//! (`unicode-linebreak`), so CJK text can wrap between characters while Latin
//! text wraps between words. Widths are supplied by a [`MeasureWidth`]
//! callback; the wrapper knows nothing about fonts.

use glint_core::Align;
use unicode_linebreak::linebreaks;

/// Appended to lines cut by [`Align::ELLIPSIZE_TEXT`]
pub const ELLIPSIS: &str = "\u{2026}";

/// Width of a candidate substring, in the same units as the wrap width
pub trait MeasureWidth {
    fn measure_width(&mut self, text: &str) -> f32;
}

impl<F: FnMut(&str) -> f32> MeasureWidth for F {
    fn measure_width(&mut self, text: &str) -> f32 {
        self(text)
    }
}

/// Line breaker for one source string
pub struct WordWrapper<'a, M> {
    text: &'a str,
    max_width: f32,
    flags: Align,
    measure: M,
}

impl<'a, M: MeasureWidth> WordWrapper<'a, M> {
    pub fn new(text: &'a str, max_width: f32, flags: Align, measure: M) -> Self {
        Self {
            text,
            max_width,
            flags,
            measure,
        }
    }

    /// The source text with line breaks inserted (and overflowing lines
    /// ellipsized when requested)
    pub fn wrapped(mut self) -> String {
        if !self.flags.wants_wrap() || self.max_width.is_nan() || self.max_width <= 0.0 {
            return self.text.to_owned();
        }

        let mut lines: Vec<String> = Vec::new();
        for paragraph in self.text.split('\n') {
            if self.flags.contains(Align::WRAP_TEXT) {
                self.wrap_paragraph(paragraph, &mut lines);
            } else {
                lines.push(paragraph.to_owned());
            }
        }

        if self.flags.contains(Align::ELLIPSIZE_TEXT) {
            for line in &mut lines {
                self.ellipsize(line);
            }
        }

        lines.join("\n")
    }

    fn fits(&mut self, text: &str) -> bool {
        self.measure.measure_width(text.trim_end()) <= self.max_width
    }

    fn wrap_paragraph(&mut self, paragraph: &str, lines: &mut Vec<String>) {
        if self.fits(paragraph) {
            lines.push(paragraph.trim_end().to_owned());
            return;
        }

        let mut line = String::new();
        let mut start = 0;
        for (end, _) in linebreaks(paragraph) {
            let segment = &paragraph[start..end];
            start = end;

            let candidate = format!("{line}{segment}");
            if self.fits(&candidate) {
                line = candidate;
                continue;
            }

            if !line.trim_end().is_empty() {
                lines.push(line.trim_end().to_owned());
            }
            line.clear();

            if self.fits(segment) {
                line.push_str(segment);
                continue;
            }

            // Unbreakable token wider than the line: fall back to characters
            for c in segment.chars() {
                if line.is_empty() && c.is_whitespace() {
                    continue;
                }
                line.push(c);
                if !self.fits(&line) && line.chars().count() > 1 {
                    line.pop();
                    lines.push(line.trim_end().to_owned());
                    line.clear();
                    if !c.is_whitespace() {
                        line.push(c);
                    }
                }
            }
        }

        lines.push(line.trim_end().to_owned());
    }

    fn ellipsize(&mut self, line: &mut String) {
        if self.measure.measure_width(line) <= self.max_width {
            return;
        }

        let mut cut = line.clone();
        while cut.pop().is_some() {
            let candidate = format!("{}{}", cut.trim_end(), ELLIPSIS);
            if self.measure.measure_width(&candidate) <= self.max_width {
                *line = candidate;
                return;
            }
        }
        *line = ELLIPSIS.to_owned();
    }
}

/// Convenience wrapper around [`WordWrapper`]
pub fn wrap_text(text: &str, max_width: f32, flags: Align, measure: impl MeasureWidth) -> String {
    WordWrapper::new(text, max_width, flags, measure).wrapped()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 10px per character
    fn mono(text: &str) -> f32 {
        text.chars().count() as f32 * 10.0
    }

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(wrap_text("hello", 100.0, Align::WRAP_TEXT, mono), "hello");
    }

    #[test]
    fn test_no_flags_untouched() {
        assert_eq!(wrap_text("hello world", 30.0, Align::CENTER, mono), "hello world");
    }

    #[test]
    fn test_wraps_at_words() {
        let wrapped = wrap_text("the quick brown fox", 100.0, Align::WRAP_TEXT, mono);
        assert_eq!(wrapped, "the quick\nbrown fox");
    }

    #[test]
    fn test_preserves_content() {
        let text = "This is a paragraph with optimal line height for readability.";
        let wrapped = wrap_text(text, 200.0, Align::WRAP_TEXT, mono);

        assert!(wrapped.lines().count() > 1);
        for line in wrapped.lines() {
            assert!(mono(line) <= 200.0, "line too wide: {:?}", line);
        }
        let normalized: Vec<&str> = wrapped.split_whitespace().collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(normalized, original);
    }

    #[test]
    fn test_long_word_breaks_at_characters() {
        let wrapped = wrap_text("abcdefghij", 40.0, Align::WRAP_TEXT, mono);
        assert_eq!(wrapped, "abcd\nefgh\nij");
    }

    #[test]
    fn test_explicit_newlines_kept() {
        let wrapped = wrap_text("one\ntwo three", 50.0, Align::WRAP_TEXT, mono);
        assert_eq!(wrapped, "one\ntwo\nthree");
    }

    #[test]
    fn test_cjk_breaks_between_characters() {
        let wrapped = wrap_text("日本語のテキスト", 30.0, Align::WRAP_TEXT, mono);
        for line in wrapped.lines() {
            assert!(mono(line) <= 30.0);
        }
        assert_eq!(wrapped.replace('\n', ""), "日本語のテキスト");
    }

    #[test]
    fn test_ellipsize() {
        let cut = wrap_text("hello world", 60.0, Align::ELLIPSIZE_TEXT, mono);
        assert_eq!(cut, "hello\u{2026}");
        assert!(mono(&cut) <= 60.0);

        let kept = wrap_text("hi", 60.0, Align::ELLIPSIZE_TEXT, mono);
        assert_eq!(kept, "hi");
    }

    #[test]
    fn test_different_widths_give_different_text() {
        let text = "alpha beta gamma delta";
        let narrow = wrap_text(text, 60.0, Align::WRAP_TEXT, mono);
        let wide = wrap_text(text, 120.0, Align::WRAP_TEXT, mono);
        assert_ne!(narrow, wide);
    }

    #[test]
    fn test_zero_width_is_noop() {
        assert_eq!(wrap_text("a b c", 0.0, Align::WRAP_TEXT, mono), "a b c");
    }
}
