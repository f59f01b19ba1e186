//! Emoji detection
//!
//! Strings containing emoji are rasterized in full color when the backend can
//! do it; everything else goes through the cheaper alpha-mask path.

/// Check if a character is an emoji or a pictographic symbol usually drawn in color
pub fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F300..=0x1F5FF   // Misc symbols and pictographs
        | 0x1F600..=0x1F64F // Emoticons
        | 0x1F680..=0x1F6FF // Transport and map
        | 0x1F900..=0x1F9FF // Supplemental symbols and pictographs
        | 0x1FA70..=0x1FAFF // Symbols and pictographs extended-A
        | 0x1F1E6..=0x1F1FF // Regional indicators (flags)
        | 0x2600..=0x26FF   // Misc symbols
        | 0x2700..=0x27BF   // Dingbats
        | 0x1F000..=0x1F02F // Mahjong tiles
        | 0x1F0A0..=0x1F0FF // Playing cards
    )
}

/// Check if a string contains any emoji
pub fn contains_emoji(text: &str) -> bool {
    text.chars().any(is_emoji)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_emoji() {
        assert!(is_emoji('😀'));
        assert!(is_emoji('🚀'));
        assert!(is_emoji('☀'));
        assert!(!is_emoji('A'));
        assert!(!is_emoji('한'));
    }

    #[test]
    fn test_contains_emoji() {
        assert!(contains_emoji("Save 💾"));
        assert!(!contains_emoji("Save"));
        assert!(!contains_emoji(""));
    }
}
