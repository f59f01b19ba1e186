//! Alignment and text layout flags.

use bitflags::bitflags;

bitflags! {
    /// How a box is placed relative to its anchor point, plus text wrap flags.
    ///
    /// `LEFT` and `TOP` are the zero value: an empty set means top-left.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Align: u32 {
        const LEFT = 0;
        const TOP = 0;
        const BOTTOM = 1 << 0;
        const HCENTER = 1 << 2;
        const VCENTER = 1 << 3;
        const RIGHT = 1 << 4;
        /// Break lines so the text fits the bounds width
        const WRAP_TEXT = 1 << 13;
        /// Cut lines that overflow the bounds width and append an ellipsis
        const ELLIPSIZE_TEXT = 1 << 14;

        const CENTER = Self::HCENTER.bits() | Self::VCENTER.bits();
        const TOP_LEFT = 0;
    }
}

impl Align {
    /// Only the wrap/ellipsize bits
    pub fn wrap_flags(self) -> Align {
        self & (Align::WRAP_TEXT | Align::ELLIPSIZE_TEXT)
    }

    /// True when either wrapping or ellipsizing was requested
    pub fn wants_wrap(self) -> bool {
        !self.wrap_flags().is_empty()
    }

    /// Only the horizontal placement bits, used to justify multi-line bitmaps
    pub fn horizontal(self) -> Align {
        self & (Align::HCENTER | Align::RIGHT)
    }
}
