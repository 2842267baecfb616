use serde::{Deserialize, Serialize};

use crate::bidi::{Direction, first_strong_direction};

/// Inclusive code point ranges of right-to-left scripts.
///
/// Hebrew through Arabic Extended-A form one contiguous run (U+0590..U+08FF).
/// Presentation forms stop at U+FEFC so a lone byte order mark is not RTL.
pub const RTL_RANGES: &[(u32, u32)] = &[
    (0x0590, 0x05FF), // Hebrew
    (0x0600, 0x06FF), // Arabic
    (0x0700, 0x074F), // Syriac
    (0x0750, 0x077F), // Arabic Supplement
    (0x0780, 0x07BF), // Thaana
    (0x07C0, 0x07FF), // NKo
    (0x0800, 0x083F), // Samaritan
    (0x0840, 0x085F), // Mandaic
    (0x0860, 0x086F), // Syriac Supplement
    (0x0870, 0x089F), // Arabic Extended-B
    (0x08A0, 0x08FF), // Arabic Extended-A
    (0xFB1D, 0xFB4F), // Hebrew presentation forms
    (0xFB50, 0xFDFF), // Arabic Presentation Forms-A
    (0xFE70, 0xFEFC), // Arabic Presentation Forms-B
    (0x10800, 0x10FFF), // historic RTL scripts, Hanifi Rohingya, Arabic Extended-C
    (0x1E800, 0x1EFFF), // Mende Kikakui, Adlam, Arabic mathematical symbols
];

pub fn is_rtl_char(ch: char) -> bool {
    let cp = ch as u32;
    RTL_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&cp))
}

/// True iff `text` contains at least one code point from [`RTL_RANGES`].
///
/// Total over all input: empty text is `false`, combining marks are
/// classified by their own code point like any other character.
pub fn is_rtl_dominant(text: &str) -> bool {
    text.chars().any(is_rtl_char)
}

/// UTF-16 variant for text handed over by a host that stores code units.
/// Unpaired surrogates are skipped, never classified.
pub fn is_rtl_dominant_utf16(units: &[u16]) -> bool {
    char::decode_utf16(units.iter().copied())
        .filter_map(Result::ok)
        .any(is_rtl_char)
}

/// How element text is judged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detection {
    /// Any RTL code point makes the text RTL.
    #[default]
    AnyRtl,
    /// The first strong directional character decides.
    FirstStrong,
}

impl Detection {
    pub fn is_rtl(self, text: &str) -> bool {
        match self {
            Detection::AnyRtl => is_rtl_dominant(text),
            Detection::FirstStrong => first_strong_direction(text) == Some(Direction::Rtl),
        }
    }
}
