//! Coarse paragraph direction built on `unicode-bidi`.

use unicode_bidi::{BidiClass, bidi_class};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
}

/// Direction of the first strong character (UAX-9 rules P2/P3), skipping
/// neutrals, digits and marks. `None` when the text has no strong character.
pub fn first_strong_direction(text: &str) -> Option<Direction> {
    text.chars().find_map(|ch| match bidi_class(ch) {
        BidiClass::L => Some(Direction::Ltr),
        BidiClass::R | BidiClass::AL => Some(Direction::Rtl),
        _ => None,
    })
}
