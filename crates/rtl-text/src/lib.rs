//! rtl-text: script detection for direction decisions.
//!
//! - [`script`]: the RTL-dominance predicate over Unicode code points
//! - [`bidi`]: first-strong direction built on `unicode-bidi`
//!
//! Neither module reorders text; they only answer "should this read RTL".

pub mod bidi;
pub mod script;

pub use bidi::{Direction, first_strong_direction};
pub use script::{Detection, RTL_RANGES, is_rtl_char, is_rtl_dominant, is_rtl_dominant_utf16};
