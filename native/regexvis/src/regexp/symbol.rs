//! Character symbols carried by regular expression leaves.

/// Reserved character used as the epsilon (empty word) symbol.
///
/// It prints as `ε` and the parser reads it back as epsilon, so printed
/// expressions containing epsilon leaves survive a round trip.
pub const EPSILON: char = 'ε';

/// Check if a character is the epsilon symbol.
#[inline]
pub fn is_epsilon(c: char) -> bool {
    c == EPSILON
}
