//! Roman numeral recognition and conversion.
//!
//! Recognition decides whether a word is a numeral literal at all and is used
//! by the tokenizer; conversion turns an already-recognized (optionally signed)
//! numeral into its integer value.

/// The largest value a well-formed numeral can spell.
pub const MAX_NUMERAL: i64 = 3999;

/// `(one, five, ten)` glyphs for the hundreds, tens and ones positions.
const DIGIT_GROUPS: [(u8, u8, u8); 3] = [
    (b'C', b'D', b'M'),
    (b'X', b'L', b'C'),
    (b'I', b'V', b'X'),
];

pub fn glyph_value(c: char) -> Option<i64> {
    match c {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    }
}

/// Whether `c` is one of the seven numeral glyphs.
pub fn is_glyph(c: char) -> bool {
    glyph_value(c).is_some()
}

/// Whether `word` is a well-formed numeral between 1 and 3999.
///
/// Equivalent to matching `^(M{0,3})(CM|CD|D?C{0,3})(XC|XL|L?X{0,3})(IX|IV|V?I{0,3})$`
/// against a non-empty word.
pub fn is_numeral(word: &str) -> bool {
    let bytes = word.as_bytes();
    if bytes.is_empty() {
        return false;
    }

    let mut i = repeat_at_most(bytes, 0, b'M', 3);
    for group in DIGIT_GROUPS {
        i += match_digit(&bytes[i..], group);
    }
    i == bytes.len()
}

/// Matches one decimal position (`9`, `4`, or `5? 1{0,3}` forms) and returns
/// how many bytes it consumed.
fn match_digit(bytes: &[u8], (one, five, ten): (u8, u8, u8)) -> usize {
    match bytes {
        [a, b, ..] if *a == one && (*b == ten || *b == five) => 2,
        [a, ..] if *a == five => 1 + repeat_at_most(bytes, 1, one, 3),
        _ => repeat_at_most(bytes, 0, one, 3),
    }
}

fn repeat_at_most(bytes: &[u8], start: usize, glyph: u8, max: usize) -> usize {
    bytes[start..]
        .iter()
        .take(max)
        .take_while(|b| **b == glyph)
        .count()
}

/// Converts a numeral, optionally prefixed with `-`, to its value.
///
/// Glyphs are read right to left: a glyph at least as large as the one after
/// it is added, a smaller one is subtracted. Returns `None` if a character is
/// not a numeral glyph; well-formedness is the caller's business.
pub fn parse_numeral(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let mut total = 0_i64;
    let mut previous = 0_i64;
    for c in digits.chars().rev() {
        let current = glyph_value(c)?;
        if current >= previous {
            total += current;
        } else {
            total -= current;
        }
        previous = current;
    }

    Some(if negative { -total } else { total })
}
