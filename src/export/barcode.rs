//! Code 39 barcode geometry.
//!
//! Each character is nine elements, alternating bar and space starting with a
//! bar; three of the nine are wide. Characters are separated by one narrow
//! space and the whole symbol is framed by `*`.

/// Element patterns, `1` = wide
const PATTERNS: [(char, &str); 44] = [
    ('0', "000110100"),
    ('1', "100100001"),
    ('2', "001100001"),
    ('3', "101100000"),
    ('4', "000110001"),
    ('5', "100110000"),
    ('6', "001110000"),
    ('7', "000100101"),
    ('8', "100100100"),
    ('9', "001100100"),
    ('A', "100001001"),
    ('B', "001001001"),
    ('C', "101001000"),
    ('D', "000011001"),
    ('E', "100011000"),
    ('F', "001011000"),
    ('G', "000001101"),
    ('H', "100001100"),
    ('I', "001001100"),
    ('J', "000011100"),
    ('K', "100000011"),
    ('L', "001000011"),
    ('M', "101000010"),
    ('N', "000010011"),
    ('O', "100010010"),
    ('P', "001010010"),
    ('Q', "000000111"),
    ('R', "100000110"),
    ('S', "001000110"),
    ('T', "000010110"),
    ('U', "110000001"),
    ('V', "011000001"),
    ('W', "111000000"),
    ('X', "010010001"),
    ('Y', "110010000"),
    ('Z', "011010000"),
    ('-', "010000101"),
    ('.', "110000100"),
    (' ', "011000100"),
    ('$', "010101000"),
    ('/', "010100010"),
    ('+', "010001010"),
    ('%', "000101010"),
    ('*', "010010100"),
];

/// Wide element width in narrow units
pub const WIDE_RATIO: f32 = 2.5;

/// One dark bar, in narrow units from the left edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Left edge
    pub offset: f32,
    /// Width
    pub width: f32,
}

fn pattern(c: char) -> Option<&'static str> {
    PATTERNS
        .iter()
        .find(|(ch, _)| *ch == c)
        .map(|(_, p)| *p)
}

/// Whether `text` can be encoded (lowercase letters are upper-cased first)
#[must_use]
pub fn is_encodable(text: &str) -> bool {
    text.chars()
        .all(|c| c != '*' && pattern(c.to_ascii_uppercase()).is_some())
}

/// Bars for `text` framed by start/stop characters, plus the total symbol
/// width. `None` when a character has no Code 39 pattern.
#[must_use]
pub fn encode(text: &str) -> Option<(Vec<Bar>, f32)> {
    if !is_encodable(text) {
        return None;
    }

    let framed = std::iter::once('*')
        .chain(text.chars().map(|c| c.to_ascii_uppercase()))
        .chain(std::iter::once('*'));

    let mut bars = Vec::new();
    let mut x = 0.0_f32;
    for (index, c) in framed.enumerate() {
        if index > 0 {
            x += 1.0;
        }
        let elements = pattern(c)?;
        for (i, element) in elements.chars().enumerate() {
            let width = if element == '1' { WIDE_RATIO } else { 1.0 };
            if i % 2 == 0 {
                bars.push(Bar { offset: x, width });
            }
            x += width;
        }
    }
    Some((bars, x))
}
