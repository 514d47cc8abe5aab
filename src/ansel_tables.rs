//! ANSEL (ANSI/NISO Z39.47) character table.
//!
//! Maps the G1 (high byte) half of ANSEL to Unicode code points. The low half
//! (0x20-0x7E) is plain ASCII and is not listed. Each entry carries a flag
//! marking combining diacritics, which ANSEL places *before* the base letter.
//!
//! The table includes the GEDCOM 5.5 additions (0xBE, 0xBF, 0xCF) and the
//! MARC 21 additions (0xC7, 0xC8) seen in files produced by library systems.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// (byte, unicode code point, is combining)
const ANSEL_G1: &[(u8, u32, bool)] = &[
    // Spacing graphic characters
    (0xA1, 0x0141, false), // LATIN CAPITAL LETTER L WITH STROKE
    (0xA2, 0x00D8, false), // LATIN CAPITAL LETTER O WITH STROKE
    (0xA3, 0x0110, false), // LATIN CAPITAL LETTER D WITH STROKE
    (0xA4, 0x00DE, false), // LATIN CAPITAL LETTER THORN
    (0xA5, 0x00C6, false), // LATIN CAPITAL LETTER AE
    (0xA6, 0x0152, false), // LATIN CAPITAL LIGATURE OE
    (0xA7, 0x02B9, false), // MODIFIER LETTER PRIME
    (0xA8, 0x00B7, false), // MIDDLE DOT
    (0xA9, 0x266D, false), // MUSIC FLAT SIGN
    (0xAA, 0x00AE, false), // REGISTERED SIGN
    (0xAB, 0x00B1, false), // PLUS-MINUS SIGN
    (0xAC, 0x01A0, false), // LATIN CAPITAL LETTER O WITH HORN
    (0xAD, 0x01AF, false), // LATIN CAPITAL LETTER U WITH HORN
    (0xAE, 0x02BC, false), // MODIFIER LETTER APOSTROPHE (alif)
    (0xB0, 0x02BB, false), // MODIFIER LETTER TURNED COMMA (ayn)
    (0xB1, 0x0142, false), // LATIN SMALL LETTER L WITH STROKE
    (0xB2, 0x00F8, false), // LATIN SMALL LETTER O WITH STROKE
    (0xB3, 0x0111, false), // LATIN SMALL LETTER D WITH STROKE
    (0xB4, 0x00FE, false), // LATIN SMALL LETTER THORN
    (0xB5, 0x00E6, false), // LATIN SMALL LETTER AE
    (0xB6, 0x0153, false), // LATIN SMALL LIGATURE OE
    (0xB7, 0x02BA, false), // MODIFIER LETTER DOUBLE PRIME
    (0xB8, 0x0131, false), // LATIN SMALL LETTER DOTLESS I
    (0xB9, 0x00A3, false), // POUND SIGN
    (0xBA, 0x00F0, false), // LATIN SMALL LETTER ETH
    (0xBC, 0x01A1, false), // LATIN SMALL LETTER O WITH HORN
    (0xBD, 0x01B0, false), // LATIN SMALL LETTER U WITH HORN
    (0xBE, 0x25A1, false), // WHITE SQUARE (GEDCOM)
    (0xBF, 0x25A0, false), // BLACK SQUARE (GEDCOM)
    (0xC0, 0x00B0, false), // DEGREE SIGN
    (0xC1, 0x2113, false), // SCRIPT SMALL L
    (0xC2, 0x2117, false), // SOUND RECORDING COPYRIGHT
    (0xC3, 0x00A9, false), // COPYRIGHT SIGN
    (0xC4, 0x266F, false), // MUSIC SHARP SIGN
    (0xC5, 0x00BF, false), // INVERTED QUESTION MARK
    (0xC6, 0x00A1, false), // INVERTED EXCLAMATION MARK
    (0xC7, 0x00DF, false), // LATIN SMALL LETTER SHARP S (MARC 21)
    (0xC8, 0x20AC, false), // EURO SIGN (MARC 21)
    (0xCF, 0x00DF, false), // LATIN SMALL LETTER SHARP S (GEDCOM)
    // Combining diacritics (precede the base character)
    (0xE0, 0x0309, true), // HOOK ABOVE
    (0xE1, 0x0300, true), // GRAVE ACCENT
    (0xE2, 0x0301, true), // ACUTE ACCENT
    (0xE3, 0x0302, true), // CIRCUMFLEX ACCENT
    (0xE4, 0x0303, true), // TILDE
    (0xE5, 0x0304, true), // MACRON
    (0xE6, 0x0306, true), // BREVE
    (0xE7, 0x0307, true), // DOT ABOVE
    (0xE8, 0x0308, true), // DIAERESIS
    (0xE9, 0x030C, true), // CARON
    (0xEA, 0x030A, true), // RING ABOVE
    (0xEB, 0xFE20, true), // LIGATURE LEFT HALF
    (0xEC, 0xFE21, true), // LIGATURE RIGHT HALF
    (0xED, 0x0315, true), // COMMA ABOVE RIGHT
    (0xEE, 0x030B, true), // DOUBLE ACUTE ACCENT
    (0xEF, 0x0310, true), // CANDRABINDU
    (0xF0, 0x0327, true), // CEDILLA
    (0xF1, 0x0328, true), // OGONEK
    (0xF2, 0x0323, true), // DOT BELOW
    (0xF3, 0x0324, true), // DIAERESIS BELOW
    (0xF4, 0x0325, true), // RING BELOW
    (0xF5, 0x0333, true), // DOUBLE LOW LINE
    (0xF6, 0x0332, true), // LOW LINE
    (0xF7, 0x0326, true), // COMMA BELOW
    (0xF8, 0x031C, true), // LEFT HALF RING BELOW
    (0xF9, 0x032E, true), // BREVE BELOW
    (0xFA, 0xFE22, true), // DOUBLE TILDE LEFT HALF
    (0xFB, 0xFE23, true), // DOUBLE TILDE RIGHT HALF
    (0xFE, 0x0313, true), // COMMA ABOVE
];

lazy_static! {
    static ref ANSEL_TABLE: HashMap<u8, (u32, bool)> = ANSEL_G1
        .iter()
        .map(|&(byte, code, combining)| (byte, (code, combining)))
        .collect();
}

/// Look up a high ANSEL byte.
///
/// Returns the Unicode code point and whether it is a combining mark, or
/// `None` for bytes ANSEL leaves unassigned.
#[must_use]
pub fn get_ansel_character(byte: u8) -> Option<(u32, bool)> {
    ANSEL_TABLE.get(&byte).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacing_characters() {
        assert_eq!(get_ansel_character(0xA1), Some((0x0141, false)));
        assert_eq!(get_ansel_character(0xB5), Some((0x00E6, false)));
    }

    #[test]
    fn test_combining_characters() {
        assert_eq!(get_ansel_character(0xE2), Some((0x0301, true)));
        assert_eq!(get_ansel_character(0xF0), Some((0x0327, true)));
    }

    #[test]
    fn test_unassigned_bytes() {
        assert_eq!(get_ansel_character(0xAF), None);
        assert_eq!(get_ansel_character(0xFF), None);
        assert_eq!(get_ansel_character(0x41), None);
    }
}
