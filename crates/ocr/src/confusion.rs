use regex::Regex;
use std::sync::OnceLock;

/// Regex class fragment for "digit or anything the recognizer is known to
/// mistake for one". Maintained empirically from misread scans, not derived.
pub const DIGITISH: &str = r"0-9lI!OoQSsZzB|/\\\[\]";

/// Same class minus the slash/pipe separators, for the two sides of a
/// current/max ratio so a capture can never swallow the separator itself.
pub const DIGITISH_NO_SEP: &str = r"0-9lI!OoQSsZzB\[\]";

/// Single-character substitutions, applied after the sandwich pass.
/// Order within the list is the declared rewrite order.
const SUBSTITUTIONS: &[(&str, char)] = &[
    (r"lI!|/\[]", '1'),
    ("OoQ", '0'),
    ("Ss", '5'),
    ("Zz", '2'),
    ("B", '8'),
];

fn re_sandwich() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"([0-9])[|/\\]([0-9])").expect("invalid regex"))
}

/// Rewrite an OCR numeric blob into plain digits.
///
/// Passes, in order: strip whitespace; delete separators sandwiched between
/// two digits (segmentation noise — `"3/7"` is `"37"`); substitute each
/// remaining confusable for the digit it resembles; drop everything else.
/// The sandwich pass must run first: the per-character pass would turn the
/// same slash into a `1`. Pure-digit input comes back unchanged.
pub fn clean_digits(raw: &str) -> String {
    let mut s: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    loop {
        let next = re_sandwich().replace_all(&s, "${1}${2}").into_owned();
        if next == s {
            break;
        }
        s = next;
    }
    s.chars()
        .filter_map(|c| {
            if c.is_ascii_digit() {
                return Some(c);
            }
            SUBSTITUTIONS
                .iter()
                .find(|(from, _)| from.contains(c))
                .map(|&(_, to)| to)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_digits_are_untouched() {
        assert_eq!(clean_digits("2207"), "2207");
        assert_eq!(clean_digits("37"), "37");
        assert_eq!(clean_digits(""), "");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let once = clean_digits("l2O7");
        assert_eq!(once, "1207");
        assert_eq!(clean_digits(&once), once);
    }

    #[test]
    fn sandwich_runs_before_substitution() {
        // A slash between digits is dropped, never rewritten to a 1.
        assert_eq!(clean_digits("3/7"), "37");
        assert_ne!(clean_digits("3/7"), "311");
        assert_eq!(clean_digits("187/187"), "187187");
    }

    #[test]
    fn leading_slash_is_a_one() {
        // No digit on the left, so the sandwich rule does not apply.
        assert_eq!(clean_digits("/23"), "123");
    }

    #[test]
    fn letter_confusables_become_digits() {
        assert_eq!(clean_digits("2S00"), "2500");
        assert_eq!(clean_digits("Z0O"), "200");
        assert_eq!(clean_digits("IB5!"), "1851");
    }

    #[test]
    fn embedded_whitespace_is_stripped_first() {
        assert_eq!(clean_digits("2 500"), "2500");
        assert_eq!(clean_digits(" 3 2 0 0 "), "3200");
    }

    #[test]
    fn unknown_characters_are_dropped() {
        assert_eq!(clean_digits("abc"), "");
        assert_eq!(clean_digits("2x07"), "207");
    }
}
