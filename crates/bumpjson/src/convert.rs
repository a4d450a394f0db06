//! On-demand interpretation of bareword text.
//!
//! Barewords are stored as written and classified every time they are read,
//! never rewritten in place.

/// What a bareword reads as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Literal<'t> {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(&'t str),
}

/// Classifies bareword text.
///
/// - `true`, `false`, `null` (exact spelling)
/// - an optional sign followed by digits: integer, or float when it does not
///   fit in `i64`
/// - digits, signs, `.` and exponents that parse as a float
/// - anything else is plain text
pub(crate) fn interpret(text: &str) -> Literal<'_> {
    match text {
        "true" => return Literal::Bool(true),
        "false" => return Literal::Bool(false),
        "null" => return Literal::Null,
        _ => {}
    }

    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return match text.parse::<i64>() {
            Ok(value) => Literal::Integer(value),
            Err(_) => text
                .parse::<f64>()
                .map_or(Literal::Text(text), Literal::Float),
        };
    }

    if looks_like_float(text)
        && let Ok(value) = text.parse::<f64>()
    {
        return Literal::Float(value);
    }

    Literal::Text(text)
}

/// Rejects words `f64::from_str` would accept but JSON would not, such as
/// `inf` or `NaN`.
fn looks_like_float(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-'))
}
