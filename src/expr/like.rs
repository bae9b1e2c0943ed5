//! LIKE and GLOB pattern matching
//!
//! Both operators share a recursive matcher over Unicode scalar values.
//! LIKE uses % and _ and folds case; GLOB uses * and ? and is
//! case-sensitive. LIKE's escape character strips wildcard meaning from
//! the character that follows it.

/// LIKE match: case-insensitive, % matches any run, _ matches one
/// character. `escape`, when present, makes the following pattern
/// character literal.
pub fn evaluate_like(pattern: &str, text: &str, escape: Option<char>) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    like_match(&p, &t, escape)
}

/// GLOB match: case-sensitive, * matches any run, ? matches one
/// character
pub fn evaluate_glob(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    glob_match(&p, &t)
}

/// Unicode case folding per character, the way strings.EqualFold works
fn fold_eq(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn like_match(pattern: &[char], text: &[char], escape: Option<char>) -> bool {
    let Some(&p) = pattern.first() else {
        return text.is_empty();
    };

    // Escaped character: literal match, no wildcard meaning
    if Some(p) == escape && pattern.len() >= 2 {
        return match text.first() {
            Some(&t) if fold_eq(pattern[1], t) => like_match(&pattern[2..], &text[1..], escape),
            _ => false,
        };
    }

    match p {
        '%' => {
            // Trailing wildcard matches any remainder
            if pattern.len() == 1 {
                return true;
            }
            for i in 0..=text.len() {
                if like_match(&pattern[1..], &text[i..], escape) {
                    return true;
                }
            }
            false
        }
        '_' => !text.is_empty() && like_match(&pattern[1..], &text[1..], escape),
        _ => match text.first() {
            Some(&t) if fold_eq(p, t) => like_match(&pattern[1..], &text[1..], escape),
            _ => false,
        },
    }
}

fn glob_match(pattern: &[char], text: &[char]) -> bool {
    let Some(&p) = pattern.first() else {
        return text.is_empty();
    };

    match p {
        '*' => {
            if pattern.len() == 1 {
                return true;
            }
            for i in 0..=text.len() {
                if glob_match(&pattern[1..], &text[i..]) {
                    return true;
                }
            }
            false
        }
        '?' => !text.is_empty() && glob_match(&pattern[1..], &text[1..]),
        _ => match text.first() {
            Some(&t) if t == p => glob_match(&pattern[1..], &text[1..]),
            _ => false,
        },
    }
}
