//! Url path normalization.
//!
//! Collapses raw path input into a canonical slug form while preserving the
//! `/` and `.` separators, so that lookups always operate on one spelling of
//! a path.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::Error;

/// Maximum accepted length of a raw url path, in characters.
pub const MAX_PATH_LENGTH: usize = 1000;

/// Normalizes a raw path into its canonical slug form.
///
/// Transliterates accented characters to ASCII, optionally lower-cases the
/// result, replaces every run of characters outside `[a-z0-9/.]`
/// (`[a-zA-Z0-9/.]` when `lowercase` is false) with a single `-` and trims
/// `-` from both ends. Normalization is idempotent.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the input exceeds [`MAX_PATH_LENGTH`]
/// characters.
pub fn normalize_path(raw: &str, lowercase: bool) -> Result<String, Error> {
    if raw.chars().count() > MAX_PATH_LENGTH {
        return Err(Error::validation(format!(
            "path exceeds {MAX_PATH_LENGTH} characters"
        )));
    }

    let ascii = transliterate(raw);
    let source = if lowercase {
        ascii.to_lowercase()
    } else {
        ascii
    };

    let mut slug = String::with_capacity(source.len());
    let mut pending_separator = false;
    for c in source.chars() {
        let keep = c.is_ascii_digit()
            || c == '/'
            || c == '.'
            || (if lowercase {
                c.is_ascii_lowercase()
            } else {
                c.is_ascii_alphabetic()
            });

        if keep {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    Ok(slug)
}

/// Decomposes the input and drops combining marks, reducing accented
/// characters to their ASCII base form. Characters with no ASCII base
/// survive and are slugged away by the caller.
fn transliterate(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}
