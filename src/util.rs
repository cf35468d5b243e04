//! Shared utility functions
//!
//! Name-casing helpers used by the property and builder models.

/// Uppercase the first character
///
/// # Examples
/// ```
/// use valuegen::util::capitalize;
/// assert_eq!(capitalize("foo"), "Foo");
/// assert_eq!(capitalize(""), "");
/// ```
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase the first character, JavaBeans style: a name starting with two
/// capitals is left alone.
///
/// # Examples
/// ```
/// use valuegen::util::decapitalize;
/// assert_eq!(decapitalize("Foo"), "foo");
/// assert_eq!(decapitalize("URL"), "URL");
/// ```
pub fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if a.is_uppercase() && b.is_uppercase() => s.to_string(),
        (Some(a), _) => a.to_lowercase().chain(s.chars().skip(1)).collect(),
        (None, _) => String::new(),
    }
}

/// The part of `name` after `prefix`, if it is followed by an uppercase letter
///
/// # Examples
/// ```
/// use valuegen::util::strip_bean_prefix;
/// assert_eq!(strip_bean_prefix("getFoo", "get"), Some("Foo"));
/// assert_eq!(strip_bean_prefix("getaway", "get"), None);
/// ```
pub fn strip_bean_prefix<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?;
    rest.chars()
        .next()
        .filter(|c| c.is_uppercase())
        .map(|_| rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("thing"), "Thing");
        assert_eq!(capitalize("x"), "X");
    }

    #[test]
    fn test_decapitalize() {
        assert_eq!(decapitalize("Thing"), "thing");
        assert_eq!(decapitalize("X"), "x");
        assert_eq!(decapitalize("IDs"), "IDs");
        assert_eq!(decapitalize(""), "");
    }

    #[test]
    fn test_strip_bean_prefix() {
        assert_eq!(strip_bean_prefix("isEmpty", "is"), Some("Empty"));
        assert_eq!(strip_bean_prefix("get", "get"), None);
        assert_eq!(strip_bean_prefix("island", "is"), None);
    }
}
