//! RFC 1459 case mapping.
//!
//! Network and room names are compared the way IRC servers compare them:
//! ASCII letters fold to lowercase and `[]\~` fold to `{}|^`.

/// Fold a single character using the `rfc1459` mapping.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        _ => c.to_ascii_lowercase(),
    }
}

/// Fold a whole string using the `rfc1459` mapping.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Case-insensitive comparison under the `rfc1459` mapping.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .chars()
            .map(irc_lower_char)
            .eq(b.chars().map(irc_lower_char))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_network_names() {
        assert_eq!(irc_to_lower("Net1"), "net1");
        assert_eq!(irc_to_lower("FreeNode"), "freenode");
    }

    #[test]
    fn folds_rfc1459_specials() {
        assert_eq!(irc_to_lower("#Room[1]"), "#room{1}");
        assert_eq!(irc_to_lower("a\\b~c"), "a|b^c");
    }

    #[test]
    fn compares_case_insensitively() {
        assert!(irc_eq("#Chat", "#chat"));
        assert!(irc_eq("nick[away]", "NICK{AWAY}"));
        assert!(!irc_eq("#chat", "#chat2"));
    }
}
