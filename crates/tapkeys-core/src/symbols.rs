// Tapkeys Symbol Aliases
// Keysym names for punctuation and their literal symbols

/// Keysym name to literal symbol.
///
/// Several names share a symbol (`underscore`/`underbar`, `slash`/`XP_Divide`);
/// the reverse lookup resolves to the first entry listed here.
const NAME_TO_SYMBOL: &[(&str, &str)] = &[
    ("comma", ","),
    ("period", "."),
    ("slash", "/"),
    ("semicolon", ";"),
    ("apostrophe", "'"),
    ("bracketleft", "["),
    ("bracketright", "]"),
    ("backslash", "\\"),
    ("minus", "-"),
    ("equal", "="),
    ("grave", "`"),
    ("space", " "),
    ("underscore", "_"),
    ("plus", "+"),
    ("asterisk", "*"),
    ("less", "<"),
    ("greater", ">"),
    ("question", "?"),
    ("colon", ":"),
    ("quotedbl", "\""),
    ("braceleft", "{"),
    ("braceright", "}"),
    ("bar", "|"),
    ("numbersign", "#"),
    ("dollar", "$"),
    ("percent", "%"),
    ("ampersand", "&"),
    ("parenleft", "("),
    ("parenright", ")"),
    ("at", "@"),
    ("asciitilde", "~"),
    ("exclam", "!"),
    ("asciicircum", "^"),
    ("dead_abovedot", "˙"),
    ("underbar", "_"),
    ("breve", "˘"),
    ("macron", "¯"),
    ("XP_Divide", "/"),
    ("diaeresis", "¨"),
    ("cedilla", "¸"),
];

/// Literal symbol for a keysym name, if it is one of the aliased names.
pub fn name_to_symbol(name: &str) -> Option<&'static str> {
    NAME_TO_SYMBOL
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, symbol)| *symbol)
}

/// Keysym name for a literal symbol.
pub fn symbol_to_name(symbol: &str) -> Option<&'static str> {
    NAME_TO_SYMBOL
        .iter()
        .find(|(_, s)| *s == symbol)
        .map(|(name, _)| *name)
}

/// Normalize a raw layout token: literal symbols become their keysym name,
/// everything else is kept as written.
pub fn normalize_token(token: &str) -> &str {
    symbol_to_name(token).unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_to_name() {
        assert_eq!(symbol_to_name(";"), Some("semicolon"));
        assert_eq!(symbol_to_name("~"), Some("asciitilde"));
        assert_eq!(symbol_to_name("a"), None);
    }

    #[test]
    fn test_shared_symbol_resolves_to_first_name() {
        assert_eq!(symbol_to_name("_"), Some("underscore"));
        assert_eq!(symbol_to_name("/"), Some("slash"));
        assert_eq!(name_to_symbol("underbar"), Some("_"));
        assert_eq!(name_to_symbol("XP_Divide"), Some("/"));
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("'"), "apostrophe");
        assert_eq!(normalize_token("BackSpace"), "BackSpace");
        assert_eq!(normalize_token("x"), "x");
    }
}
