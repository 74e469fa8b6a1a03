/// Characters removed before comparing messages: space, tab, zero-width
/// space, no-break space, en space, em space, thin space and narrow no-break
/// space
pub const STRIPPED_WHITESPACE: [char; 8] = [
    ' ', '\t', '\u{200B}', '\u{00A0}', '\u{2002}', '\u{2003}', '\u{2009}', '\u{202F}',
];

pub fn strip_whitespace(content: &str) -> String {
    content
        .chars()
        .filter(|c| !STRIPPED_WHITESPACE.contains(c))
        .collect()
}
