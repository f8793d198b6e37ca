/// Cleans one line of PDF text before it is offered to the matchers.
pub(crate) fn normalize_line(value: &str) -> String {
    let cleaned = value
        .replace(['\u{feff}', '\u{200b}', '\u{00ad}'], "")
        .replace(['\u{00a0}', '\t'], " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Identity form of an address: case, spacing and trailing punctuation ignored.
pub fn normalize_address(value: &str) -> String {
    let collapsed = normalize_line(value);
    collapsed
        .trim_end_matches(['.', ',', ';', ':'])
        .to_ascii_lowercase()
}
