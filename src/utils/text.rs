use std::sync::OnceLock;

use regex::Regex;

pub fn extract_digits(text: &str) -> u32 {
    let mut acc: u32 = 0;

    for ch in text.chars() {
        if let Some(digit) = ch.to_digit(10) {
            acc = acc * 10 + digit;
        }
    }

    acc
}

/// Collapses whitespace runs and trims, the way rendered HTML would.
pub fn sanitize_text(text: &str) -> String {
    static SANITIZE_TEXT_REGEXP: OnceLock<Regex> = OnceLock::new();
    let re = SANITIZE_TEXT_REGEXP.get_or_init(|| Regex::new(r#"[\n\t\s]+"#).unwrap());

    re.replace_all(text, " ").into_owned().trim().into()
}

/// Decodes the handful of named entities the site actually emits in quality
/// labels and inline text. Numeric references are decoded as well.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.into();
    }

    static ENTITY_REGEXP: OnceLock<Regex> = OnceLock::new();
    let re = ENTITY_REGEXP.get_or_init(|| Regex::new(r#"&(#x?[0-9a-fA-F]+|\w+);"#).unwrap());

    re.replace_all(text, |caps: &regex::Captures| {
        let name = &caps[1];
        match name {
            "amp" => "&".into(),
            "lt" => "<".into(),
            "gt" => ">".into(),
            "quot" => "\"".into(),
            "apos" => "'".into(),
            "nbsp" => " ".into(),
            _ => {
                let code = if let Some(hex) = name.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = name.strip_prefix('#') {
                    dec.parse().ok()
                } else {
                    None
                };

                code.and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_owned())
            }
        }
    })
    .into_owned()
}
