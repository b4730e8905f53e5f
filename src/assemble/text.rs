//! Placeholder substitution and HTML escaping
//!
//! Story text carries bracketed personalization tokens in both plain and
//! niqqud (vowel-pointed) forms. Substitution must be total: every
//! recognized token is replaced, and a token with no legitimate value
//! (missing age) becomes the empty string rather than leaking literally.

/// Name tokens, plain and niqqud forms for both grammatical genders.
const NAME_TOKENS: &[&str] = &[
    "[שם הילד]",
    "[שם הילדה]",
    "[שֵׁם הַיָּלֶד]",
    "[שֵׁם הַיַּלְדָּה]",
];

/// Age tokens, plain and niqqud forms.
const AGE_TOKENS: &[&str] = &["[גיל הילד]", "[גִּיל הַיָּלֶד]"];

/// Replace every recognized personalization token.
pub fn personalize(text: &str, child_name: &str, child_age: Option<&str>) -> String {
    let mut out = text.to_string();
    for token in NAME_TOKENS {
        out = out.replace(token, child_name);
    }
    let age = child_age.unwrap_or("");
    for token in AGE_TOKENS {
        out = out.replace(token, age);
    }
    out
}

/// Escape user-supplied text for insertion into markup or attributes.
pub fn escape(text: &str) -> String {
    html_escape::encode_safe(text).into_owned()
}
