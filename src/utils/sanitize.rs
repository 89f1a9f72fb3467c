use regex::Regex;
use std::sync::LazyLock;

static ILLEGAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("illegal-character pattern"));

/// Strips `\ / : * ? " < > |` from `name`. Characters are removed, not
/// replaced, so neighbours merge.
pub fn sanitize_filename(name: &str) -> String {
    ILLEGAL_CHARS.replace_all(name, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_illegal_characters() {
        assert_eq!(sanitize_filename("My:Page*Title?"), "MyPageTitle");
        assert_eq!(sanitize_filename(r#"a\b/c:d*e?f"g<h>i|j"#), "abcdefghij");
    }

    #[test]
    fn leaves_other_text_alone() {
        assert_eq!(sanitize_filename("Hello World - 2024"), "Hello World - 2024");
        assert_eq!(sanitize_filename("日本語のページ"), "日本語のページ");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn only_illegal_characters_yields_empty() {
        assert_eq!(sanitize_filename("<>|"), "");
    }
}
