use std::sync::OnceLock;

use regex::Regex;

use crate::models::HistoryRecord;

/// Authentication vocabulary, matched case-insensitively anywhere in URL or title
pub const LOGIN_KEYWORDS: &[&str] =
    &["login", "signin", "auth", "account", "oauth", "openid", "sign-in", "sign_in"];

fn keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation =
            LOGIN_KEYWORDS.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|");
        Regex::new(&format!("(?i)({})", alternation)).expect("keyword regex is valid")
    })
}

/// True if `text` contains any authentication keyword
pub fn contains_login_keyword(text: &str) -> bool {
    keyword_regex().is_match(text)
}

/// True if the record's URL or title contains an authentication keyword
pub fn is_login_related(record: &HistoryRecord) -> bool {
    [&record.url, &record.title].into_iter().flatten().any(|field| contains_login_keyword(field))
}
