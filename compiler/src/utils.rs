/// Quote a user-supplied name the way JSON would, so that empty names and
/// names with whitespace stay visible in messages.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}

pub fn quote_opt(text: &Option<String>) -> String {
    match text {
        Some(text) => quote(text),
        None => "(none)".to_owned(),
    }
}

#[test]
fn quotes_names() {
    assert_eq!(quote("com.example.Foo"), "\"com.example.Foo\"");
    assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    assert_eq!(quote_opt(&None), "(none)");
    assert_eq!(quote_opt(&Some(String::new())), "\"\"");
}
