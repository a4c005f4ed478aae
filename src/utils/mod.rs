use url::Url;

/// Decode the three entities caption payloads use: `&lt;`, `&gt;` and `&amp;`
///
/// `&amp;` goes last so `&amp;lt;` decodes to `&lt;` rather than `<`.
pub fn decode_basic_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Undo the escaping applied to URLs embedded in inline scripts
pub fn unescape_embedded_url(raw: &str) -> String {
    raw.replace("\\u0026", "&")
        .replace("&amp;", "&")
        .replace("\\/", "/")
}

/// Shorten text for log lines
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Extract domain from URL for display purposes
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_basic_entities() {
        assert_eq!(decode_basic_entities("a &amp; b"), "a & b");
        assert_eq!(decode_basic_entities("&lt;i&gt;"), "<i>");
        assert_eq!(decode_basic_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_basic_entities("&quot;kept&quot;"), "&quot;kept&quot;");
    }

    #[test]
    fn test_unescape_embedded_url() {
        assert_eq!(
            unescape_embedded_url("https://example.com/api/timedtext?v=x\\u0026lang=en&amp;fmt=xml"),
            "https://example.com/api/timedtext?v=x&lang=en&fmt=xml"
        );
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://www.youtube.com/watch?v=123"), Some("youtube.com".to_string()));
        assert_eq!(extract_domain("https://inv.example.net/api/v1/videos/x"), Some("inv.example.net".to_string()));
        assert_eq!(extract_domain("invalid-url"), None);
    }
}
