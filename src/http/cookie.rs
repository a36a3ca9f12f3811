//! Session cookie transport.
//!
//! The ledger core only sees an `Option<&str>` token; this module reads it
//! from the `Cookie` request header and renders the `Set-Cookie` value for a
//! newly issued session.

use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

use crate::identity::SessionId;

/// Value of the first cookie called `name`, across every `Cookie` header.
/// Surrounding double quotes are stripped. Empty values count as absent.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value carrying `session` for `max_age`, valid site-wide.
pub fn issue(name: &str, session: &SessionId, max_age: Duration) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{name}={session}; Path=/; Max-Age={}",
        max_age.as_secs()
    ))
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for v in values {
            map.append(COOKIE, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn reads_named_cookie_among_others() {
        let h = headers(&["theme=dark; sessionId=abc-123; lang=en"]);
        assert_eq!(read(&h, "sessionId").as_deref(), Some("abc-123"));
    }

    #[test]
    fn reads_across_multiple_headers() {
        let h = headers(&["theme=dark", "sessionId=\"quoted\""]);
        assert_eq!(read(&h, "sessionId").as_deref(), Some("quoted"));
    }

    #[test]
    fn absent_and_empty_are_none() {
        assert_eq!(read(&HeaderMap::new(), "sessionId"), None);
        assert_eq!(read(&headers(&["sessionId="]), "sessionId"), None);
        assert_eq!(read(&headers(&["sessionIdX=1"]), "sessionId"), None);
    }

    #[test]
    fn issued_cookie_has_path_and_max_age() {
        let session = identity::issue();
        let value = issue("sessionId", &session, Duration::from_secs(604_800)).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            format!("sessionId={session}; Path=/; Max-Age=604800")
        );
    }
}
