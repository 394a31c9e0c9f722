//! Wire-level pieces of the provider API: response bodies and send-form fields.

use crate::store::Message;

/// Body of the 401 reply on the send endpoint.
pub const UNAUTHORISED_BODY: &str = "Unauthorised.\n";

/// Body of the 500 reply when the message list cannot be serialized.
pub const MARSHAL_ERROR_BODY: &str = "marshalling json response\n";

/// Decoded key/value pairs in request order.
pub type FormPairs = Vec<(String, String)>;

/// Form fields of a send request: `To`, `From`, `Body`.
///
/// Sources are searched in order and the first occurrence of a key wins. Absent
/// keys are empty strings.
#[derive(Debug, Default)]
pub struct SendForm {
    sources: Vec<FormPairs>,
}

impl SendForm {
    /// Urlencoded body: body fields win over the query string.
    pub fn urlencoded(body: FormPairs, query: FormPairs) -> Self {
        Self {
            sources: vec![body, query],
        }
    }

    /// Multipart body: its text fields are only consulted after the query string.
    pub fn multipart(query: FormPairs, fields: FormPairs) -> Self {
        Self {
            sources: vec![query, fields],
        }
    }

    /// Value for `key`, or "" when no source has it.
    pub fn value(&self, key: &str) -> &str {
        self.sources
            .iter()
            .find_map(|pairs| first(pairs, key))
            .unwrap_or("")
    }

    pub fn into_message(self) -> Message {
        Message::new(self.value("To"), self.value("From"), self.value("Body"))
    }
}

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Parse `application/x-www-form-urlencoded` text (a query string or a form body).
///
/// Pairs are split on '&' and then on the first '='. A pair with an empty key, a
/// ';' in the key, or an invalid percent-escape is dropped; the rest still parse.
pub fn parse_urlencoded(input: &str) -> FormPairs {
    let mut pairs = Vec::new();
    for part in input.split('&') {
        let (key, value) = part.split_once('=').unwrap_or((part, ""));
        if key.is_empty() || key.contains(';') {
            continue;
        }
        match (unescape(key), unescape(value)) {
            (Some(k), Some(v)) => pairs.push((k, v)),
            _ => log::debug!("dropping form pair with invalid escape: {:?}", part),
        }
    }
    pairs
}

/// Decode '+' as space and `%XX` escapes. `None` on a malformed escape.
fn unescape(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = hex_value(*bytes.get(i + 1)?)?;
                let lo = hex_value(*bytes.get(i + 2)?)?;
                out.push(hi << 4 | lo);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Some(String::from_utf8_lossy(&out).into_owned())
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> FormPairs {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn body_fields_become_message() {
        let form = SendForm::urlencoded(
            pairs(&[("To", "+15550001"), ("From", "+15559999"), ("Body", "hello")]),
            Vec::new(),
        );
        assert_eq!(
            form.into_message(),
            Message::new("+15550001", "+15559999", "hello")
        );
    }

    #[test]
    fn body_wins_over_query_and_query_fills_gaps() {
        let form = SendForm::urlencoded(
            pairs(&[("To", "body-to")]),
            pairs(&[("To", "query-to"), ("From", "query-from")]),
        );
        assert_eq!(form.value("To"), "body-to");
        assert_eq!(form.value("From"), "query-from");
        assert_eq!(form.value("Body"), "");
    }

    #[test]
    fn query_wins_over_multipart_fields() {
        let form = SendForm::multipart(
            pairs(&[("To", "query-to")]),
            pairs(&[("To", "part-to"), ("Body", "part-body")]),
        );
        assert_eq!(form.value("To"), "query-to");
        assert_eq!(form.value("Body"), "part-body");
    }

    #[test]
    fn first_occurrence_wins() {
        let form = SendForm::urlencoded(pairs(&[("Body", "one"), ("Body", "two")]), Vec::new());
        assert_eq!(form.value("Body"), "one");
    }

    #[test]
    fn keys_are_case_sensitive() {
        let form = SendForm::urlencoded(pairs(&[("to", "lower")]), Vec::new());
        assert_eq!(form.value("To"), "");
    }

    #[test]
    fn empty_form_yields_empty_message() {
        assert_eq!(SendForm::default().into_message(), Message::new("", "", ""));
    }

    #[test]
    fn parse_decodes_plus_and_escapes() {
        assert_eq!(
            parse_urlencoded("To=%2B15550001&Body=hello+there%21&From"),
            pairs(&[("To", "+15550001"), ("Body", "hello there!"), ("From", "")])
        );
    }

    #[test]
    fn parse_drops_pairs_with_bad_escapes_only() {
        assert_eq!(
            parse_urlencoded("To=%zz&From=ok&Body=%4"),
            pairs(&[("From", "ok")])
        );
        assert_eq!(parse_urlencoded("%g1=x&Body=y"), pairs(&[("Body", "y")]));
    }

    #[test]
    fn parse_skips_empty_and_semicolon_keys() {
        assert_eq!(
            parse_urlencoded("&=v&a;b=1&To=x&"),
            pairs(&[("To", "x")])
        );
        assert!(parse_urlencoded("").is_empty());
    }

    #[test]
    fn parse_keeps_bytes_after_multibyte_escape() {
        assert_eq!(parse_urlencoded("Body=caf%C3%A9"), pairs(&[("Body", "café")]));
    }
}
