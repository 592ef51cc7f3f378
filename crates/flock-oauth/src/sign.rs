//! HMAC-SHA1 request signing per RFC 5849.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use hmac::{Hmac, Mac};
use sha1::Sha1;

/// Percent-encode with the RFC 3986 unreserved set (`A-Z a-z 0-9 - . _ ~`),
/// which is exactly what OAuth 1.0a signing requires.
pub fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// A fresh random nonce, 32 hex chars.
pub fn nonce() -> String {
    (0..16).map(|_| format!("{:02x}", rand::random::<u8>())).collect()
}

pub fn timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Build the signature base string: `METHOD&enc(url)&enc(param-string)`.
///
/// `base_url` must not carry a query string; query parameters go into
/// `params` together with the oauth_* parameters. Pairs are encoded first
/// and then sorted, per the spec.
pub fn signature_base_string(method: &str, base_url: &str, params: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    pairs.sort();

    let param_string = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(base_url),
        percent_encode(&param_string)
    )
}

/// Sign a base string with `enc(consumer_secret)&enc(token_secret)` as the
/// HMAC-SHA1 key; the token secret is empty during the request-token leg.
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac =
        Hmac::<Sha1>::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(base_string.as_bytes());
    B64.encode(mac.finalize().into_bytes())
}

/// Render the `Authorization: OAuth ...` header value from the oauth_*
/// parameters (signature included).
pub fn authorization_header(oauth_params: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = oauth_params.to_vec();
    pairs.sort();
    let rendered = pairs
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {rendered}")
}
