use reqwest::Url;
use reqwest::header::AUTHORIZATION;
use tracing::debug;

use crate::error::OAuthError;
use crate::sign;

/// Provider endpoints and consumer credentials, loaded once at startup.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub request_token_url: String,
    pub access_token_url: String,
    pub authorize_url: String,
    pub callback_url: String,
}

/// A token/secret pair — temporary during the handshake, durable after it.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: String,
    pub secret: String,
}

pub struct OAuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// The consent-page URL the user is redirected to with the temporary
    /// token attached.
    pub fn authorize_url(&self, temp_token: &str) -> String {
        format!(
            "{}?oauth_token={}",
            self.config.authorize_url,
            sign::percent_encode(temp_token)
        )
    }

    /// First handshake leg: obtain a temporary credential. Not retried;
    /// a provider failure here is terminal for the attempt.
    pub async fn request_token(&self) -> Result<Credentials, OAuthError> {
        let callback = self.config.callback_url.clone();
        let body = self
            .signed_request(
                "POST",
                &self.config.request_token_url,
                None,
                &[("oauth_callback".to_string(), callback)],
                &[],
            )
            .await?;
        parse_token_reply(&body)
    }

    /// Second handshake leg: exchange the verifier for the durable token
    /// pair.
    pub async fn access_token(
        &self,
        temp_token: &str,
        temp_secret: &str,
        verifier: &str,
    ) -> Result<Credentials, OAuthError> {
        let body = self
            .signed_request(
                "POST",
                &self.config.access_token_url,
                Some((temp_token, temp_secret)),
                &[("oauth_verifier".to_string(), verifier.to_string())],
                &[],
            )
            .await?;
        parse_token_reply(&body)
    }

    /// Signed GET. Query parameters on `url` participate in the signature.
    pub async fn get(
        &self,
        url: &str,
        token: &str,
        token_secret: &str,
    ) -> Result<String, OAuthError> {
        self.signed_request("GET", url, Some((token, token_secret)), &[], &[])
            .await
    }

    /// Signed POST with a form body; form fields participate in the
    /// signature alongside any query parameters.
    pub async fn post_form(
        &self,
        url: &str,
        token: &str,
        token_secret: &str,
        form: &[(String, String)],
    ) -> Result<String, OAuthError> {
        self.signed_request("POST", url, Some((token, token_secret)), &[], form)
            .await
    }

    async fn signed_request(
        &self,
        method: &str,
        url: &str,
        token: Option<(&str, &str)>,
        extra_oauth: &[(String, String)],
        form: &[(String, String)],
    ) -> Result<String, OAuthError> {
        let parsed =
            Url::parse(url).map_err(|e| OAuthError::Malformed(format!("bad url {url}: {e}")))?;

        // The base string URL strips query and fragment
        let mut base_url = parsed.clone();
        base_url.set_query(None);
        base_url.set_fragment(None);

        let mut oauth_params = vec![
            ("oauth_consumer_key".to_string(), self.config.consumer_key.clone()),
            ("oauth_nonce".to_string(), sign::nonce()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), sign::timestamp()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];
        if let Some((token, _)) = token {
            oauth_params.push(("oauth_token".to_string(), token.to_string()));
        }
        oauth_params.extend_from_slice(extra_oauth);

        // Everything signs: oauth params, query params, form fields
        let mut all_params = oauth_params.clone();
        for (k, v) in parsed.query_pairs() {
            all_params.push((k.into_owned(), v.into_owned()));
        }
        all_params.extend_from_slice(form);

        let base_string = sign::signature_base_string(method, base_url.as_str(), &all_params);
        let token_secret = token.map(|(_, s)| s).unwrap_or("");
        let signature = sign::sign(&base_string, &self.config.consumer_secret, token_secret);
        oauth_params.push(("oauth_signature".to_string(), signature));

        let header = sign::authorization_header(&oauth_params);
        debug!("{} {}", method, base_url);

        let request = match method {
            "POST" => self.http.post(parsed).form(form),
            _ => self.http.get(parsed),
        };

        let response = request.header(AUTHORIZATION, header).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(OAuthError::Provider {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// Token-leg replies are form-encoded: `oauth_token=..&oauth_token_secret=..`.
fn parse_token_reply(body: &str) -> Result<Credentials, OAuthError> {
    let mut token = None;
    let mut secret = None;

    for pair in body.split('&') {
        let Some((k, v)) = pair.split_once('=') else {
            continue;
        };
        let value = urlencoding::decode(v)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| v.to_string());
        match k {
            "oauth_token" => token = Some(value),
            "oauth_token_secret" => secret = Some(value),
            _ => {}
        }
    }

    match (token, secret) {
        (Some(token), Some(secret)) => Ok(Credentials { token, secret }),
        _ => Err(OAuthError::Malformed(format!(
            "token reply missing oauth_token/oauth_token_secret: {body}"
        ))),
    }
}
