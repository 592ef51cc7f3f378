use serde::Deserialize;

/// One page of the provider's `friends/ids` endpoint. Cursoring is
/// string-based: `next_cursor_str == "0"` means the last page.
#[derive(Debug, Deserialize)]
pub struct IdsPage {
    pub ids: Vec<u64>,
    pub next_cursor_str: String,
}

/// A raw user object from the provider's `users/lookup` endpoint.
/// Only the fields we project into a `Friend` are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id_str: String,
    pub name: String,
    pub screen_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub profile_image_url: String,
}

/// The identity reply from `account/verify_credentials`.
#[derive(Debug, Deserialize)]
pub struct VerifiedIdentity {
    pub id_str: String,
    #[serde(default)]
    pub screen_name: String,
}
