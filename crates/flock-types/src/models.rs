use serde::{Deserialize, Serialize};

/// A cached friend, projected down from the provider's user object.
/// One row per friend per owning user; the cache is wiped on a timer
/// rather than upserted, so duplicates across refreshes are possible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friend {
    /// The provider's stable string id for this friend.
    pub provider_id: String,
    /// The user whose friend list this row belongs to.
    pub owner_id: String,
    pub name: String,
    pub screen_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// Sort friends alphabetically by display name, case-insensitively.
/// Both the warm-cache path and the live-fetch path go through this so
/// the two always agree on ordering.
pub fn sort_by_name(friends: &mut [Friend]) {
    friends.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}
