use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Longest `recentSearches` list kept for a user.
pub const MAX_RECENT_SEARCHES: usize = 10;

/// Provider name (`discord`, `facebook`, `google`, ...) to linked flag.
pub type LinkedAccounts = BTreeMap<String, bool>;

/// `null` reads as the default value, the way an absent field does.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Any non-negative number of seconds, rounded to whole seconds.
fn whole_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = Option::<f64>::deserialize(deserializer)?.unwrap_or_default();
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds.round() as u64)
    } else {
        Ok(0)
    }
}

/// One login. Older blobs call the fields `date` and `duration`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    #[serde(alias = "date", default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
    #[serde(alias = "duration", default, deserialize_with = "whole_seconds")]
    pub duration_seconds: u64,
}

/// Everything the dashboard remembers about one user, keyed by email.
///
/// Login bookkeeping (`login_timestamp`, `login_count`,
/// `registration_timestamp`, `session_history`) and `revision` are owned
/// by [`UserStore`](crate::UserStore) and cannot be set through a
/// [`UserPatch`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    /// Credential for the stats provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// `data:` URI of an image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
    /// `data:` URI of an audio clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_message: Option<String>,
    #[serde(default, alias = "loginTime", deserialize_with = "null_as_default")]
    pub login_timestamp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub login_count: u64,
    /// Written once, when the record is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_timestamp: Option<i64>,
    /// Most recent first, unique.
    #[serde(
        default,
        alias = "lastSearchedPlayers",
        deserialize_with = "null_as_default"
    )]
    pub recent_searches: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub session_history: Vec<SessionEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub linked_accounts: LinkedAccounts,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub favorite_weapons: Vec<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub favorite_maps: Vec<String>,
    /// Bumped on every write of this record.
    #[serde(default, deserialize_with = "null_as_default")]
    pub revision: u64,
    /// Fields this build does not know, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    /// Shallow merge: every field present in `patch` replaces the stored
    /// value wholesale, nested maps included. The email is the record's key
    /// and is never changed here.
    pub fn apply(&mut self, patch: &UserPatch) {
        fn set<T: Clone>(field: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *field = value.clone();
            }
        }
        fn set_opt<T: Clone>(field: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *field = value.clone();
            }
        }

        set(&mut self.username, &patch.username);
        set_opt(&mut self.game_id, &patch.game_id);
        set_opt(&mut self.api_key, &patch.api_key);
        set_opt(&mut self.profile_photo, &patch.profile_photo);
        set_opt(&mut self.voice_message, &patch.voice_message);
        if let Some(searches) = &patch.recent_searches {
            self.recent_searches = normalize_searches(searches.iter().cloned());
        }
        set(&mut self.linked_accounts, &patch.linked_accounts);
        set(&mut self.favorite_weapons, &patch.favorite_weapons);
        set(&mut self.favorite_maps, &patch.favorite_maps);
    }

    /// Move `query` to the front of the recent searches.
    pub fn push_search(&mut self, query: &str) {
        let previous = std::mem::take(&mut self.recent_searches);
        self.recent_searches = normalize_searches(
            std::iter::once(query.to_owned()).chain(previous),
        );
    }
}

/// Drop repeated entries (first occurrence wins) and cap the length.
pub fn normalize_searches(
    searches: impl IntoIterator<Item = String>,
) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(MAX_RECENT_SEARCHES);
    for search in searches {
        if result.len() == MAX_RECENT_SEARCHES {
            break;
        }
        if !result.contains(&search) {
            result.push(search);
        }
    }
    result
}

/// A partial [`UserRecord`]: `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub game_id: Option<String>,
    pub api_key: Option<String>,
    pub profile_photo: Option<String>,
    pub voice_message: Option<String>,
    pub recent_searches: Option<Vec<String>>,
    pub linked_accounts: Option<LinkedAccounts>,
    pub favorite_weapons: Option<Vec<String>>,
    pub favorite_maps: Option<Vec<String>>,
}

impl UserPatch {
    pub fn for_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn searches(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut record = UserRecord::new("a@x.com");
        record.username = "Neo".to_owned();
        record.api_key = Some("secret".to_owned());
        record.login_count = 3;

        record.apply(&UserPatch::default().with_game_id("G1"));

        assert_eq!(record.username, "Neo");
        assert_eq!(record.game_id.as_deref(), Some("G1"));
        assert_eq!(record.api_key.as_deref(), Some("secret"));
        assert_eq!(record.login_count, 3);
    }

    #[test]
    fn apply_replaces_linked_accounts_wholesale() {
        let mut record = UserRecord::new("a@x.com");
        record.linked_accounts =
            LinkedAccounts::from([("discord".to_owned(), true)]);

        record.apply(&UserPatch {
            linked_accounts: Some(LinkedAccounts::from([(
                "google".to_owned(),
                true,
            )])),
            ..Default::default()
        });

        assert_eq!(
            record.linked_accounts,
            LinkedAccounts::from([("google".to_owned(), true)])
        );
    }

    #[test]
    fn apply_never_changes_email() {
        let mut record = UserRecord::new("a@x.com");
        record.apply(&UserPatch::for_email("b@x.com"));
        assert_eq!(record.email, "a@x.com");
    }

    #[rstest]
    #[case(&[], "Alice", &["Alice"])]
    #[case(&["Bob"], "Alice", &["Alice", "Bob"])]
    #[case(&["Alice", "Bob"], "Bob", &["Bob", "Alice"])]
    #[case(&["alice"], "Alice", &["Alice", "alice"])]
    fn push_search_moves_to_front(
        #[case] before: &[&str],
        #[case] query: &str,
        #[case] after: &[&str],
    ) {
        let mut record = UserRecord::new("a@x.com");
        record.recent_searches = searches(before);
        record.push_search(query);
        assert_eq!(record.recent_searches, searches(after));
    }

    #[test]
    fn push_search_keeps_ten_most_recent() {
        let mut record = UserRecord::new("a@x.com");
        for i in 0..15 {
            record.push_search(&format!("player{i}"));
        }

        let expected: Vec<String> =
            (5..15).rev().map(|i| format!("player{i}")).collect();
        assert_eq!(record.recent_searches, expected);
    }

    #[test]
    fn patched_searches_are_normalized() {
        let mut record = UserRecord::new("a@x.com");
        let mut list = searches(&["a", "b", "a"]);
        list.extend((0..20).map(|i| i.to_string()));

        record.apply(&UserPatch {
            recent_searches: Some(list),
            ..Default::default()
        });

        assert_eq!(record.recent_searches.len(), MAX_RECENT_SEARCHES);
        assert_eq!(&record.recent_searches[..3], &searches(&["a", "b", "0"])[..]);
    }

    #[test]
    fn legacy_field_names_deserialize() {
        let record: UserRecord = serde_json::from_str(
            r#"{
                "username": "Neo",
                "email": "a@x.com",
                "loginTime": 1700000000000,
                "loginCount": 2,
                "lastSearchedPlayers": ["Trinity"],
                "favoriteWeapons": ["M416"],
                "sessionHistory": [{"date": 1700000000000, "duration": 0}]
            }"#,
        )
        .unwrap();

        assert_eq!(record.login_timestamp, 1_700_000_000_000);
        assert_eq!(record.recent_searches, searches(&["Trinity"]));
        assert_eq!(record.favorite_weapons, searches(&["M416"]));
        assert_eq!(record.registration_timestamp, None);
        assert_eq!(
            record.session_history,
            vec![SessionEntry {
                timestamp: 1_700_000_000_000,
                duration_seconds: 0
            }]
        );
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let mut record = UserRecord::new("a@x.com");
        record.game_id = Some("G1".to_owned());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["gameId"], "G1");
        assert_eq!(value["loginCount"], 0);
        assert!(value.get("apiKey").is_none());
    }
}
