//! Seams to the services around the store. Only the contracts live here;
//! the store never calls a network service itself.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::record::{LinkedAccounts, UserPatch, UserRecord};
use crate::store::UserStore;
use data_error::{GameaidError, Result};
use fs_storage::BaseStorage;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub session_active: bool,
}

/// Whoever authenticates the user.
pub trait IdentityProvider {
    fn current_identity(&self) -> Option<Identity>;
}

/// Upsert the signed-in user. Nothing is written unless there is an
/// identity with an active session.
pub fn record_sign_in<S, C, P>(
    store: &mut UserStore<S, C>,
    provider: &P,
    patch: UserPatch,
) -> Result<Option<UserRecord>>
where
    S: BaseStorage,
    C: Clock,
    P: IdentityProvider + ?Sized,
{
    let identity = match provider.current_identity() {
        Some(identity) if identity.session_active => identity,
        _ => {
            log::debug!("No active session, skipping sign-in bookkeeping");
            return Ok(None);
        }
    };

    let patch = UserPatch {
        email: Some(identity.email),
        ..patch
    };
    store.upsert_on_login(patch).map(Some)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub total: u32,
    pub wins: u32,
    pub top10: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub kills: u32,
    pub assists: u32,
    pub kd: f64,
    pub damage_dealt: f64,
    pub headshot_percentage: f64,
    pub average_survival_time: f64,
    pub longest_kill: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerDetail {
    pub id: String,
    pub name: String,
    pub matches: Option<MatchSummary>,
    pub stats: Option<PlayerStats>,
}

/// Client of the game-statistics service.
pub trait StatsProvider {
    fn search_player(&self, name: &str) -> Result<Vec<PlayerSummary>>;

    fn player_stats(&self, id: &str) -> Result<PlayerDetail>;

    fn validate_credential(&self, api_key: &str) -> Result<bool>;
}

/// Look `name` up and remember it as a recent search of `email`.
///
/// The search is only recorded when the provider answered with at least
/// one player.
pub fn search_and_record<S, C, P>(
    store: &mut UserStore<S, C>,
    provider: &P,
    email: &str,
    name: &str,
) -> Result<Vec<PlayerSummary>>
where
    S: BaseStorage,
    C: Clock,
    P: StatsProvider + ?Sized,
{
    let players = provider.search_player(name)?;
    if players.is_empty() {
        log::debug!("No player named {}, search not recorded", name);
    } else {
        store.record_search(email, name)?;
    }
    Ok(players)
}

/// Store `api_key` for `email` once the provider accepts it.
pub fn save_api_key<S, C, P>(
    store: &mut UserStore<S, C>,
    provider: &P,
    email: &str,
    api_key: &str,
) -> Result<UserRecord>
where
    S: BaseStorage,
    C: Clock,
    P: StatsProvider + ?Sized,
{
    if !provider.validate_credential(api_key)? {
        return Err(GameaidError::InvalidRecord(
            "the stats provider rejected this API key".to_owned(),
        ));
    }
    store.update_fields(
        email,
        UserPatch {
            api_key: Some(api_key.to_owned()),
            ..Default::default()
        },
    )
}

/// The part of a record that may be shown to a text generator.
/// Credentials and media attachments are left out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileContext {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    pub login_count: u64,
    pub recent_searches: Vec<String>,
    pub linked_accounts: LinkedAccounts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub favorite_weapons: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub favorite_maps: Vec<String>,
}

impl From<&UserRecord> for ProfileContext {
    fn from(record: &UserRecord) -> Self {
        Self {
            username: record.username.clone(),
            game_id: record.game_id.clone(),
            login_count: record.login_count,
            recent_searches: record.recent_searches.clone(),
            linked_accounts: record.linked_accounts.clone(),
            favorite_weapons: record.favorite_weapons.clone(),
            favorite_maps: record.favorite_maps.clone(),
        }
    }
}

/// Client of the generative-text service.
pub trait TextGenerator {
    fn ask(
        &self,
        prompt: &str,
        context: Option<&ProfileContext>,
    ) -> Result<String>;
}

/// Ask `prompt` with the profile of `email` as context, if there is one.
pub fn ask_with_profile<S, C, G>(
    store: &UserStore<S, C>,
    generator: &G,
    email: &str,
    prompt: &str,
) -> Result<String>
where
    S: BaseStorage,
    C: Clock,
    G: TextGenerator + ?Sized,
{
    let context = store
        .get_record(email)
        .as_ref()
        .map(ProfileContext::from);
    generator.ask(prompt, context.as_ref())
}
