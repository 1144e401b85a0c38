pub mod clock;
pub mod provider;
pub mod record;
pub mod schema;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use provider::{
    ask_with_profile, record_sign_in, save_api_key, search_and_record,
    Identity, IdentityProvider, MatchSummary, PlayerDetail, PlayerStats,
    PlayerSummary, ProfileContext, StatsProvider, TextGenerator,
};
pub use record::{
    LinkedAccounts, SessionEntry, UserPatch, UserRecord, MAX_RECENT_SEARCHES,
};
pub use schema::{Document, Records, SCHEMA_VERSION};
pub use store::UserStore;
