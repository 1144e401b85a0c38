use std::fs;
use std::thread;

use data_user::{
    ManualClock, UserPatch, UserStore, MAX_RECENT_SEARCHES, SCHEMA_VERSION,
};
use fs_storage::{
    AtomicStorage, BaseStorage, FileStorage, MemoryStorage, MAX_MODIFY_ATTEMPTS,
    USER_STORAGE_FILE, USER_STORAGE_FOLDER,
};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use rstest::rstest;
use serde_json::Value;
use tempdir::TempDir;

const T0: i64 = 1_700_000_000_000;

fn login(email: &str) -> UserPatch {
    UserPatch::for_email(email)
}

#[test_log::test]
fn file_storage_survives_reopen() {
    let temp_dir = TempDir::new("gameaid").unwrap();
    let path = temp_dir.path().join(USER_STORAGE_FILE);

    {
        let storage = FileStorage::new("users".to_owned(), &path);
        let mut store = UserStore::with_clock(storage, ManualClock::new(T0));
        store.upsert_on_login(login("a@x.com").with_username("Neo")).unwrap();
        store.record_search("a@x.com", "Alice").unwrap();
    }

    let storage = FileStorage::new("users".to_owned(), &path);
    let store = UserStore::with_clock(storage, ManualClock::new(T0));
    let record = store.get_record("a@x.com").unwrap();
    assert_eq!(record.username, "Neo");
    assert_eq!(record.recent_searches, vec!["Alice"]);
    assert_eq!(record.registration_timestamp, Some(T0));
}

#[test_log::test]
fn atomic_storage_survives_reopen() {
    let temp_dir = TempDir::new("gameaid").unwrap();
    let folder = temp_dir.path().join(USER_STORAGE_FOLDER);

    {
        let storage = AtomicStorage::new("users".to_owned(), &folder).unwrap();
        let mut store = UserStore::with_clock(storage, ManualClock::new(T0));
        store.upsert_on_login(login("a@x.com")).unwrap();
        store.upsert_on_login(login("b@x.com")).unwrap();
    }

    let storage = AtomicStorage::new("users".to_owned(), &folder).unwrap();
    let store = UserStore::new(storage);
    assert_eq!(store.emails(), vec!["a@x.com", "b@x.com"]);
}

#[test_log::test]
fn legacy_blob_is_migrated_on_next_write() {
    let temp_dir = TempDir::new("gameaid").unwrap();
    let path = temp_dir.path().join(USER_STORAGE_FILE);
    let legacy = r#"{
        "a@x.com": {
            "username": "Neo",
            "email": "a@x.com",
            "loginTime": 1600000000000,
            "loginCount": 3,
            "lastSearchedPlayers": ["Alice", "Bob"],
            "sessionHistory": [{"date": 1600000000000, "duration": 120}],
            "linkedAccounts": {"discord": true}
        }
    }"#;
    fs::write(&path, legacy).unwrap();

    let storage = FileStorage::new("users".to_owned(), &path);
    let mut store = UserStore::with_clock(storage, ManualClock::new(T0));

    let migrated = store.get_record("a@x.com").unwrap();
    assert_eq!(migrated.login_count, 3);
    assert_eq!(migrated.login_timestamp, 1_600_000_000_000);
    assert_eq!(migrated.recent_searches, vec!["Alice", "Bob"]);
    assert_eq!(migrated.session_history[0].duration_seconds, 120);
    assert_eq!(migrated.registration_timestamp, None);

    let record = store.upsert_on_login(login("a@x.com")).unwrap();
    assert_eq!(record.login_count, 4);
    assert_eq!(record.registration_timestamp, None);

    let snapshot = store.storage().load().unwrap();
    let written: Value = serde_json::from_slice(&snapshot.data.unwrap()).unwrap();
    assert_eq!(written["schemaVersion"], SCHEMA_VERSION);
    assert_eq!(written["records"]["a@x.com"]["loginCount"], 4);
    assert!(written["records"]["a@x.com"].get("loginTime").is_none());
}

#[rstest]
#[case::memory(false)]
#[case::atomic(true)]
fn two_handles_do_not_lose_updates(#[case] on_disk: bool) {
    let temp_dir = TempDir::new("gameaid").unwrap();
    let folder = temp_dir.path().join(USER_STORAGE_FOLDER);
    let memory = MemoryStorage::new("users");

    let open = || -> Box<dyn BaseStorage> {
        if on_disk {
            Box::new(AtomicStorage::new("users".to_owned(), &folder).unwrap())
        } else {
            Box::new(memory.handle())
        }
    };

    let mut first = UserStore::with_clock(open(), ManualClock::new(T0));
    let mut second = UserStore::with_clock(open(), ManualClock::new(T0));

    first.upsert_on_login(login("a@x.com")).unwrap();
    second.upsert_on_login(login("a@x.com")).unwrap();

    assert_eq!(first.get_record("a@x.com").unwrap().login_count, 2);
}

#[test_log::test]
fn concurrent_logins_across_threads() {
    let temp_dir = TempDir::new("gameaid").unwrap();
    let folder = temp_dir.path().join(USER_STORAGE_FOLDER);
    let threads = 4;
    let logins_per_thread = 5;
    // A login only retries when a rival login lands, and there are fewer
    // rival logins than the retry bound.
    assert!((threads - 1) * logins_per_thread < MAX_MODIFY_ATTEMPTS);

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let storage =
                AtomicStorage::new("users".to_owned(), &folder).unwrap();
            thread::spawn(move || {
                let mut store =
                    UserStore::with_clock(storage, ManualClock::new(T0));
                for _ in 0..logins_per_thread {
                    store.upsert_on_login(login("a@x.com")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let store = UserStore::new(
        AtomicStorage::new("users".to_owned(), &folder).unwrap(),
    );
    let record = store.get_record("a@x.com").unwrap();
    assert_eq!(record.login_count, (threads * logins_per_thread) as u64);
    assert_eq!(record.revision, record.login_count);
}

#[quickcheck]
fn login_count_equals_number_of_logins(logins: u8) -> TestResult {
    if logins == 0 || logins > 50 {
        return TestResult::discard();
    }
    let clock = ManualClock::new(T0);
    let mut store =
        UserStore::with_clock(MemoryStorage::new("users"), clock.clone());

    let mut first_registration = None;
    for _ in 0..logins {
        let record = store.upsert_on_login(login("a@x.com")).unwrap();
        first_registration.get_or_insert(record.registration_timestamp);
        clock.advance(1_000);
    }

    let record = store.get_record("a@x.com").unwrap();
    TestResult::from_bool(
        record.login_count == logins as u64
            && Some(record.registration_timestamp) == first_registration,
    )
}

#[quickcheck]
fn recent_searches_are_capped_and_newest_first(queries: Vec<u8>) -> bool {
    let mut store = UserStore::with_clock(
        MemoryStorage::new("users"),
        ManualClock::new(T0),
    );
    store.upsert_on_login(login("a@x.com")).unwrap();

    let names: Vec<String> =
        queries.iter().map(|query| format!("player-{}", query % 20)).collect();
    for name in &names {
        store.record_search("a@x.com", name).unwrap();
    }

    let mut expected: Vec<String> = Vec::new();
    for name in names.iter().rev() {
        if expected.len() < MAX_RECENT_SEARCHES && !expected.contains(name) {
            expected.push(name.clone());
        }
    }

    store.get_record("a@x.com").unwrap().recent_searches == expected
}

#[test]
fn fifteen_distinct_searches_keep_ten_most_recent() {
    let mut store = UserStore::with_clock(
        MemoryStorage::new("users"),
        ManualClock::new(T0),
    );
    store.upsert_on_login(login("a@x.com")).unwrap();

    for index in 0..15 {
        store
            .record_search("a@x.com", &format!("player-{}", index))
            .unwrap();
    }

    let expected: Vec<String> =
        (5..15).rev().map(|index| format!("player-{}", index)).collect();
    assert_eq!(
        store.get_record("a@x.com").unwrap().recent_searches,
        expected
    );
}
