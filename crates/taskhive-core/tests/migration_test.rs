//! Integration test: guest-to-account migration — authorization gate,
//! atomic re-ownership across the ownable-entity registry, idempotent
//! re-invocation.
//!
//! ## Scenarios
//! 1. Caller differing from the target account is rejected and guest rows
//!    stay exactly where they were.
//! 2. Empty guest or target identifiers are bad requests.
//! 3. Guest owning 2 tasks + 1 tag migrates fully: the user owns them all,
//!    the guest owns zero records of any kind.
//! 4. Re-invoking immediately after success is a no-op success.
//! 5. A guest with no records migrates as a successful no-op.
//! 6. Records of other owners are never touched by someone else's migration.
//! 7. Per-table counts in the report match what moved.
//! 8. A settings key owned by both guest and account migrates cleanly: the
//!    account's value wins, the guest duplicate is dropped, and the rest of
//!    the guest's data still moves in the same transaction.

use taskhive_core::{CoreDb, GuestId, Identity, MigrationError, MigrationService, UserId};

fn setup() -> (CoreDb, MigrationService) {
    let path = std::env::temp_dir().join(format!("taskhive-migrate-{}.db", uuid::Uuid::new_v4()));
    let db = CoreDb::new(path).expect("temp db");
    let svc = MigrationService::new(db.clone());
    (db, svc)
}

fn guest_identity(id: &str) -> Identity {
    Identity::Guest(GuestId::new(id))
}

fn user_identity(id: &str) -> Identity {
    Identity::Authenticated(UserId::new(id))
}

// ===========================================================================
// Test 1: identity mismatch is rejected before any write
// ===========================================================================

#[test]
fn caller_must_be_the_target_account() {
    let (db, svc) = setup();
    let guest = GuestId::new("g-1");
    db.insert_task(&guest_identity("g-1"), "water plants").unwrap();

    let result = svc.migrate(&guest, &UserId::new("victim"), &UserId::new("attacker"));
    assert!(matches!(result, Err(MigrationError::Unauthorized)));

    // Guest data is intact, nothing leaked into either account.
    assert_eq!(db.owned_count(&guest_identity("g-1")).unwrap(), 1);
    assert_eq!(db.owned_count(&user_identity("victim")).unwrap(), 0);
    assert_eq!(db.owned_count(&user_identity("attacker")).unwrap(), 0);
}

// ===========================================================================
// Test 2: missing identifiers
// ===========================================================================

#[test]
fn empty_guest_id_is_a_bad_request() {
    let (_db, svc) = setup();
    let u = UserId::new("u-1");
    let result = svc.migrate(&GuestId::new("  "), &u, &u);
    assert!(matches!(result, Err(MigrationError::BadRequest(_))));
}

#[test]
fn empty_target_id_is_a_bad_request() {
    let (_db, svc) = setup();
    let u = UserId::new("");
    let result = svc.migrate(&GuestId::new("g-1"), &u, &u);
    assert!(matches!(result, Err(MigrationError::BadRequest(_))));
}

// ===========================================================================
// Test 3 + 4: full migration, then idempotent re-invocation
// ===========================================================================

#[test]
fn migrates_all_guest_records_then_reinvocation_is_noop() {
    let (db, svc) = setup();
    let g = guest_identity("g-2");
    db.insert_task(&g, "pack boxes").unwrap();
    db.insert_task(&g, "order pizza").unwrap();
    db.insert_tag(&g, "moving").unwrap();

    let user = UserId::new("u-2");
    let report = svc.migrate(&GuestId::new("g-2"), &user, &user).unwrap();
    assert_eq!(report.records_moved, 3);

    let u = user_identity("u-2");
    assert_eq!(db.owned_count(&g).unwrap(), 0, "guest must own nothing afterwards");
    assert_eq!(db.owned_count(&u).unwrap(), 3);

    let again = svc.migrate(&GuestId::new("g-2"), &user, &user).unwrap();
    assert_eq!(again.records_moved, 0, "second migration must be a no-op success");
    assert_eq!(db.owned_count(&u).unwrap(), 3, "no double transfer");
}

// ===========================================================================
// Test 5: empty guest migrates as success
// ===========================================================================

#[test]
fn guest_with_no_records_migrates_as_noop_success() {
    let (_db, svc) = setup();
    let user = UserId::new("u-3");
    let report = svc.migrate(&GuestId::new("g-never-seen"), &user, &user).unwrap();
    assert_eq!(report.records_moved, 0);
}

// ===========================================================================
// Test 6: other owners are untouched
// ===========================================================================

#[test]
fn other_owners_records_are_untouched() {
    let (db, svc) = setup();
    db.insert_task(&guest_identity("g-a"), "guest a task").unwrap();
    db.insert_task(&guest_identity("g-b"), "guest b task").unwrap();
    db.insert_task(&user_identity("u-other"), "someone else's task").unwrap();

    let user = UserId::new("u-a");
    svc.migrate(&GuestId::new("g-a"), &user, &user).unwrap();

    assert_eq!(db.owned_count(&guest_identity("g-b")).unwrap(), 1);
    assert_eq!(db.owned_count(&user_identity("u-other")).unwrap(), 1);
    assert_eq!(db.owned_count(&user_identity("u-a")).unwrap(), 1);
}

// ===========================================================================
// Test 7: report covers every registry table
// ===========================================================================

#[test]
fn report_counts_match_per_table() {
    let (db, svc) = setup();
    let g = guest_identity("g-4");
    db.insert_task(&g, "task one").unwrap();
    db.insert_task(&g, "task two").unwrap();
    db.insert_group(&g, "errands").unwrap();
    db.insert_tag(&g, "home").unwrap();
    db.insert_setting(&g, "theme", "dark").unwrap();

    let user = UserId::new("u-4");
    let report = svc.migrate(&GuestId::new("g-4"), &user, &user).unwrap();
    assert_eq!(report.records_moved, 5);

    let by_table: std::collections::HashMap<_, _> = report
        .per_table
        .iter()
        .map(|t| (t.table, t.moved))
        .collect();
    assert_eq!(by_table["tasks"], 2);
    assert_eq!(by_table["task_groups"], 1);
    assert_eq!(by_table["tags"], 1);
    assert_eq!(by_table["user_settings"], 1);

    // Every registry table is reported, even when empty.
    assert_eq!(report.per_table.len(), CoreDb::OWNABLE.len());
}

// ===========================================================================
// Test 8: colliding settings keys must not wedge the migration
// ===========================================================================

#[test]
fn colliding_setting_key_keeps_account_value_and_still_migrates() {
    let (db, svc) = setup();
    let g = guest_identity("g-5");
    db.insert_task(&g, "finish signup").unwrap();
    db.insert_setting(&g, "theme", "dark").unwrap();
    db.insert_setting(&g, "lang", "en").unwrap();

    // The account already carries its own value for the same key.
    let u = user_identity("u-5");
    db.insert_setting(&u, "theme", "light").unwrap();

    let user = UserId::new("u-5");
    let report = svc.migrate(&GuestId::new("g-5"), &user, &user).unwrap();

    // Task and the non-colliding setting move; the guest's "theme" is
    // dropped in favor of the account's existing row.
    assert_eq!(report.records_moved, 2);
    assert_eq!(report.records_dropped, 1);
    assert_eq!(db.owned_count(&g).unwrap(), 0, "guest must own nothing afterwards");
    assert_eq!(db.setting_value(&u, "theme").unwrap().as_deref(), Some("light"));
    assert_eq!(db.setting_value(&u, "lang").unwrap().as_deref(), Some("en"));
    assert_eq!(db.owned_count(&u).unwrap(), 3);

    // Retry after success stays a clean no-op, never the same failure again.
    let again = svc.migrate(&GuestId::new("g-5"), &user, &user).unwrap();
    assert_eq!(again.records_moved, 0);
    assert_eq!(again.records_dropped, 0);
}
