//! Genesis construction, child derivation, and the lifecycle state
//! machine.

use std::sync::Arc;

use parking_lot::Mutex;
use weft_common::protocol::round_close_time;
use weft_common::{AccountId, Config, Currency, Hash256};
use weft_ledger::{
    indexes, AccountRoot, EntryData, EntryKind, FeeSettings, InboundLedgers, Ledger, LedgerEntry,
    LedgerError, LedgerHeader, RippleState, StaticFeeTrack, WriteMode, WriteResult,
    CLOSE_FLAG_NO_CONSENSUS_TIME,
};
use weft_map::{MapStore, MemoryMapStore};

fn master() -> AccountId {
    AccountId::from_bytes([0xAA; 20])
}

fn map_store() -> Arc<dyn MapStore> {
    Arc::new(MemoryMapStore::new())
}

fn make_genesis() -> Ledger {
    Ledger::genesis(master(), 100_000, map_store()).expect("genesis")
}

fn freeze(ledger: &mut Ledger) {
    ledger.set_closed();
    ledger.set_accepted(ledger.close_time(), ledger.close_time_resolution(), true);
}

#[test]
fn genesis_seeds_the_root_account() {
    let ledger = make_genesis();

    assert_eq!(ledger.sequence(), 1);
    assert_eq!(ledger.total_coins(), 100_000);
    assert!(ledger.tx_hash().is_zero());

    let root = ledger.account_root(&master()).unwrap().expect("root account");
    let account = root.as_account_root().unwrap();
    assert_eq!(account.balance, 100_000);
    assert_eq!(account.sequence, 1);
    assert!(ledger.has_account(&master()).unwrap());
    assert!(!ledger
        .has_account(&AccountId::from_bytes([0xBB; 20]))
        .unwrap());
}

#[test]
fn child_chains_to_its_parent() {
    let mut genesis = make_genesis();
    freeze(&mut genesis);
    let genesis_hash = genesis.hash();

    let child = Ledger::build_next(&genesis, 1_000_000);
    assert_eq!(child.sequence(), 2);
    assert_eq!(child.parent_hash(), genesis_hash);
    assert_eq!(child.parent_close_time(), genesis.close_time());
    assert_eq!(child.total_coins(), 100_000);

    // State carried over copy-on-write.
    let root = child.account_root(&master()).unwrap().expect("root account");
    assert_eq!(root.as_account_root().unwrap().balance, 100_000);
}

#[test]
fn child_close_time_derivation() {
    let mut genesis = make_genesis();
    freeze(&mut genesis);

    // Genesis has no close time, so the child rounds the wall clock.
    let child = Ledger::build_next(&genesis, 1_000_123);
    assert_eq!(
        child.close_time(),
        round_close_time(1_000_123, child.close_time_resolution())
    );

    // A parent with a close time advances it by one resolution step.
    let mut closed = Ledger::build_next(&genesis, 1_000_123);
    closed.set_closed();
    closed.set_accepted(1_000_123, 30, true);
    let grandchild = Ledger::build_next(&closed, 0);
    assert_eq!(
        grandchild.close_time(),
        closed.close_time() + u32::from(grandchild.close_time_resolution())
    );
    assert_eq!(grandchild.parent_close_time(), closed.close_time());
}

#[test]
fn close_time_rounding() {
    assert_eq!(round_close_time(1_000_123, 10), 1_000_120);
    assert_eq!(round_close_time(0, 10), 0);
    assert_eq!(round_close_time(15, 10), 20);
}

#[test]
fn accepting_rounds_or_flags_the_close_time() {
    let mut agreed = make_genesis();
    agreed.set_closed();
    agreed.set_accepted(1_000_123, 10, true);
    assert_eq!(agreed.close_time(), 1_000_120);
    assert!(agreed.close_agree());
    assert!(agreed.is_accepted());
    assert!(agreed.is_immutable());

    let mut disputed = make_genesis();
    disputed.set_closed();
    disputed.set_accepted(1_000_123, 10, false);
    assert_eq!(disputed.close_time(), 1_000_123);
    assert!(!disputed.close_agree());
    assert_eq!(disputed.close_flags(), CLOSE_FLAG_NO_CONSENSUS_TIME);
}

#[test]
fn immutable_hash_is_final_and_header_checks_out() {
    let mut ledger = make_genesis();
    assert!(!ledger.is_fixed());
    freeze(&mut ledger);
    assert!(ledger.is_fixed());

    let hash = ledger.hash();
    let header = ledger.header();
    assert_eq!(header.hash(), hash);
    assert_eq!(
        LedgerHeader::decode(&header.encode(), false).unwrap(),
        header
    );
    assert_eq!(
        LedgerHeader::decode(&header.encode_prefixed(), true).unwrap(),
        header
    );
    assert!(ledger.assert_sane());
    assert!(ledger.walk_maps());
}

#[test]
fn snapshot_reads_what_the_source_read() {
    let ledger = make_genesis();
    let offer_key = indexes::offer_index(&master(), 7);
    let trust = LedgerEntry::new(
        indexes::ripple_state_index(
            &master(),
            &AccountId::from_bytes([0xBB; 20]),
            &Currency::from_bytes([1; 20]),
        ),
        EntryData::RippleState(RippleState {
            low_account: master().min(AccountId::from_bytes([0xBB; 20])),
            high_account: master().max(AccountId::from_bytes([0xBB; 20])),
            currency: Currency::from_bytes([1; 20]),
            balance: 25,
            low_limit: 100,
            high_limit: 0,
            flags: 0,
        }),
    );
    assert_eq!(ledger.write_back(WriteMode::Create, &trust), WriteResult::Created);

    let snapshot = ledger.snapshot(false);
    assert!(snapshot.is_immutable());
    assert_eq!(snapshot.sequence(), ledger.sequence());
    assert_eq!(
        snapshot.entry(&trust.index()).unwrap().unwrap().as_ref(),
        ledger.entry(&trust.index()).unwrap().unwrap().as_ref()
    );
    assert_eq!(
        snapshot.account_root(&master()).unwrap().unwrap().as_ref(),
        ledger.account_root(&master()).unwrap().unwrap().as_ref()
    );

    // Later writes to the source are invisible through the snapshot.
    let late = LedgerEntry::new(
        offer_key,
        EntryData::AccountRoot(AccountRoot {
            account: AccountId::from_bytes([0xCC; 20]),
            balance: 1,
            sequence: 1,
            owner_count: 0,
            flags: 0,
        }),
    );
    assert_eq!(ledger.write_back(WriteMode::Create, &late), WriteResult::Created);
    assert!(snapshot.entry(&offer_key).unwrap().is_none());
    assert!(ledger.entry(&offer_key).unwrap().is_some());
}

#[test]
fn write_back_modes() {
    let ledger = make_genesis();
    let key = indexes::ticket_index(&master(), 3);
    let entry = LedgerEntry::new(
        key,
        EntryData::AccountRoot(AccountRoot {
            account: master(),
            balance: 5,
            sequence: 2,
            owner_count: 0,
            flags: 0,
        }),
    );

    assert_eq!(
        ledger.write_back(WriteMode::NoCreate, &entry),
        WriteResult::Missing
    );
    assert_eq!(
        ledger.write_back(WriteMode::Create, &entry),
        WriteResult::Created
    );

    let mut updated = entry.clone();
    if let EntryData::AccountRoot(root) = updated.data_mut() {
        root.balance = 6;
    }
    assert_eq!(
        ledger.write_back(WriteMode::NoCreate, &updated),
        WriteResult::Ok
    );
    assert_eq!(
        ledger
            .entry(&key)
            .unwrap()
            .unwrap()
            .as_account_root()
            .unwrap()
            .balance,
        6
    );
}

#[test]
fn typed_reads_reject_the_wrong_kind() {
    let ledger = make_genesis();
    let key = indexes::account_index(&master());

    assert!(ledger.typed_entry(&key, EntryKind::AccountRoot).unwrap().is_some());
    assert!(ledger.typed_entry(&key, EntryKind::Offer).unwrap().is_none());
    assert!(ledger
        .typed_entry(&Hash256::from_bytes([9; 32]), EntryKind::Offer)
        .unwrap()
        .is_none());
}

#[test]
fn transactions_round_trip_through_the_map() {
    let ledger = make_genesis();
    let id = Hash256::from_bytes([0x77; 32]);

    assert!(!ledger.has_transaction(&id).unwrap());
    assert!(ledger.add_transaction(id, &[1, 2, 3]));
    assert!(!ledger.add_transaction(id, &[1, 2, 3]));
    assert!(ledger.has_transaction(&id).unwrap());

    let fetched = ledger.transaction(&id).unwrap().expect("stored tx");
    assert_eq!(fetched.raw_tx, vec![1, 2, 3]);
    assert!(fetched.meta.is_none());
    assert!(!ledger.tx_hash().is_zero());
}

#[test]
fn fee_schedule_reads_the_entry_once() {
    let config = Config::default();
    let ledger = make_genesis();

    let fee_entry = LedgerEntry::new(
        indexes::fee_index(),
        EntryData::FeeSettings(FeeSettings {
            base_fee: Some(50),
            reference_fee_units: Some(10),
            reserve_base: None,
            reserve_increment: None,
        }),
    );
    assert_eq!(
        ledger.write_back(WriteMode::Create, &fee_entry),
        WriteResult::Created
    );

    let schedule = ledger.fee_schedule(&config);
    assert_eq!(schedule.base_fee, 50);
    assert_eq!(schedule.reference_fee_units, 10);
    // Missing fields fall back to configuration.
    assert_eq!(schedule.reserve_base, config.fee_account_reserve);
    assert_eq!(
        ledger.reserve(&config, 2),
        u64::from(config.fee_account_reserve) + 2 * u64::from(config.fee_owner_reserve)
    );

    // The first read is installed for good.
    let richer = LedgerEntry::new(
        indexes::fee_index(),
        EntryData::FeeSettings(FeeSettings {
            base_fee: Some(9_999),
            ..Default::default()
        }),
    );
    assert_eq!(
        ledger.write_back(WriteMode::NoCreate, &richer),
        WriteResult::Ok
    );
    assert_eq!(ledger.base_fee(&config), 50);

    let track = StaticFeeTrack::default();
    assert_eq!(ledger.scale_fee_base(&config, &track, 10), 50);
    assert_eq!(ledger.scale_fee_load(&config, &track, 10, true), 50);
}

#[test]
fn fee_schedule_defaults_without_an_entry() {
    let config = Config::default();
    let ledger = make_genesis();
    let schedule = ledger.fee_schedule(&config);
    assert_eq!(schedule.base_fee, config.fee_default);
    assert_eq!(schedule.reserve_increment, config.fee_owner_reserve);
}

#[test]
fn freeze_enforcement_follows_configuration() {
    let ledger = make_genesis();

    let config = Config::default();
    assert!(ledger.enforce_freeze(&config));

    let relaxed = Config {
        enforce_freeze: false,
        ..Config::default()
    };
    assert!(!ledger.enforce_freeze(&relaxed));

    let standalone = Config {
        enforce_freeze: false,
        run_standalone: true,
        ..Config::default()
    };
    assert!(ledger.enforce_freeze(&standalone));
}

#[test]
fn decode_reconstructs_a_frozen_ledger() {
    let store: Arc<dyn MapStore> = Arc::new(MemoryMapStore::new());
    let mut genesis = Ledger::genesis(master(), 100_000, store.clone()).unwrap();
    freeze(&mut genesis);

    let bytes = genesis.header().encode_prefixed();
    let (decoded, loaded) = Ledger::decode(&bytes, true, store.clone()).unwrap();
    assert!(loaded);
    assert!(decoded.is_immutable());
    assert_eq!(decoded.hash(), genesis.hash());
    assert_eq!(
        decoded
            .account_root(&master())
            .unwrap()
            .unwrap()
            .as_account_root()
            .unwrap()
            .balance,
        100_000
    );
}

#[test]
fn decode_flags_partial_loads() {
    // A store that never saw this ledger's maps cannot complete the load.
    let foreign: Arc<dyn MapStore> = Arc::new(MemoryMapStore::new());
    let mut genesis = make_genesis();
    freeze(&mut genesis);

    let (partial, loaded) = Ledger::decode(&genesis.header().encode(), false, foreign).unwrap();
    assert!(!loaded);
    assert!(partial.is_immutable());
    // The header still hashes correctly even though the maps are absent.
    assert_eq!(partial.hash(), genesis.hash());
    assert!(!partial.needed_state_hashes(4).is_empty());
    assert!(partial.account_root(&master()).is_err());
}

#[derive(Default)]
struct RecordingInbound {
    calls: Mutex<Vec<(Hash256, u32)>>,
}

impl InboundLedgers for RecordingInbound {
    fn acquire(&self, hash: Hash256, ledger_seq: u32) {
        self.calls.lock().push((hash, ledger_seq));
    }
}

#[test]
fn state_walk_and_ordered_navigation() {
    let ledger = make_genesis();

    let mut count = 0;
    ledger
        .visit_state_entries(None, &mut |entry| {
            assert_eq!(entry.kind(), EntryKind::AccountRoot);
            count += 1;
        })
        .unwrap();
    assert_eq!(count, 1);

    let first = ledger.first_state_index().unwrap().unwrap();
    assert_eq!(first, indexes::account_index(&master()));
    assert_eq!(ledger.last_state_index().unwrap(), Some(first));
    assert!(ledger.next_state_index(&first).unwrap().is_none());
    assert_eq!(
        ledger
            .prev_state_index(&Hash256::from_bytes([0xFF; 32]))
            .unwrap(),
        Some(first)
    );
}

#[test]
fn state_walk_over_missing_nodes_requests_acquisition() {
    let mut genesis = make_genesis();
    freeze(&mut genesis);

    let foreign: Arc<dyn MapStore> = Arc::new(MemoryMapStore::new());
    let (partial, loaded) =
        Ledger::decode(&genesis.header().encode(), false, foreign).unwrap();
    assert!(!loaded);

    let inbound = RecordingInbound::default();
    let err = partial
        .visit_state_entries(Some(&inbound), &mut |_| {})
        .unwrap_err();
    assert!(matches!(err, LedgerError::MissingMapNode(_)));
    assert_eq!(
        inbound.calls.lock().as_slice(),
        &[(genesis.hash(), genesis.sequence())]
    );
}

#[test]
fn validated_flag_is_monotonic() {
    let mut ledger = make_genesis();
    assert!(!ledger.is_validated());
    ledger.set_validated();
    assert!(ledger.is_validated());
    freeze(&mut ledger);
    assert!(ledger.is_validated());
}

#[test]
fn coin_accounting() {
    let mut ledger = make_genesis();
    ledger.destroy_coins(10);
    assert_eq!(ledger.total_coins(), 99_990);
    ledger.set_total_coins(42);
    assert_eq!(ledger.total_coins(), 42);
}
