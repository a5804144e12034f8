//! Owner-directory paging and order-book traversal.

use std::sync::Arc;

use weft_common::{AccountId, Amount, Book, Currency, Hash256, Issue};
use weft_ledger::{
    indexes, BookAnnotation, DirNode, EntryData, Ledger, LedgerEntry, Offer, WriteMode,
    WriteResult,
};
use weft_map::{MapStore, MemoryMapStore};

const PAGE_SIZE: usize = 32;
const PAGES: usize = 4;

fn owner() -> AccountId {
    AccountId::from_bytes([0xAA; 20])
}

fn make_offer(key: Hash256, sequence: u32, book_directory: Hash256) -> LedgerEntry {
    LedgerEntry::new(
        key,
        EntryData::Offer(Offer {
            account: owner(),
            sequence,
            taker_pays: Amount::Drops(1_000),
            taker_gets: Amount::Drops(500),
            book_directory,
            book_node: 0,
            owner_node: 0,
            expiration: None,
            flags: 0,
        }),
    )
}

/// A ledger whose owner directory spans 4 pages of 32 offers each.
fn ledger_with_paged_directory() -> (Ledger, Vec<Hash256>) {
    let store: Arc<dyn MapStore> = Arc::new(MemoryMapStore::new());
    let ledger = Ledger::genesis(owner(), 100_000, store).expect("genesis");

    let keys: Vec<Hash256> = (0..(PAGE_SIZE * PAGES) as u32)
        .map(|sequence| indexes::offer_index(&owner(), sequence))
        .collect();
    for (sequence, key) in keys.iter().enumerate() {
        let offer = make_offer(*key, sequence as u32, Hash256::ZERO);
        assert_eq!(ledger.write_back(WriteMode::Create, &offer), WriteResult::Created);
    }

    let root = indexes::owner_dir_index(&owner());
    for page in 0..PAGES as u64 {
        let start = page as usize * PAGE_SIZE;
        let node = DirNode {
            root,
            indexes: keys[start..start + PAGE_SIZE].to_vec(),
            index_next: if page + 1 < PAGES as u64 { page + 1 } else { 0 },
            index_previous: page.saturating_sub(1),
            owner: Some(owner()),
            book: None,
        };
        let entry = LedgerEntry::new(
            indexes::dir_node_index(root, page),
            EntryData::DirNode(node),
        );
        assert_eq!(ledger.write_back(WriteMode::Create, &entry), WriteResult::Created);
    }

    (ledger, keys)
}

fn collect_sequences(entries: &[Arc<LedgerEntry>]) -> Vec<u32> {
    entries
        .iter()
        .map(|entry| entry.as_offer().expect("offer entry").sequence)
        .collect()
}

#[test]
fn full_walk_visits_every_page_in_order() {
    let (ledger, keys) = ledger_with_paged_directory();

    let mut seen = Vec::new();
    ledger
        .visit_owner_items(&owner(), &mut |entry| seen.push(entry))
        .unwrap();

    assert_eq!(seen.len(), keys.len());
    assert_eq!(
        collect_sequences(&seen),
        (0..keys.len() as u32).collect::<Vec<_>>()
    );
}

#[test]
fn paged_walk_resumes_from_the_hint() {
    let (ledger, keys) = ledger_with_paged_directory();

    let mut seen = Vec::new();
    let exhausted = ledger
        .visit_owner_items_paged(&owner(), keys[45], 1, 10, &mut |entry| {
            seen.push(entry);
            true
        })
        .unwrap();

    assert!(!exhausted, "82 entries remained");
    assert_eq!(collect_sequences(&seen), (46..56).collect::<Vec<_>>());
}

#[test]
fn paged_walk_falls_back_when_the_hint_lies() {
    let (ledger, keys) = ledger_with_paged_directory();

    let mut seen = Vec::new();
    let exhausted = ledger
        .visit_owner_items_paged(&owner(), keys[45], 3, 10, &mut |entry| {
            seen.push(entry);
            true
        })
        .unwrap();

    assert!(!exhausted);
    assert_eq!(collect_sequences(&seen), (46..56).collect::<Vec<_>>());
}

#[test]
fn paged_walk_reports_exhaustion() {
    let (ledger, keys) = ledger_with_paged_directory();

    let mut seen = Vec::new();
    let exhausted = ledger
        .visit_owner_items_paged(&owner(), keys[120], 3, 10, &mut |entry| {
            seen.push(entry);
            true
        })
        .unwrap();

    assert!(exhausted, "only 7 entries remained");
    assert_eq!(collect_sequences(&seen), (121..128).collect::<Vec<_>>());
}

#[test]
fn paged_walk_from_the_start_and_early_stop() {
    let (ledger, keys) = ledger_with_paged_directory();

    let mut seen = Vec::new();
    let exhausted = ledger
        .visit_owner_items_paged(&owner(), Hash256::ZERO, 0, keys.len() + 1, &mut |entry| {
            seen.push(entry);
            true
        })
        .unwrap();
    assert!(exhausted);
    assert_eq!(seen.len(), keys.len());

    let mut count = 0;
    let exhausted = ledger
        .visit_owner_items_paged(&owner(), Hash256::ZERO, 0, 100, &mut |_| {
            count += 1;
            count < 3
        })
        .unwrap();
    assert!(!exhausted);
    assert_eq!(count, 3);
}

#[test]
fn missing_directory_walks_as_empty() {
    let store: Arc<dyn MapStore> = Arc::new(MemoryMapStore::new());
    let ledger = Ledger::genesis(owner(), 100_000, store).expect("genesis");
    let stranger = AccountId::from_bytes([0x11; 20]);

    let mut seen = 0;
    ledger
        .visit_owner_items(&stranger, &mut |_| seen += 1)
        .unwrap();
    assert_eq!(seen, 0);

    let exhausted = ledger
        .visit_owner_items_paged(&stranger, Hash256::ZERO, 0, 10, &mut |_| true)
        .unwrap();
    assert!(exhausted);
}

#[test]
fn book_offers_come_out_in_quality_order() {
    let store: Arc<dyn MapStore> = Arc::new(MemoryMapStore::new());
    let ledger = Ledger::genesis(owner(), 100_000, store).expect("genesis");

    let book = Book::new(
        Issue::new(Currency::from_bytes([0x01; 20]), AccountId::from_bytes([0x02; 20])),
        Issue::native(),
    );
    let base = indexes::book_base(&book);
    let annotation = |rate: u64| BookAnnotation {
        taker_pays_currency: book.taker_pays.currency,
        taker_pays_issuer: book.taker_pays.account,
        taker_gets_currency: book.taker_gets.currency,
        taker_gets_issuer: book.taker_gets.account,
        exchange_rate: rate,
    };

    // Cheap quality: a two-page directory holding offers 0 and 1.
    let cheap_root = indexes::quality_index(base, 1);
    let offer0 = make_offer(indexes::offer_index(&owner(), 0), 0, cheap_root);
    let offer1 = make_offer(indexes::offer_index(&owner(), 1), 1, cheap_root);
    for offer in [&offer0, &offer1] {
        assert_eq!(ledger.write_back(WriteMode::Create, offer), WriteResult::Created);
    }
    let mut cheap_page0 = DirNode::for_book(cheap_root, annotation(1));
    cheap_page0.indexes = vec![offer0.index()];
    cheap_page0.index_next = 1;
    let mut cheap_page1 = DirNode::for_book(cheap_root, annotation(1));
    cheap_page1.indexes = vec![offer1.index()];
    cheap_page1.index_previous = 0;
    for (page, node) in [(0u64, cheap_page0), (1, cheap_page1)] {
        let entry = LedgerEntry::new(
            indexes::dir_node_index(cheap_root, page),
            EntryData::DirNode(node),
        );
        assert_eq!(ledger.write_back(WriteMode::Create, &entry), WriteResult::Created);
    }

    // Dear quality: a single page holding offer 2.
    let dear_root = indexes::quality_index(base, 1_000_000);
    let offer2 = make_offer(indexes::offer_index(&owner(), 2), 2, dear_root);
    assert_eq!(ledger.write_back(WriteMode::Create, &offer2), WriteResult::Created);
    let mut dear_page = DirNode::for_book(dear_root, annotation(1_000_000));
    dear_page.indexes = vec![offer2.index()];
    let entry = LedgerEntry::new(dear_root, EntryData::DirNode(dear_page));
    assert_eq!(ledger.write_back(WriteMode::Create, &entry), WriteResult::Created);

    let mut seen = Vec::new();
    let exhausted = ledger
        .visit_book_offers(&book, &mut |entry| {
            seen.push(entry);
            true
        })
        .unwrap();
    assert!(exhausted);
    assert_eq!(collect_sequences(&seen), vec![0, 1, 2]);

    // Early stop surfaces as a non-exhausted walk.
    let mut first_only = Vec::new();
    let exhausted = ledger
        .visit_book_offers(&book, &mut |entry| {
            first_only.push(entry);
            false
        })
        .unwrap();
    assert!(!exhausted);
    assert_eq!(collect_sequences(&first_only), vec![0]);

    // A book nobody quotes is exhausted immediately.
    let empty_book = Book::new(
        Issue::new(Currency::from_bytes([0x0F; 20]), AccountId::from_bytes([0x10; 20])),
        Issue::native(),
    );
    let mut none = 0;
    assert!(ledger
        .visit_book_offers(&empty_book, &mut |_| {
            none += 1;
            true
        })
        .unwrap());
    assert_eq!(none, 0);
}
