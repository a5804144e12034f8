//! Directory traversal.
//!
//! Owner directories and order-book directories are doubly linked lists
//! of pages. Each page carries the child keys it holds and the index of
//! the next page (0 for the last page); page keys derive from the root,
//! so a walk only needs the root and the chain of next indexes.

use std::sync::Arc;

use tracing::warn;
use weft_common::{AccountId, Book, Hash256};

use crate::entry::{DirNode, EntryKind, LedgerEntry};
use crate::indexes;
use crate::ledger::Ledger;
use crate::Result;

impl Ledger {
    /// Visit every item in `owner`'s directory, in directory order.
    pub fn visit_owner_items(
        &self,
        owner: &AccountId,
        f: &mut dyn FnMut(Arc<LedgerEntry>),
    ) -> Result<()> {
        let root = indexes::owner_dir_index(owner);
        let mut current = root;

        loop {
            let Some(page) = self.dir_node(&current)? else {
                return Ok(());
            };
            let dir = page.as_dir_node().expect("typed as DirNode");

            for child in &dir.indexes {
                match self.entry(child)? {
                    Some(entry) => f(entry),
                    None => warn!(%child, "directory references missing entry"),
                }
            }

            if dir.index_next == 0 {
                return Ok(());
            }
            current = indexes::dir_node_index(root, dir.index_next);
        }
    }

    /// Visit up to `limit` items of `owner`'s directory, resuming after
    /// `start_after`.
    ///
    /// With a zero `start_after` the walk begins at the first item.
    /// Otherwise `hint` names the page expected to hold `start_after`;
    /// when the hint page really contains it the walk resumes there
    /// without touching earlier pages, and falls back to the root when it
    /// does not. Items up to and including `start_after` are skipped.
    ///
    /// The callback returns false to stop early. Returns true iff the
    /// walk ran off the end of the directory, that is, fewer than `limit`
    /// items remained and the callback never stopped it.
    pub fn visit_owner_items_paged(
        &self,
        owner: &AccountId,
        start_after: Hash256,
        hint: u64,
        limit: usize,
        f: &mut dyn FnMut(Arc<LedgerEntry>) -> bool,
    ) -> Result<bool> {
        if limit == 0 {
            return Ok(false);
        }

        let root = indexes::owner_dir_index(owner);
        let mut current = root;
        let mut skipping = !start_after.is_zero();

        if skipping {
            let hint_key = indexes::dir_node_index(root, hint);
            if let Some(page) = self.dir_node(&hint_key)? {
                let dir = page.as_dir_node().expect("typed as DirNode");
                if dir.indexes.contains(&start_after) {
                    current = hint_key;
                }
            }
        }

        let mut remaining = limit;
        loop {
            let Some(page) = self.dir_node(&current)? else {
                return Ok(true);
            };
            let dir = page.as_dir_node().expect("typed as DirNode");

            for child in &dir.indexes {
                if skipping {
                    if *child == start_after {
                        skipping = false;
                    }
                    continue;
                }
                let Some(entry) = self.entry(child)? else {
                    warn!(%child, "directory references missing entry");
                    continue;
                };
                if !f(entry) {
                    return Ok(false);
                }
                remaining -= 1;
                if remaining == 0 {
                    return Ok(false);
                }
            }

            if dir.index_next == 0 {
                return Ok(true);
            }
            current = indexes::dir_node_index(root, dir.index_next);
        }
    }

    /// Visit every offer in `book`, ascending quality order.
    ///
    /// The callback returns false to stop. Returns true iff the book was
    /// exhausted.
    pub fn visit_book_offers(
        &self,
        book: &Book,
        f: &mut dyn FnMut(Arc<LedgerEntry>) -> bool,
    ) -> Result<bool> {
        let base = indexes::book_base(book);
        let upper = indexes::quality_index(base, u64::MAX);
        let mut cursor = base;

        // Only quality-directory roots land inside [base, upper]; their
        // overflow pages hash into the directory-node space.
        while let Some(root_key) = self.next_state_index_bounded(&cursor, &upper)? {
            if !self.walk_quality_dir(root_key, f)? {
                return Ok(false);
            }
            cursor = root_key;
        }
        Ok(true)
    }

    fn walk_quality_dir(
        &self,
        root: Hash256,
        f: &mut dyn FnMut(Arc<LedgerEntry>) -> bool,
    ) -> Result<bool> {
        let mut current = root;
        loop {
            let Some(page) = self.dir_node(&current)? else {
                return Ok(true);
            };
            let dir: &DirNode = page.as_dir_node().expect("typed as DirNode");

            for child in &dir.indexes {
                let Some(entry) = self.typed_entry(child, EntryKind::Offer)? else {
                    warn!(%child, "book directory references missing offer");
                    continue;
                };
                if !f(entry) {
                    return Ok(false);
                }
            }

            if dir.index_next == 0 {
                return Ok(true);
            }
            current = indexes::dir_node_index(root, dir.index_next);
        }
    }
}
