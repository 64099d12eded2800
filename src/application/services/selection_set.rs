use std::collections::HashSet;
use std::future::Future;

use tracing::debug;

use crate::common::errors::Result;
use crate::domain::entities::item::Item;

/// Result of a select-all request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAllOutcome {
    /// The window already held every item; ids were taken from it
    FromWindow(usize),
    /// A full listing was fetched to cover unloaded pages
    FromFullListing(usize),
}

impl SelectAllOutcome {
    pub fn selected(&self) -> usize {
        match self {
            SelectAllOutcome::FromWindow(n) | SelectAllOutcome::FromFullListing(n) => *n,
        }
    }
}

/// Set of selected item ids with an anchor for range selection.
///
/// The set is not restricted to the page window: select-all can bring in
/// ids whose pages were never loaded.
#[derive(Debug, Default, Clone)]
pub struct SelectionSet {
    selected: HashSet<String>,
    anchor: Option<String>,
    all_selected: bool,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `id` and makes it the anchor either way
    pub fn toggle(&mut self, id: &str) -> bool {
        let now_selected = if self.selected.remove(id) {
            self.all_selected = false;
            false
        } else {
            self.selected.insert(id.to_string());
            true
        };
        self.anchor = Some(id.to_string());
        now_selected
    }

    /// Replaces the selection with `id` alone (plain click)
    pub fn select_only(&mut self, id: &str) {
        self.selected.clear();
        self.selected.insert(id.to_string());
        self.all_selected = false;
        self.anchor = Some(id.to_string());
    }

    /// Adds every id between the anchor and `target`, inclusive.
    ///
    /// Without an anchor this is a toggle of `target`. If either end is not
    /// part of `window` nothing happens: ranges only cover the loaded prefix.
    /// Returns how many ids were newly selected.
    pub fn select_range(&mut self, target: &str, window: &[Item]) -> usize {
        let anchor = match &self.anchor {
            Some(anchor) => anchor.clone(),
            None => {
                return usize::from(self.toggle(target));
            }
        };

        let anchor_pos = window.iter().position(|item| item.id() == anchor);
        let target_pos = window.iter().position(|item| item.id() == target);

        let (start, end) = match (anchor_pos, target_pos) {
            (Some(a), Some(t)) => (a.min(t), a.max(t)),
            _ => {
                debug!("Range {} -> {} leaves the loaded window, ignoring", anchor, target);
                return 0;
            }
        };

        window[start..=end]
            .iter()
            .filter(|item| self.selected.insert(item.id().to_string()))
            .count()
    }

    /// True when select-all cannot be served from `loaded` items alone
    pub fn needs_full_listing(total: usize, loaded: usize) -> bool {
        loaded < total
    }

    /// Replaces the selection with `ids` and marks it as all-selected
    pub fn replace_all<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        self.selected = ids.into_iter().collect();
        self.all_selected = true;
        self.selected.len()
    }

    /// Selects every item of a listing of `total` items.
    ///
    /// When `window` already holds `total` items its ids are used directly;
    /// otherwise `fetch_all_ids` is awaited once. A failed fetch leaves the
    /// selection as it was.
    pub async fn select_all<F, Fut>(
        &mut self,
        total: usize,
        window: &[Item],
        fetch_all_ids: F,
    ) -> Result<SelectAllOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>>>,
    {
        if !Self::needs_full_listing(total, window.len()) {
            let n = self.replace_all(window.iter().map(|item| item.id().to_string()));
            return Ok(SelectAllOutcome::FromWindow(n));
        }

        let ids = fetch_all_ids().await?;
        let n = self.replace_all(ids);
        Ok(SelectAllOutcome::FromFullListing(n))
    }

    /// Empties the selection and forgets the anchor
    pub fn clear(&mut self) {
        self.selected.clear();
        self.all_selected = false;
        self.anchor = None;
    }

    /// Drops `ids` from the selection, e.g. once they moved to the trash
    pub fn remove_ids<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut removed = 0;
        for id in ids {
            if self.selected.remove(id) {
                removed += 1;
            }
            if self.anchor.as_deref() == Some(id) {
                self.anchor = None;
            }
        }
        if removed > 0 {
            self.all_selected = false;
        }
        removed
    }

    pub fn is_all_selected(&self, total: usize) -> bool {
        self.all_selected || self.selected.len() == total
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// Selected ids in window order, followed by unloaded ids sorted
    pub fn ordered_ids(&self, window: &[Item]) -> Vec<String> {
        let mut ordered: Vec<String> = window
            .iter()
            .filter(|item| self.selected.contains(item.id()))
            .map(|item| item.id().to_string())
            .collect();

        let in_window: HashSet<&str> = window.iter().map(Item::id).collect();
        let mut rest: Vec<String> = self.selected
            .iter()
            .filter(|id| !in_window.contains(id.as_str()))
            .cloned()
            .collect();
        rest.sort();

        ordered.extend(rest);
        ordered
    }
}
