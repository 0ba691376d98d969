//! Playback queue with a single movable cursor
//!
//! Pure data structure, no timing. Every mutation keeps the cursor on the
//! item that was current before the mutation, and reports listener
//! notifications as return values ([`QueueChange`]) for the controller to
//! dispatch.
//!
//! Views:
//! - previous: `entries[..cursor]`
//! - current: `entries[cursor]`
//! - next: `entries[cursor + 1..]` (all entries while the cursor is unset)

use crate::error::QueueError;
use tracing::debug;

/// Listener notification produced by a queue mutation
#[derive(Debug, Clone, PartialEq)]
pub enum QueueChange<T> {
    /// The item at the cursor is now a different item (or none)
    CurrentItemChanged {
        item: Option<T>,
        index: Option<usize>,
        previous_item: Option<T>,
        previous_index: Option<usize>,
    },

    /// Navigation resolved to the item that was already current
    SkippedToSameCurrentItem,

    /// First item(s) added to a previously empty queue
    ReceivedFirstItem,
}

/// Result of a `next`/`previous` navigation
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation<T> {
    /// Current item after navigating
    pub current: Option<T>,
    /// Notification to dispatch (None when the queue is empty)
    pub change: Option<QueueChange<T>>,
}

impl<T> Navigation<T> {
    /// Whether the cursor moved to a different index
    pub fn moved(&self) -> bool {
        matches!(self.change, Some(QueueChange::CurrentItemChanged { .. }))
    }
}

/// Ordered playlist with a cursor marking the current item
#[derive(Debug, Clone)]
pub struct Queue<T> {
    entries: Vec<T>,
    /// None until an item has been designated current
    cursor: Option<usize>,
}

impl<T: Clone> Queue<T> {
    /// Create new empty queue
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Item at the cursor
    pub fn current(&self) -> Option<&T> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    /// All entries in play order
    pub fn items(&self) -> &[T] {
        &self.entries
    }

    /// Entries before the cursor
    pub fn previous_items(&self) -> &[T] {
        match self.cursor {
            Some(c) => &self.entries[..c],
            None => &[],
        }
    }

    /// Entries after the cursor
    pub fn next_items(&self) -> &[T] {
        match self.cursor {
            Some(c) => &self.entries[c + 1..],
            None => &self.entries,
        }
    }

    /// Whether navigating forward would reach a different position
    pub fn has_next(&self, wrap: bool) -> bool {
        !self.next_items().is_empty() || (wrap && !self.entries.is_empty())
    }

    /// Swap the item at the cursor, or append and activate it if none is current
    pub fn replace_current(&mut self, item: T) -> QueueChange<T> {
        let (previous_item, previous_index) = self.snapshot();

        match self.cursor {
            Some(c) => self.entries[c] = item,
            None => {
                self.entries.push(item);
                self.cursor = Some(self.entries.len() - 1);
            }
        }

        debug!("Replaced current item at {:?}", self.cursor);
        self.current_changed(previous_item, previous_index)
    }

    /// Append items at the tail
    ///
    /// Reports `ReceivedFirstItem` when the queue was empty, so the consumer
    /// can designate a current item.
    pub fn add(&mut self, items: impl IntoIterator<Item = T>) -> Option<QueueChange<T>> {
        let was_empty = self.entries.is_empty();
        let before = self.entries.len();
        self.entries.extend(items);

        let added = self.entries.len() - before;
        debug!("Appended {} items (queue length {})", added, self.entries.len());

        (was_empty && added > 0).then_some(QueueChange::ReceivedFirstItem)
    }

    /// Insert a contiguous run at `index` (`0..=len`)
    pub fn add_at(
        &mut self,
        items: Vec<T>,
        index: usize,
    ) -> Result<Option<QueueChange<T>>, QueueError> {
        let len = self.entries.len();
        if index > len {
            return Err(QueueError::InsertOutOfRange { index, len });
        }
        if items.is_empty() {
            return Ok(None);
        }

        let count = items.len();
        self.entries.splice(index..index, items);

        if let Some(c) = self.cursor {
            if index <= c {
                self.cursor = Some(c + count);
            }
        }

        debug!("Inserted {} items at {} (cursor {:?})", count, index, self.cursor);
        Ok((len == 0).then_some(QueueChange::ReceivedFirstItem))
    }

    /// Remove the entry at `index`
    ///
    /// Removing before the cursor shifts it back. Removing the current item
    /// keeps the cursor at the same index (clamped to the new tail) and
    /// reports `CurrentItemChanged`; the cursor is unset if the queue empties.
    pub fn remove(&mut self, index: usize) -> Result<(T, Option<QueueChange<T>>), QueueError> {
        let len = self.entries.len();
        if index >= len {
            return Err(QueueError::IndexOutOfRange { index, len });
        }

        let removed = self.entries.remove(index);
        let mut change = None;

        match self.cursor {
            Some(c) if index < c => self.cursor = Some(c - 1),
            Some(c) if index == c => {
                self.cursor = if self.entries.is_empty() {
                    None
                } else {
                    Some(c.min(self.entries.len() - 1))
                };
                change = Some(self.current_changed(Some(removed.clone()), Some(c)));
            }
            _ => {}
        }

        debug!("Removed item at {} (cursor {:?})", index, self.cursor);
        Ok((removed, change))
    }

    /// Move one entry, keeping the cursor on the same logical item
    ///
    /// Bookkeeping only: no notification is produced, since the current
    /// item does not change.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), QueueError> {
        let len = self.entries.len();
        if from >= len {
            return Err(QueueError::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(QueueError::IndexOutOfRange { index: to, len });
        }
        if from == to {
            return Ok(());
        }

        let item = self.entries.remove(from);
        self.entries.insert(to, item);

        if let Some(c) = self.cursor {
            self.cursor = Some(if c == from {
                to
            } else if from < c && to >= c {
                c - 1
            } else if from > c && to <= c {
                c + 1
            } else {
                c
            });
        }

        debug!("Moved item {} -> {} (cursor {:?})", from, to, self.cursor);
        Ok(())
    }

    /// Advance the cursor by one
    ///
    /// At the tail: wraps to 0 when `wrap`, otherwise stays put and reports
    /// `SkippedToSameCurrentItem`. Empty queue: no-op.
    pub fn next(&mut self, wrap: bool) -> Navigation<T> {
        self.step(1, wrap)
    }

    /// Move the cursor back by one (mirror of [`Queue::next`])
    pub fn previous(&mut self, wrap: bool) -> Navigation<T> {
        self.step(-1, wrap)
    }

    /// Set the cursor directly
    ///
    /// Always reports `CurrentItemChanged`, even for the already-current
    /// index, so callers can force a reload.
    pub fn jump(&mut self, index: usize) -> Result<QueueChange<T>, QueueError> {
        let len = self.entries.len();
        if index >= len {
            return Err(QueueError::IndexOutOfRange { index, len });
        }

        let (previous_item, previous_index) = self.snapshot();
        self.cursor = Some(index);

        debug!("Jumped to {}", index);
        Ok(self.current_changed(previous_item, previous_index))
    }

    /// Drop everything after the cursor; returns the number of entries removed
    pub fn remove_upcoming(&mut self) -> usize {
        let keep = self.cursor.map(|c| c + 1).unwrap_or(0);
        let removed = self.entries.len().saturating_sub(keep);
        self.entries.truncate(keep);
        removed
    }

    /// Drop everything before the cursor; returns the number of entries removed
    pub fn remove_previous(&mut self) -> usize {
        match self.cursor {
            Some(c) => {
                self.entries.drain(..c);
                self.cursor = Some(0);
                c
            }
            None => 0,
        }
    }

    /// Empty the queue and unset the cursor
    ///
    /// Reports `CurrentItemChanged` (to none) if an item was current.
    pub fn clear(&mut self) -> Option<QueueChange<T>> {
        let (previous_item, previous_index) = self.snapshot();
        self.entries.clear();
        self.cursor = None;

        previous_item
            .is_some()
            .then(|| self.current_changed(previous_item, previous_index))
    }

    fn step(&mut self, direction: isize, wrap: bool) -> Navigation<T> {
        if self.entries.is_empty() {
            return Navigation {
                current: None,
                change: None,
            };
        }

        let len = self.entries.len() as isize;
        let target: isize = match self.cursor {
            // Nothing activated yet: either direction starts at the head
            None => 0,
            Some(c) => {
                let t = c as isize + direction;
                if t < 0 {
                    if wrap {
                        len - 1
                    } else {
                        0
                    }
                } else if t >= len {
                    if wrap {
                        0
                    } else {
                        len - 1
                    }
                } else {
                    t
                }
            }
        };
        let target = target as usize;

        let change = if self.cursor == Some(target) {
            QueueChange::SkippedToSameCurrentItem
        } else {
            let (previous_item, previous_index) = self.snapshot();
            self.cursor = Some(target);
            self.current_changed(previous_item, previous_index)
        };

        Navigation {
            current: self.current().cloned(),
            change: Some(change),
        }
    }

    fn snapshot(&self) -> (Option<T>, Option<usize>) {
        (self.current().cloned(), self.cursor)
    }

    fn current_changed(
        &self,
        previous_item: Option<T>,
        previous_index: Option<usize>,
    ) -> QueueChange<T> {
        QueueChange::CurrentItemChanged {
            item: self.current().cloned(),
            index: self.cursor,
            previous_item,
            previous_index,
        }
    }
}

impl<T: Clone> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_of(items: &[&'static str], cursor: Option<usize>) -> Queue<&'static str> {
        let mut queue = Queue::new();
        queue.add(items.iter().copied());
        if let Some(c) = cursor {
            queue.jump(c).unwrap();
        }
        queue
    }

    #[test]
    fn test_queue_creation() {
        let queue: Queue<u8> = Queue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
        assert!(queue.current().is_none());
        assert!(queue.next_items().is_empty());
    }

    #[test]
    fn test_add_to_empty_reports_first_item() {
        let mut queue = Queue::new();
        assert_eq!(queue.add(vec!["a"]), Some(QueueChange::ReceivedFirstItem));
        // Population alone does not activate anything
        assert_eq!(queue.current_index(), None);
        assert_eq!(queue.next_items(), &["a"]);

        assert_eq!(queue.add(vec!["b"]), None);
        assert_eq!(queue.add(Vec::new()), None);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_replace_current() {
        let mut queue = Queue::new();
        let change = queue.replace_current("a");
        assert_eq!(
            change,
            QueueChange::CurrentItemChanged {
                item: Some("a"),
                index: Some(0),
                previous_item: None,
                previous_index: None,
            }
        );

        let mut queue = queue_of(&["a", "b", "c"], Some(1));
        queue.replace_current("x");
        assert_eq!(queue.items(), &["a", "x", "c"]);
        assert_eq!(queue.current(), Some(&"x"));
    }

    #[test]
    fn test_add_at_shifts_cursor() {
        let mut queue = queue_of(&["a", "b", "c"], Some(1));

        queue.add_at(vec!["x", "y"], 1).unwrap();
        assert_eq!(queue.items(), &["a", "x", "y", "b", "c"]);
        assert_eq!(queue.current(), Some(&"b"));
        assert_eq!(queue.current_index(), Some(3));

        queue.add_at(vec!["z"], 5).unwrap();
        assert_eq!(queue.current_index(), Some(3));
        assert_eq!(queue.next_items(), &["c", "z"]);
    }

    #[test]
    fn test_add_at_out_of_range() {
        let mut queue = queue_of(&["a"], Some(0));
        assert_eq!(
            queue.add_at(vec!["b"], 2),
            Err(QueueError::InsertOutOfRange { index: 2, len: 1 })
        );
        assert_eq!(queue.items(), &["a"]);
    }

    #[test]
    fn test_remove_current_repoints_to_following_item() {
        let mut queue = queue_of(&["a", "b", "c"], Some(1));

        let (removed, change) = queue.remove(1).unwrap();
        assert_eq!(removed, "b");
        assert_eq!(queue.current(), Some(&"c"));
        assert_eq!(queue.previous_items(), &["a"]);
        assert_eq!(
            change,
            Some(QueueChange::CurrentItemChanged {
                item: Some("c"),
                index: Some(1),
                previous_item: Some("b"),
                previous_index: Some(1),
            })
        );
    }

    #[test]
    fn test_remove_current_tail_clamps_cursor() {
        let mut queue = queue_of(&["a", "b"], Some(1));
        queue.remove(1).unwrap();
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.current(), Some(&"a"));
    }

    #[test]
    fn test_remove_last_item_unsets_cursor() {
        let mut queue = queue_of(&["a"], Some(0));
        let (_, change) = queue.remove(0).unwrap();
        assert_eq!(queue.current_index(), None);
        assert!(matches!(
            change,
            Some(QueueChange::CurrentItemChanged { item: None, index: None, .. })
        ));
    }

    #[test]
    fn test_remove_before_cursor_is_silent() {
        let mut queue = queue_of(&["a", "b", "c"], Some(2));
        let (_, change) = queue.remove(0).unwrap();
        assert!(change.is_none());
        assert_eq!(queue.current(), Some(&"c"));
        assert_eq!(queue.current_index(), Some(1));

        assert_eq!(
            queue.remove(5).unwrap_err(),
            QueueError::IndexOutOfRange { index: 5, len: 2 }
        );
    }

    #[test]
    fn test_move_tracks_current_item() {
        let mut queue = queue_of(&["a", "b", "c", "d"], Some(2));

        queue.move_item(0, 3).unwrap();
        assert_eq!(queue.items(), &["b", "c", "d", "a"]);
        assert_eq!(queue.current(), Some(&"c"));

        queue.move_item(3, 0).unwrap();
        assert_eq!(queue.current(), Some(&"c"));

        queue.move_item(2, 0).unwrap();
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.current(), Some(&"c"));

        assert!(queue.move_item(0, 4).is_err());
        assert!(queue.move_item(4, 0).is_err());
    }

    #[test]
    fn test_next_without_wrap_is_idempotent_at_tail() {
        let mut queue = queue_of(&["a", "b"], Some(0));

        let nav = queue.next(false);
        assert!(nav.moved());
        assert_eq!(nav.current, Some("b"));

        for _ in 0..3 {
            let nav = queue.next(false);
            assert!(!nav.moved());
            assert_eq!(nav.change, Some(QueueChange::SkippedToSameCurrentItem));
            assert_eq!(queue.current_index(), Some(1));
        }
    }

    #[test]
    fn test_next_with_wrap() {
        let mut queue = queue_of(&["a", "b", "c"], Some(2));
        let nav = queue.next(true);
        assert!(nav.moved());
        assert_eq!(queue.current_index(), Some(0));
    }

    #[test]
    fn test_previous_wraps_to_tail() {
        let mut queue = queue_of(&["a", "b", "c"], Some(0));
        assert!(!queue.previous(false).moved());
        assert_eq!(queue.current_index(), Some(0));

        assert!(queue.previous(true).moved());
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn test_single_item_wrap_is_same_item() {
        let mut queue = queue_of(&["a"], Some(0));
        let nav = queue.next(true);
        assert_eq!(nav.change, Some(QueueChange::SkippedToSameCurrentItem));
    }

    #[test]
    fn test_navigate_empty_queue_is_noop() {
        let mut queue: Queue<u8> = Queue::new();
        let nav = queue.next(true);
        assert!(nav.current.is_none());
        assert!(nav.change.is_none());
        assert!(queue.previous(false).change.is_none());
    }

    #[test]
    fn test_jump_to_current_still_reports_change() {
        let mut queue = queue_of(&["a", "b"], Some(1));
        let change = queue.jump(1).unwrap();
        assert!(matches!(
            change,
            QueueChange::CurrentItemChanged {
                index: Some(1),
                previous_index: Some(1),
                ..
            }
        ));
        assert!(queue.jump(2).is_err());
    }

    #[test]
    fn test_remove_upcoming_and_previous() {
        let mut queue = queue_of(&["a", "b", "c", "d"], Some(1));

        assert_eq!(queue.remove_upcoming(), 2);
        assert_eq!(queue.items(), &["a", "b"]);

        assert_eq!(queue.remove_previous(), 1);
        assert_eq!(queue.items(), &["b"]);
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.current(), Some(&"b"));
    }

    #[test]
    fn test_remove_upcoming_without_cursor_empties() {
        let mut queue = queue_of(&["a", "b"], None);
        assert_eq!(queue.remove_previous(), 0);
        assert_eq!(queue.remove_upcoming(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut queue = queue_of(&["a", "b"], Some(0));
        assert!(matches!(
            queue.clear(),
            Some(QueueChange::CurrentItemChanged { item: None, previous_item: Some("a"), .. })
        ));
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
        assert!(queue.clear().is_none());
    }
}
