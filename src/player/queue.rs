use std::collections::VecDeque;

use rand::seq::SliceRandom;

use crate::common::errors::PlayerError;
use crate::protocol::tracks::Track;

/// Per-chat ordered queue of pending tracks. FIFO unless shuffled.
///
/// Owned exclusively by one session actor, which serializes all access; the
/// queue itself carries no locking. Positions in the public API are 1-based,
/// matching what users see in a queue listing.
#[derive(Debug)]
pub struct TrackQueue {
    items: VecDeque<Track>,
    max_size: usize,
}

impl TrackQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            max_size,
        }
    }

    /// Append a track. Returns its 1-based queue position.
    pub fn enqueue(&mut self, track: Track) -> Result<usize, PlayerError> {
        if self.items.len() >= self.max_size {
            return Err(PlayerError::QueueFull { max: self.max_size });
        }
        self.items.push_back(track);
        Ok(self.items.len())
    }

    /// Remove and return the head track.
    pub fn dequeue_next(&mut self) -> Result<Track, PlayerError> {
        self.items.pop_front().ok_or(PlayerError::QueueEmpty)
    }

    /// Put a track back at the head, e.g. after a failed connection attempt.
    pub fn requeue_front(&mut self, track: Track) -> Result<(), PlayerError> {
        if self.items.len() >= self.max_size {
            return Err(PlayerError::QueueFull { max: self.max_size });
        }
        self.items.push_front(track);
        Ok(())
    }

    /// Snapshot of the current order, for display.
    pub fn peek_all(&self) -> Vec<Track> {
        self.items.iter().cloned().collect()
    }

    /// Remove the track at the given 1-based position in the current order.
    /// Stale positions fail; nothing is silently reordered.
    pub fn remove_at(&mut self, position: usize) -> Result<Track, PlayerError> {
        if position == 0 || position > self.items.len() {
            return Err(PlayerError::InvalidPosition {
                position,
                len: self.items.len(),
            });
        }
        // remove() cannot fail after the bounds check above
        Ok(self.items.remove(position - 1).unwrap())
    }

    /// Move a track from one 1-based position to another.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), PlayerError> {
        let len = self.items.len();
        if from == 0 || from > len {
            return Err(PlayerError::InvalidPosition { position: from, len });
        }
        if to == 0 || to > len {
            return Err(PlayerError::InvalidPosition { position: to, len });
        }
        if from != to {
            let track = self.items.remove(from - 1).unwrap();
            self.items.insert(to - 1, track);
        }
        Ok(())
    }

    /// Randomly permute the queue. Every track stays present exactly once.
    pub fn shuffle(&mut self) {
        self.items
            .make_contiguous()
            .shuffle(&mut rand::thread_rng());
    }

    /// Empty the queue, returning how many tracks were dropped.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::UserId;
    use crate::protocol::tracks::PlayableHandle;

    fn track(id: &str) -> Track {
        Track {
            identifier: id.to_string(),
            title: format!("title-{id}"),
            duration_ms: Some(180_000),
            uri: Some(format!("https://example.org/{id}")),
            handle: PlayableHandle(format!("https://cdn.example.org/{id}.opus")),
            requested_by: UserId(7),
            enqueued_at: crate::common::types::now_ms(),
        }
    }

    fn ids(queue: &TrackQueue) -> Vec<String> {
        queue.peek_all().into_iter().map(|t| t.identifier).collect()
    }

    #[test]
    fn enqueue_preserves_insertion_order() {
        let mut queue = TrackQueue::new(10);
        for id in ["a", "b", "c"] {
            queue.enqueue(track(id)).unwrap();
        }
        assert_eq!(ids(&queue), ["a", "b", "c"]);
    }

    #[test]
    fn enqueue_returns_one_based_position() {
        let mut queue = TrackQueue::new(10);
        assert_eq!(queue.enqueue(track("a")).unwrap(), 1);
        assert_eq!(queue.enqueue(track("b")).unwrap(), 2);
    }

    #[test]
    fn enqueue_fails_when_full() {
        let mut queue = TrackQueue::new(2);
        queue.enqueue(track("a")).unwrap();
        queue.enqueue(track("b")).unwrap();
        assert_eq!(
            queue.enqueue(track("c")),
            Err(PlayerError::QueueFull { max: 2 })
        );
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn dequeue_on_empty_fails_without_mutation() {
        let mut queue = TrackQueue::new(4);
        assert_eq!(queue.dequeue_next().unwrap_err(), PlayerError::QueueEmpty);
        assert!(queue.is_empty());
        queue.enqueue(track("a")).unwrap();
        assert_eq!(queue.dequeue_next().unwrap().identifier, "a");
        assert_eq!(queue.dequeue_next().unwrap_err(), PlayerError::QueueEmpty);
    }

    #[test]
    fn remove_at_is_position_stable() {
        let mut queue = TrackQueue::new(10);
        for id in ["a", "b", "c"] {
            queue.enqueue(track(id)).unwrap();
        }
        let removed = queue.remove_at(2).unwrap();
        assert_eq!(removed.identifier, "b");
        assert_eq!(ids(&queue), ["a", "c"]);

        assert_eq!(
            queue.remove_at(5),
            Err(PlayerError::InvalidPosition { position: 5, len: 2 })
        );
        assert_eq!(ids(&queue), ["a", "c"]);
    }

    #[test]
    fn remove_at_zero_is_invalid() {
        let mut queue = TrackQueue::new(10);
        queue.enqueue(track("a")).unwrap();
        assert_eq!(
            queue.remove_at(0),
            Err(PlayerError::InvalidPosition { position: 0, len: 1 })
        );
    }

    #[test]
    fn shuffle_preserves_the_multiset() {
        let mut queue = TrackQueue::new(64);
        for i in 0..32 {
            queue.enqueue(track(&i.to_string())).unwrap();
        }
        let mut before = ids(&queue);
        queue.shuffle();
        let mut after = ids(&queue);
        assert_eq!(after.len(), 32);
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn move_item_reorders() {
        let mut queue = TrackQueue::new(10);
        for id in ["a", "b", "c", "d"] {
            queue.enqueue(track(id)).unwrap();
        }
        queue.move_item(4, 1).unwrap();
        assert_eq!(ids(&queue), ["d", "a", "b", "c"]);
        queue.move_item(2, 2).unwrap();
        assert_eq!(ids(&queue), ["d", "a", "b", "c"]);
        assert_eq!(
            queue.move_item(1, 9),
            Err(PlayerError::InvalidPosition { position: 9, len: 4 })
        );
    }

    #[test]
    fn requeue_front_puts_track_at_head() {
        let mut queue = TrackQueue::new(3);
        queue.enqueue(track("b")).unwrap();
        queue.requeue_front(track("a")).unwrap();
        assert_eq!(ids(&queue), ["a", "b"]);

        queue.enqueue(track("c")).unwrap();
        assert_eq!(
            queue.requeue_front(track("x")),
            Err(PlayerError::QueueFull { max: 3 })
        );
    }

    #[test]
    fn clear_reports_removed_count() {
        let mut queue = TrackQueue::new(10);
        for id in ["a", "b", "c"] {
            queue.enqueue(track(id)).unwrap();
        }
        assert_eq!(queue.clear(), 3);
        assert!(queue.is_empty());
        assert_eq!(queue.clear(), 0);
    }
}
