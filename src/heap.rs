//! Bounded top-K match accumulator.
//!
//! A min-heap on `cosdist`: the root is the *smallest* cosdist, i.e. the
//! farthest accepted match, so a new candidate is tested against the root
//! in O(1) and the worst match is evicted in O(log K). This is the
//! counter-intuitive direction — "closer" means *larger* cosdist, so the
//! heap invariant points the opposite way from a typical max-heap.

/// A single accepted match against one primary catalog entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchCandidate {
    /// Index into the secondary catalog.
    pub input_ind: usize,
    /// Cosine of the angular separation between the primary and secondary points.
    pub cosdist: f64,
}

/// Per-entry match buffer, switching between unbounded append and a
/// capacity-`maxmatch` min-heap once it fills.
#[derive(Debug)]
pub(crate) struct MatchBuffer {
    maxmatch: usize,
    items: Vec<MatchCandidate>,
    heapified: bool,
}

impl MatchBuffer {
    /// Creates an empty buffer. `maxmatch == 0` means unbounded.
    pub(crate) fn new(maxmatch: usize) -> Self {
        let mut items = Vec::new();
        if maxmatch >= 1 {
            items.reserve_exact(maxmatch);
        }
        Self {
            maxmatch,
            items,
            heapified: false,
        }
    }

    /// Resets the buffer for reuse on a subsequent match call, keeping the
    /// capacity reservation for bounded mode.
    pub(crate) fn reset(&mut self) {
        self.items.clear();
        self.heapified = false;
    }

    /// Reconfigures the buffer for a new `maxmatch`, clearing any prior
    /// contents. Grows the reservation if the new capacity is larger; never
    /// shrinks it, so repeated match calls at a stable `maxmatch` never
    /// reallocate.
    pub(crate) fn configure(&mut self, maxmatch: usize) {
        self.maxmatch = maxmatch;
        self.items.clear();
        self.heapified = false;
        if maxmatch >= 1 && self.items.capacity() < maxmatch {
            let additional = maxmatch - self.items.capacity();
            self.items.reserve_exact(additional);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn as_slice(&self) -> &[MatchCandidate] {
        &self.items
    }

    /// Drains every accepted match out of the buffer, leaving it empty.
    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, MatchCandidate> {
        self.heapified = false;
        self.items.drain(..)
    }

    /// Offers a candidate to the buffer. Returns `true` if the candidate was
    /// newly accepted (appended or admitted past the heap root); `false` if
    /// it was rejected by a full bounded buffer.
    pub(crate) fn offer(&mut self, candidate: MatchCandidate) -> bool {
        let unbounded = self.maxmatch == 0;
        if unbounded || self.items.len() < self.maxmatch {
            self.items.push(candidate);
            if !unbounded && self.items.len() == self.maxmatch && self.maxmatch > 1 {
                build_heap(&mut self.items);
                self.heapified = true;
            }
            return true;
        }

        if self.maxmatch == 1 {
            // Degenerate heap: keep the larger of the two cosdists.
            if candidate.cosdist > self.items[0].cosdist {
                self.items[0] = candidate;
                return true;
            }
            return false;
        }

        debug_assert!(self.heapified);
        heap_try_insert(&mut self.items, candidate)
    }
}

/// Turns a filled slice of size `K` into a min-heap on `cosdist`. Cost `O(K)`.
pub(crate) fn build_heap(items: &mut [MatchCandidate]) {
    if items.len() < 2 {
        return;
    }
    for start in (0..items.len() / 2).rev() {
        sift_down(items, start);
    }
}

/// If `candidate` is strictly closer than the current root, replaces the
/// root and restores the heap invariant. Returns whether it was admitted.
pub(crate) fn heap_try_insert(items: &mut [MatchCandidate], candidate: MatchCandidate) -> bool {
    if items.is_empty() || candidate.cosdist <= items[0].cosdist {
        return false;
    }
    items[0] = candidate;
    sift_down(items, 0);
    true
}

/// Restores the min-heap invariant below `start`, picking the child with
/// the smaller `cosdist` at each step.
fn sift_down(items: &mut [MatchCandidate], start: usize) {
    let len = items.len();
    let mut root = start;
    loop {
        let left = 2 * root + 1;
        let right = left + 1;
        let mut smallest = root;
        if left < len && items[left].cosdist < items[smallest].cosdist {
            smallest = left;
        }
        if right < len && items[right].cosdist < items[smallest].cosdist {
            smallest = right;
        }
        if smallest == root {
            break;
        }
        items.swap(root, smallest);
        root = smallest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(input_ind: usize, cosdist: f64) -> MatchCandidate {
        MatchCandidate { input_ind, cosdist }
    }

    fn is_min_heap(items: &[MatchCandidate]) -> bool {
        for i in 0..items.len() {
            let left = 2 * i + 1;
            let right = left + 1;
            if left < items.len() && items[left].cosdist < items[i].cosdist {
                return false;
            }
            if right < items.len() && items[right].cosdist < items[i].cosdist {
                return false;
            }
        }
        true
    }

    #[test]
    fn build_heap_produces_valid_heap() {
        let mut items = vec![
            cand(0, 0.1),
            cand(1, 0.9),
            cand(2, 0.4),
            cand(3, 0.2),
            cand(4, 0.8),
        ];
        build_heap(&mut items);
        assert!(is_min_heap(&items));
    }

    #[test]
    fn heap_try_insert_rejects_farther_candidate() {
        let mut items = vec![cand(0, 0.5), cand(1, 0.9), cand(2, 0.7)];
        build_heap(&mut items);
        let root_before = items[0];
        let admitted = heap_try_insert(&mut items, cand(9, 0.3));
        assert!(!admitted);
        assert_eq!(items[0], root_before);
    }

    #[test]
    fn heap_try_insert_admits_closer_candidate_and_restores_invariant() {
        let mut items = vec![cand(0, 0.5), cand(1, 0.9), cand(2, 0.7)];
        build_heap(&mut items);
        let admitted = heap_try_insert(&mut items, cand(9, 0.95));
        assert!(admitted);
        assert!(is_min_heap(&items));
        assert!(items.iter().any(|c| c.input_ind == 9));
        assert!(!items.iter().any(|c| c.cosdist == 0.5));
    }

    #[test]
    fn heap_try_insert_ties_keep_incumbent() {
        let mut items = vec![cand(0, 0.5), cand(1, 0.9)];
        build_heap(&mut items);
        let admitted = heap_try_insert(&mut items, cand(9, 0.5));
        assert!(!admitted);
    }

    #[test]
    fn buffer_unbounded_appends_everything() {
        let mut buf = MatchBuffer::new(0);
        for i in 0..10 {
            assert!(buf.offer(cand(i, i as f64 / 10.0)));
        }
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn buffer_bounded_keeps_top_k_by_cosdist() {
        let mut buf = MatchBuffer::new(2);
        assert!(buf.offer(cand(0, 0.99)));
        assert!(buf.offer(cand(1, 0.95)));
        // buffer now at capacity and heapified (root is 0.95)
        assert!(!buf.offer(cand(2, 0.90))); // farther than both, rejected
        assert!(buf.offer(cand(3, 0.97))); // closer than the root (0.95), admitted
        assert_eq!(buf.len(), 2);
        let mut cosdists: Vec<f64> = buf.as_slice().iter().map(|c| c.cosdist).collect();
        cosdists.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(cosdists, vec![0.97, 0.99]);
    }

    #[test]
    fn buffer_degenerate_k1_keeps_closest() {
        let mut buf = MatchBuffer::new(1);
        assert!(buf.offer(cand(0, 0.5)));
        assert!(!buf.offer(cand(1, 0.4)));
        assert!(buf.offer(cand(2, 0.6)));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.as_slice()[0].cosdist, 0.6);
    }

    #[test]
    fn configure_switches_capacity_and_clears_contents() {
        let mut buf = MatchBuffer::new(0);
        buf.offer(cand(0, 0.1));
        buf.offer(cand(1, 0.2));
        buf.configure(1);
        assert!(buf.is_empty());
        assert!(buf.offer(cand(2, 0.3)));
        assert!(!buf.offer(cand(3, 0.1)));
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn reset_clears_buffer_but_keeps_capacity_mode() {
        let mut buf = MatchBuffer::new(2);
        buf.offer(cand(0, 0.1));
        buf.offer(cand(1, 0.2));
        buf.offer(cand(2, 0.3));
        assert_eq!(buf.len(), 2);
        buf.reset();
        assert!(buf.is_empty());
        assert!(buf.offer(cand(3, 0.05)));
        assert_eq!(buf.len(), 1);
    }
}
