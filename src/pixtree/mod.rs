//! Pixel-indexed lookup tree keyed by secondary-catalog pixel ids.
//!
//! An unbalanced binary search tree keyed by `pixel_id - Npix/2` (the
//! half-`Npix` shift centres the key distribution around zero, which
//! balances an insert-ordered BST against HEALPix's monotonically
//! increasing pixel enumeration order). Built fresh for every match call
//! and discarded at its end; never mutated once queried.

/// A binary search tree mapping a shifted pixel key to the list of
/// secondary-catalog indices that fall in that pixel.
#[derive(Default)]
pub(crate) struct PixelTree {
    root: Option<Box<Node>>,
}

struct Node {
    key: i64,
    indices: Vec<usize>,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl PixelTree {
    pub(crate) fn new() -> Self {
        Self { root: None }
    }

    /// Appends `value_index` to the node for `key`, creating the node if
    /// it does not already exist.
    pub(crate) fn insert(&mut self, key: i64, value_index: usize) {
        Self::insert_at(&mut self.root, key, value_index);
    }

    fn insert_at(slot: &mut Option<Box<Node>>, key: i64, value_index: usize) {
        match slot {
            None => {
                *slot = Some(Box::new(Node {
                    key,
                    indices: vec![value_index],
                    left: None,
                    right: None,
                }));
            }
            Some(node) => match key.cmp(&node.key) {
                std::cmp::Ordering::Equal => node.indices.push(value_index),
                std::cmp::Ordering::Less => Self::insert_at(&mut node.left, key, value_index),
                std::cmp::Ordering::Greater => Self::insert_at(&mut node.right, key, value_index),
            },
        }
    }

    /// Looks up the index list stored at `key`, if any.
    pub(crate) fn find(&self, key: i64) -> Option<&[usize]> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            match key.cmp(&node.key) {
                std::cmp::Ordering::Equal => return Some(&node.indices),
                std::cmp::Ordering::Less => cur = node.left.as_deref(),
                std::cmp::Ordering::Greater => cur = node.right.as_deref(),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::PixelTree;

    #[test]
    fn find_on_empty_tree_is_absent() {
        let tree = PixelTree::new();
        assert!(tree.find(0).is_none());
    }

    #[test]
    fn insert_then_find_returns_all_values_in_arrival_order() {
        let mut tree = PixelTree::new();
        tree.insert(5, 1);
        tree.insert(-3, 2);
        tree.insert(5, 3);
        tree.insert(10, 4);

        assert_eq!(tree.find(5), Some([1usize, 3].as_slice()));
        assert_eq!(tree.find(-3), Some([2usize].as_slice()));
        assert_eq!(tree.find(10), Some([4usize].as_slice()));
        assert!(tree.find(7).is_none());
    }

    #[test]
    fn insert_is_stable_for_many_keys() {
        let mut tree = PixelTree::new();
        for k in -500..500 {
            tree.insert(k, k as usize);
        }
        for k in -500..500 {
            assert_eq!(tree.find(k), Some([k as usize].as_slice()));
        }
        assert!(tree.find(500).is_none());
    }
}
