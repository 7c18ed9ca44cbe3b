use std::borrow::Borrow;
use std::cmp::{self, Ordering};

use log::{debug, trace};

mod arena;

use arena::Arena;

#[cfg(any(test, feature = "consistency_check"))]
use crate::error::ConsistencyError;

pub(crate) type Link = Option<usize>;

pub(crate) struct Node<T> {
    pub(crate) key: T,
    pub(crate) height: usize,
    pub(crate) left: Link,
    pub(crate) right: Link,
    pub(crate) parent: Link,
}

impl<T> Node<T> {
    pub(crate) fn new(key: T) -> Self {
        Self {
            key,
            height: 1,
            left: None,
            right: None,
            parent: None,
        }
    }
}

/// AVL tree with parent links, stored in an index arena.
///
/// Mutations are recursive: each step returns the (possibly new) root of the
/// subtree it was handed and the caller links it back into its own slot.
pub(crate) struct Tree<T> {
    arena: Arena<T>,
    root: Link,
    num_nodes: usize,
}

#[allow(clippy::enum_variant_names)]
#[cfg(any(test, feature = "consistency_check"))]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<T> Tree<T> {
    pub(crate) fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            num_nodes: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.num_nodes
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> Link {
        self.root
    }

    #[cfg(test)]
    pub(crate) fn height(&self) -> usize {
        self.height_of(self.root)
    }

    pub(crate) fn clear(&mut self) {
        debug!("clearing tree of {} nodes", self.num_nodes);
        self.arena.clear();
        self.root = None;
        self.num_nodes = 0;
    }

    pub(crate) fn key(&self, index: usize) -> &T {
        &self.arena.get(index).key
    }

    pub(crate) fn generation(&self, index: usize) -> u32 {
        self.arena.generation(index)
    }

    pub(crate) fn is_live(&self, index: usize, generation: u32) -> bool {
        self.arena.is_live(index, generation)
    }

    fn node(&self, index: usize) -> &Node<T> {
        self.arena.get(index)
    }

    fn node_mut(&mut self, index: usize) -> &mut Node<T> {
        self.arena.get_mut(index)
    }

    fn set_left(&mut self, index: usize, child: Link) {
        self.node_mut(index).left = child;
        if let Some(child) = child {
            self.node_mut(child).parent = Some(index);
        }
    }

    fn set_right(&mut self, index: usize, child: Link) {
        self.node_mut(index).right = child;
        if let Some(child) = child {
            self.node_mut(child).parent = Some(index);
        }
    }

    fn set_root(&mut self, root: Link) {
        self.root = root;
        if let Some(root) = root {
            self.node_mut(root).parent = None;
        }
    }

    // Balancing engine

    fn height_of(&self, link: Link) -> usize {
        match link {
            None => 0,
            Some(index) => self.node(index).height,
        }
    }

    fn adjust_height(&mut self, index: usize) {
        let node = self.node(index);
        let height = 1 + cmp::max(self.height_of(node.left), self.height_of(node.right));
        self.node_mut(index).height = height;
    }

    fn balance_factor(&self, index: usize) -> isize {
        let node = self.node(index);
        self.height_of(node.right) as isize - self.height_of(node.left) as isize
    }

    // Promotes the right child. Only the heights of the old and the new
    // subtree root change.
    fn rotate_left(&mut self, index: usize) -> usize {
        let Some(right) = self.node(index).right else {
            return index;
        };
        trace!("rotate left at slot {}", index);
        let parent = self.node(index).parent;

        let right_left = self.node(right).left;
        self.set_right(index, right_left);

        self.set_left(right, Some(index));
        self.node_mut(right).parent = parent;

        self.adjust_height(index);
        self.adjust_height(right);
        right
    }

    fn rotate_right(&mut self, index: usize) -> usize {
        let Some(left) = self.node(index).left else {
            return index;
        };
        trace!("rotate right at slot {}", index);
        let parent = self.node(index).parent;

        let left_right = self.node(left).right;
        self.set_left(index, left_right);

        self.set_right(left, Some(index));
        self.node_mut(left).parent = parent;

        self.adjust_height(index);
        self.adjust_height(left);
        left
    }

    // Restores the AVL condition at a node whose children are balanced.
    // Returns the new root of the subtree.
    fn balance_node(&mut self, index: usize) -> usize {
        self.adjust_height(index);
        let balance = self.balance_factor(index);
        if balance >= 2 {
            trace!("slot {} is right heavy ({}), rebalancing", index, balance);
            if let Some(right) = self.node(index).right {
                let right_node = self.node(right);
                if self.height_of(right_node.left) > self.height_of(right_node.right) {
                    let new_right = self.rotate_right(right);
                    self.set_right(index, Some(new_right));
                }
            }
            self.rotate_left(index)
        } else if balance <= -2 {
            trace!("slot {} is left heavy ({}), rebalancing", index, balance);
            if let Some(left) = self.node(index).left {
                let left_node = self.node(left);
                if self.height_of(left_node.right) > self.height_of(left_node.left) {
                    let new_left = self.rotate_left(left);
                    self.set_left(index, Some(new_left));
                }
            }
            self.rotate_right(index)
        } else {
            index
        }
    }

    // Navigation

    fn find_min(&self, mut index: usize) -> usize {
        while let Some(left) = self.node(index).left {
            index = left;
        }
        index
    }

    fn find_max(&self, mut index: usize) -> usize {
        while let Some(right) = self.node(index).right {
            index = right;
        }
        index
    }

    pub(crate) fn first(&self) -> Link {
        self.root.map(|root| self.find_min(root))
    }

    pub(crate) fn last(&self) -> Link {
        self.root.map(|root| self.find_max(root))
    }

    /// In-order successor, or `None` past the maximum.
    pub(crate) fn next_node(&self, index: usize) -> Link {
        if let Some(right) = self.node(index).right {
            return Some(self.find_min(right));
        }
        let mut child = index;
        let mut current = self.node(index).parent;
        while let Some(parent) = current {
            if self.node(parent).left == Some(child) {
                return Some(parent);
            }
            child = parent;
            current = self.node(parent).parent;
        }
        None
    }

    /// In-order predecessor, or `None` before the minimum.
    pub(crate) fn prev_node(&self, index: usize) -> Link {
        if let Some(left) = self.node(index).left {
            return Some(self.find_max(left));
        }
        let mut child = index;
        let mut current = self.node(index).parent;
        while let Some(parent) = current {
            if self.node(parent).right == Some(child) {
                return Some(parent);
            }
            child = parent;
            current = self.node(parent).parent;
        }
        None
    }

    // Min/max extraction. The extracted node stays allocated and unlinked;
    // the caller either frees it or splices it elsewhere.

    fn remove_min(&mut self, index: usize) -> Link {
        match self.node(index).left {
            None => self.node(index).right,
            Some(left) => {
                let new_left = self.remove_min(left);
                self.set_left(index, new_left);
                Some(self.balance_node(index))
            }
        }
    }

    fn remove_max(&mut self, index: usize) -> Link {
        match self.node(index).right {
            None => self.node(index).left,
            Some(right) => {
                let new_right = self.remove_max(right);
                self.set_right(index, new_right);
                Some(self.balance_node(index))
            }
        }
    }

    pub(crate) fn pop_first(&mut self) -> Option<T> {
        let root = self.root?;
        let min = self.find_min(root);
        let new_root = self.remove_min(root);
        self.set_root(new_root);
        self.num_nodes -= 1;
        Some(self.arena.free(min).key)
    }

    pub(crate) fn pop_last(&mut self) -> Option<T> {
        let root = self.root?;
        let max = self.find_max(root);
        let new_root = self.remove_max(root);
        self.set_root(new_root);
        self.num_nodes -= 1;
        Some(self.arena.free(max).key)
    }

    #[cfg(any(test, feature = "consistency_check"))]
    pub(crate) fn validate(&self) -> Result<(), ConsistencyError>
    where
        T: Ord,
    {
        if let Some(root) = self.root {
            if self.node(root).parent.is_some() {
                return Err(ConsistencyError::RootHasParent);
            }
        }

        let mut result = Ok(());
        let mut num_nodes = 0;
        self.preorder(|index| {
            if result.is_err() {
                return;
            }
            result = self.validate_node(index);
            num_nodes += 1;
        });
        result?;

        if num_nodes != self.num_nodes || num_nodes != self.arena.len() {
            return Err(ConsistencyError::LengthMismatch {
                counted: num_nodes,
                recorded: self.num_nodes,
            });
        }
        Ok(())
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn validate_node(&self, index: usize) -> Result<(), ConsistencyError>
    where
        T: Ord,
    {
        let node = self.node(index);

        // Check link for left child node
        if let Some(left) = node.left {
            if self.node(left).parent != Some(index) {
                return Err(ConsistencyError::BrokenParentLink { slot: left });
            }
            if self.node(left).key >= node.key {
                return Err(ConsistencyError::OrderViolation { slot: index });
            }
        }

        // Check link for right child node
        if let Some(right) = node.right {
            if self.node(right).parent != Some(index) {
                return Err(ConsistencyError::BrokenParentLink { slot: right });
            }
            if self.node(right).key <= node.key {
                return Err(ConsistencyError::OrderViolation { slot: index });
            }
        }

        // Check height
        let left_height = self.height_of(node.left);
        let right_height = self.height_of(node.right);
        let expected = 1 + cmp::max(left_height, right_height);
        if node.height != expected {
            return Err(ConsistencyError::WrongHeight {
                slot: index,
                stored: node.height,
                expected,
            });
        }

        // Check AVL condition (nearly balance)
        if left_height > right_height + 1 || right_height > left_height + 1 {
            return Err(ConsistencyError::Unbalanced {
                slot: index,
                left_height,
                right_height,
            });
        }
        Ok(())
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn preorder<F: FnMut(usize)>(&self, mut f: F) {
        let Some(mut index) = self.root else {
            return;
        };
        let mut dir = Direction::FromParent;
        loop {
            match dir {
                Direction::FromParent => {
                    f(index);
                    if let Some(left) = self.node(index).left {
                        index = left;
                    } else {
                        dir = Direction::FromLeft;
                    }
                }
                Direction::FromLeft => {
                    if let Some(right) = self.node(index).right {
                        index = right;
                        dir = Direction::FromParent;
                    } else {
                        dir = Direction::FromRight;
                    }
                }
                Direction::FromRight => match self.node(index).parent {
                    Some(parent) => {
                        if self.node(parent).left == Some(index) {
                            dir = Direction::FromLeft;
                        }
                        index = parent;
                    }
                    None => break,
                },
            }
        }
    }
}

impl<T: Ord> Tree<T> {
    /// Returns whether the key was new. An equal key already present is kept
    /// and the incoming one is dropped.
    pub(crate) fn insert(&mut self, key: T) -> bool {
        let mut inserted = false;
        let new_root = self.insert_node(self.root, key, &mut inserted);
        self.set_root(Some(new_root));
        inserted
    }

    fn insert_node(&mut self, link: Link, key: T, inserted: &mut bool) -> usize {
        let Some(index) = link else {
            self.num_nodes += 1;
            *inserted = true;
            return self.arena.alloc(Node::new(key));
        };
        match key.cmp(&self.node(index).key) {
            Ordering::Less => {
                let left = self.node(index).left;
                let new_left = self.insert_node(left, key, inserted);
                self.set_left(index, Some(new_left));
            }
            Ordering::Greater => {
                let right = self.node(index).right;
                let new_right = self.insert_node(right, key, inserted);
                self.set_right(index, Some(new_right));
            }
            Ordering::Equal => return index,
        }
        self.balance_node(index)
    }

    /// Removes the node holding a key equal to `key` and returns its key.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut removed = None;
        let new_root = self.remove_node(self.root, key, &mut removed);
        self.set_root(new_root);
        removed
    }

    fn remove_node<Q>(&mut self, link: Link, key: &Q, removed: &mut Option<T>) -> Link
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let index = link?;
        match key.cmp(self.node(index).key.borrow()) {
            Ordering::Less => {
                let left = self.node(index).left;
                let new_left = self.remove_node(left, key, removed);
                self.set_left(index, new_left);
                Some(self.balance_node(index))
            }
            Ordering::Greater => {
                let right = self.node(index).right;
                let new_right = self.remove_node(right, key, removed);
                self.set_right(index, new_right);
                Some(self.balance_node(index))
            }
            Ordering::Equal => {
                debug_assert!(self.num_nodes >= 1);
                self.num_nodes -= 1;
                let node = self.arena.free(index);
                *removed = Some(node.key);
                match node.right {
                    None => {
                        if let Some(left) = node.left {
                            self.node_mut(left).parent = node.parent;
                        }
                        node.left
                    }
                    Some(right) => {
                        // Splice the in-order successor into the freed position
                        let successor = self.find_min(right);
                        let new_right = self.remove_min(right);
                        self.set_right(successor, new_right);
                        self.set_left(successor, node.left);
                        self.node_mut(successor).parent = node.parent;
                        Some(self.balance_node(successor))
                    }
                }
            }
        }
    }

    /// Smallest key not less than `key`.
    pub(crate) fn lower_bound<Q>(&self, key: &Q) -> Link
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lower_bound_node(self.root, key)
    }

    fn lower_bound_node<Q>(&self, link: Link, key: &Q) -> Link
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let index = link?;
        let node = self.node(index);
        match node.key.borrow().cmp(key) {
            Ordering::Less => self.lower_bound_node(node.right, key),
            Ordering::Greater => self.lower_bound_node(node.left, key).or(Some(index)),
            Ordering::Equal => Some(index),
        }
    }

    /// Node holding a key equal to `key`.
    pub(crate) fn find<Q>(&self, key: &Q) -> Link
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lower_bound(key)
            .filter(|&index| self.node(index).key.borrow().cmp(key) == Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::Tree;

    fn shape(tree: &Tree<i32>, link: super::Link) -> String {
        match link {
            None => ".".to_string(),
            Some(index) => {
                let node = tree.node(index);
                if node.left.is_none() && node.right.is_none() {
                    node.key.to_string()
                } else {
                    format!(
                        "({} {} {})",
                        shape(tree, node.left),
                        node.key,
                        shape(tree, node.right)
                    )
                }
            }
        }
    }

    #[test]
    fn test_rotations_touch_two_heights() {
        //   2              4
        //  / \            / \
        // 1   4    ->    2   5
        //    / \        / \   \
        //   3   5      1   3   6
        //        \
        //         6
        let mut tree = Tree::new();
        for key in [2, 1, 4, 3, 5, 6] {
            tree.insert(key);
        }
        tree.validate().unwrap();
        assert_eq!(shape(&tree, tree.root()), "((1 2 3) 4 (. 5 6))");
        assert_eq!(tree.height(), 3);
    }

    #[test]
    fn test_double_rotation_right_left() {
        // 1            2
        //  \          / \
        //   3   ->   1   3
        //  /
        // 2
        let mut tree = Tree::new();
        for key in [1, 3, 2] {
            tree.insert(key);
        }
        tree.validate().unwrap();
        assert_eq!(shape(&tree, tree.root()), "(1 2 3)");
    }

    #[test]
    fn test_double_rotation_left_right() {
        //   3          2
        //  /          / \
        // 1     ->   1   3
        //  \
        //   2
        let mut tree = Tree::new();
        for key in [3, 1, 2] {
            tree.insert(key);
        }
        tree.validate().unwrap();
        assert_eq!(shape(&tree, tree.root()), "(1 2 3)");
    }

    #[test]
    fn test_remove_splices_successor() {
        let mut tree = Tree::new();
        for key in [5, 3, 8, 1, 4, 7, 9] {
            tree.insert(key);
        }
        assert_eq!(shape(&tree, tree.root()), "((1 3 4) 5 (7 8 9))");
        assert_eq!(tree.remove(&5), Some(5));
        tree.validate().unwrap();
        assert_eq!(shape(&tree, tree.root()), "((1 3 4) 7 (. 8 9))");
        assert_eq!(tree.remove(&5), None);
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_neighbours() {
        let mut tree = Tree::new();
        for key in 0..32 {
            tree.insert(key * 2);
        }
        let mut link = tree.first();
        let mut expected = 0;
        while let Some(index) = link {
            assert_eq!(*tree.key(index), expected);
            expected += 2;
            link = tree.next_node(index);
        }
        assert_eq!(expected, 64);

        let mut link = tree.last();
        while let Some(index) = link {
            expected -= 2;
            assert_eq!(*tree.key(index), expected);
            link = tree.prev_node(index);
        }
        assert_eq!(expected, 0);
    }

    #[test]
    fn test_lower_bound_and_find() {
        let mut tree = Tree::new();
        for key in [10, 20, 30, 40] {
            tree.insert(key);
        }
        let key_at = |link: super::Link| link.map(|index| *tree.key(index));
        assert_eq!(key_at(tree.lower_bound(&5)), Some(10));
        assert_eq!(key_at(tree.lower_bound(&20)), Some(20));
        assert_eq!(key_at(tree.lower_bound(&21)), Some(30));
        assert_eq!(key_at(tree.lower_bound(&41)), None);
        assert_eq!(key_at(tree.find(&30)), Some(30));
        assert_eq!(key_at(tree.find(&31)), None);
    }

    #[test]
    fn test_pop_extremes() {
        let mut tree = Tree::new();
        for key in [4, 2, 6, 1, 3, 5, 7] {
            tree.insert(key);
        }
        assert_eq!(tree.pop_first(), Some(1));
        assert_eq!(tree.pop_last(), Some(7));
        tree.validate().unwrap();
        assert_eq!(tree.len(), 5);
        while tree.pop_first().is_some() {
            tree.validate().unwrap();
        }
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.pop_last(), None);
    }
}
