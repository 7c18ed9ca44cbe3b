//! Slot storage for tree nodes.
//!
//! Nodes are addressed by index. Each slot carries a generation counter which
//! is bumped whenever the slot is vacated, so an `(index, generation)` pair
//! names exactly one node for its whole lifetime.

use std::mem;

use super::Node;

enum Slot<T> {
    Occupied { generation: u32, node: Node<T> },
    Vacant { generation: u32, next_free: Option<usize> },
}

pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    num_occupied: usize,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            num_occupied: 0,
        }
    }

    #[cfg(any(test, feature = "consistency_check"))]
    pub(crate) fn len(&self) -> usize {
        self.num_occupied
    }

    pub(crate) fn alloc(&mut self, node: Node<T>) -> usize {
        self.num_occupied += 1;
        match self.free_head {
            Some(index) => {
                let slot = &mut self.slots[index];
                let generation = match *slot {
                    Slot::Vacant {
                        generation,
                        next_free,
                    } => {
                        self.free_head = next_free;
                        generation
                    }
                    Slot::Occupied { .. } => unreachable!("free list points at occupied slot"),
                };
                *slot = Slot::Occupied { generation, node };
                index
            }
            None => {
                self.slots.push(Slot::Occupied {
                    generation: 0,
                    node,
                });
                self.slots.len() - 1
            }
        }
    }

    /// Vacates the slot and hands back the node it held.
    pub(crate) fn free(&mut self, index: usize) -> Node<T> {
        let generation = self.generation(index);
        let vacant = Slot::Vacant {
            generation: generation.wrapping_add(1),
            next_free: self.free_head,
        };
        match mem::replace(&mut self.slots[index], vacant) {
            Slot::Occupied { node, .. } => {
                self.free_head = Some(index);
                self.num_occupied -= 1;
                node
            }
            Slot::Vacant { .. } => unreachable!("freeing vacant slot {}", index),
        }
    }

    /// Vacates every occupied slot in one linear pass.
    pub(crate) fn clear(&mut self) {
        let mut free_head = None;
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            let generation = match *slot {
                Slot::Occupied { generation, .. } => generation.wrapping_add(1),
                Slot::Vacant { generation, .. } => generation,
            };
            *slot = Slot::Vacant {
                generation,
                next_free: free_head,
            };
            free_head = Some(index);
        }
        self.free_head = free_head;
        self.num_occupied = 0;
    }

    pub(crate) fn generation(&self, index: usize) -> u32 {
        match self.slots[index] {
            Slot::Occupied { generation, .. } | Slot::Vacant { generation, .. } => generation,
        }
    }

    pub(crate) fn is_live(&self, index: usize, generation: u32) -> bool {
        matches!(
            self.slots.get(index),
            Some(Slot::Occupied { generation: g, .. }) if *g == generation
        )
    }

    pub(crate) fn get(&self, index: usize) -> &Node<T> {
        match &self.slots[index] {
            Slot::Occupied { node, .. } => node,
            Slot::Vacant { .. } => unreachable!("dangling link to slot {}", index),
        }
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> &mut Node<T> {
        match &mut self.slots[index] {
            Slot::Occupied { node, .. } => node,
            Slot::Vacant { .. } => unreachable!("dangling link to slot {}", index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Arena, Node};

    #[test]
    fn test_reuse_bumps_generation() {
        let mut arena = Arena::new();
        let a = arena.alloc(Node::new(1));
        let b = arena.alloc(Node::new(2));
        assert_eq!(arena.len(), 2);
        let gen_a = arena.generation(a);
        assert!(arena.is_live(a, gen_a));

        assert_eq!(arena.free(a).key, 1);
        assert!(!arena.is_live(a, gen_a));
        assert_eq!(arena.len(), 1);

        let c = arena.alloc(Node::new(3));
        assert_eq!(c, a);
        assert_ne!(arena.generation(c), gen_a);
        assert!(!arena.is_live(a, gen_a));
        assert_eq!(arena.get(c).key, 3);
        assert_eq!(arena.get(b).key, 2);
    }

    #[test]
    fn test_clear_invalidates_all() {
        let mut arena = Arena::new();
        let ids: Vec<(usize, u32)> = (0..10)
            .map(|k| {
                let index = arena.alloc(Node::new(k));
                (index, arena.generation(index))
            })
            .collect();
        arena.free(ids[3].0);
        arena.clear();
        assert_eq!(arena.len(), 0);
        for (index, generation) in ids {
            assert!(!arena.is_live(index, generation));
        }

        // Slots are recycled front to back after a clear
        let index = arena.alloc(Node::new(42));
        assert_eq!(index, 0);
        assert_eq!(arena.len(), 1);
    }
}
