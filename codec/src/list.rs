//! Insertion-ordered doubly linked list backed by a slab.
//!
//! Nodes are addressed by [`NodeId`] handles. A handle records the slot
//! generation it was issued for, so a handle to a removed node is detected
//! and rejected instead of reading whatever now lives in its slot.

use std::fmt;
use std::iter::FusedIterator;

/// Handle to a node in a [`DList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Clone)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Clone)]
struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

/// Doubly linked list with O(1) removal by handle.
#[derive(Clone)]
pub struct DList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for DList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DList<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds `value` at the tail.
    pub fn append(&mut self, value: T) -> NodeId {
        let prev = self.tail;
        let id = self.alloc(Node {
            value,
            prev,
            next: None,
        });
        match prev {
            Some(prev) => self.set_next(prev, Some(id.index)),
            None => self.head = Some(id.index),
        }
        self.tail = Some(id.index);
        id
    }

    /// Inserts `value` in front of `at`. Returns `None` if `at` is stale.
    pub fn insert_before(&mut self, at: NodeId, value: T) -> Option<NodeId> {
        let prev = self.node(at)?.prev;
        let id = self.alloc(Node {
            value,
            prev,
            next: Some(at.index),
        });
        self.set_prev(at.index, Some(id.index));
        match prev {
            Some(prev) => self.set_next(prev, Some(id.index)),
            None => self.head = Some(id.index),
        }
        Some(id)
    }

    /// Inserts `value` after `at`. Returns `None` if `at` is stale.
    pub fn insert_after(&mut self, at: NodeId, value: T) -> Option<NodeId> {
        let next = self.node(at)?.next;
        let id = self.alloc(Node {
            value,
            prev: Some(at.index),
            next,
        });
        self.set_next(at.index, Some(id.index));
        match next {
            Some(next) => self.set_prev(next, Some(id.index)),
            None => self.tail = Some(id.index),
        }
        Some(id)
    }

    /// Unlinks the node and returns its value; the handle becomes stale.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        self.node(id)?;
        let slot = &mut self.slots[id.index];
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;

        match node.prev {
            Some(prev) => self.set_next(prev, node.next),
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.set_prev(next, node.prev),
            None => self.tail = node.prev,
        }
        Some(node.value)
    }

    /// Removes the first node.
    pub fn delete_head(&mut self) -> Option<T> {
        let head = self.head?;
        let generation = self.slots[head].generation;
        self.remove(NodeId {
            index: head,
            generation,
        })
    }

    /// Handle of the node at position `index`, walking from the head.
    #[must_use]
    pub fn find_by_index(&self, index: usize) -> Option<NodeId> {
        let mut cursor = self.head;
        for _ in 0..index {
            cursor = self.slots[cursor?].node.as_ref()?.next;
        }
        let index = cursor?;
        Some(NodeId {
            index,
            generation: self.slots[index].generation,
        })
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut().map(|node| &mut node.value)
    }

    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        self.find_by_index(0)
    }

    /// Drops every node. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index);
            }
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Values from head to tail.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node<T>> {
        let slot = self.slots.get(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn alloc(&mut self, node: Node<T>) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    fn set_next(&mut self, index: usize, next: Option<usize>) {
        if let Some(node) = self.slots[index].node.as_mut() {
            node.next = next;
        }
    }

    fn set_prev(&mut self, index: usize, prev: Option<usize>) {
        if let Some(node) = self.slots[index].node.as_mut() {
            node.prev = prev;
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for DList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for DList<T> {}

impl<T> FromIterator<T> for DList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T> Extend<T> for DList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.append(value);
        }
    }
}

impl<'a, T> IntoIterator for &'a DList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Iterator over a [`DList`] from head to tail.
pub struct Iter<'a, T> {
    list: &'a DList<T>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.list.slots.get(self.cursor?)?.node.as_ref()?;
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
