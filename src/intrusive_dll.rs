//! Index-based doubly-linked list.
//!
//! Nodes live in a caller-owned slice and carry their own `prev`/`next`
//! indices through [`IntrusiveNode`]. The list itself only tracks the head
//! and tail. Head is the most recently inserted node, tail the oldest.

pub(crate) trait IntrusiveNode {
    fn prev(&self) -> Option<usize>;
    fn set_prev(&mut self, prev: Option<usize>);
    fn next(&self) -> Option<usize>;
    fn set_next(&mut self, next: Option<usize>);
}

#[derive(Debug, Default)]
pub(crate) struct IntrusiveList {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl IntrusiveList {
    pub(crate) fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Link the node at `index` in front of the current head.
    pub(crate) fn insert_at_head<T: IntrusiveNode>(&mut self, nodes: &mut [T], index: usize) {
        match self.head {
            Some(head) => {
                assert!(head != index, "Invariant broken: node {index} is already the head");
                nodes[index].set_prev(None);
                nodes[index].set_next(Some(head));
                nodes[head].set_prev(Some(index));
                self.head = Some(index);
            }
            None => {
                //  ensure invariants are maintained
                assert!(self.tail.is_none());
                nodes[index].set_prev(None);
                nodes[index].set_next(None);
                self.head = Some(index);
                self.tail = Some(index);
            }
        }
        self.len += 1;
    }

    /// Link the node at `index` behind the current tail.
    pub(crate) fn push_tail<T: IntrusiveNode>(&mut self, nodes: &mut [T], index: usize) {
        match self.tail {
            Some(tail) => {
                assert!(tail != index, "Invariant broken: node {index} is already the tail");
                nodes[index].set_prev(Some(tail));
                nodes[index].set_next(None);
                nodes[tail].set_next(Some(index));
                self.tail = Some(index);
            }
            None => {
                assert!(self.head.is_none());
                nodes[index].set_prev(None);
                nodes[index].set_next(None);
                self.head = Some(index);
                self.tail = Some(index);
            }
        }
        self.len += 1;
    }

    /// Unlink the node at `index`. The node keeps its old `prev` so callers can
    /// still find where it used to sit; `next` is cleared.
    pub(crate) fn remove_node<T: IntrusiveNode>(&mut self, nodes: &mut [T], index: usize) {
        assert!(
            self.len > 0,
            "Invariant broken: removing a node from an empty list"
        );
        let prev_idx = nodes[index].prev();
        let next_idx = nodes[index].next();

        match prev_idx {
            Some(prev) => nodes[prev].set_next(next_idx),
            None => {
                assert_eq!(self.head, Some(index), "Invariant broken: only the head has no prev");
                self.head = next_idx;
            }
        }
        match next_idx {
            Some(next) => nodes[next].set_prev(prev_idx),
            None => {
                assert_eq!(self.tail, Some(index), "Invariant broken: only the tail has no next");
                self.tail = prev_idx;
            }
        }
        nodes[index].set_next(None);
        self.len -= 1;
    }

    /// Get the index of the node at the tail
    pub(crate) fn peek_tail(&self) -> Option<usize> {
        self.tail
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Walk node indices from head to tail.
    pub(crate) fn iter<'a, T: IntrusiveNode>(&self, nodes: &'a [T]) -> Iter<'a, T> {
        Iter {
            nodes,
            current: self.head,
        }
    }
}

pub(crate) struct Iter<'a, T> {
    nodes: &'a [T],
    current: Option<usize>,
}

impl<T: IntrusiveNode> Iterator for Iter<'_, T> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let idx = self.current?;
        self.current = self.nodes[idx].next();
        Some(idx)
    }
}
