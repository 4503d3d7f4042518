use slotmap::SlotMap;

use crate::error::TopologyError;
use crate::geometry::Elem;
use crate::math::RectAx;

slotmap::new_key_type! {
    /// Stable cursor to an element in an [`ElemList`].
    ///
    /// Stays valid across inserts and removals of other elements.
    pub struct ElemKey;
}

#[derive(Debug, Clone)]
struct Node {
    elem: Elem,
    prev: Option<ElemKey>,
    next: Option<ElemKey>,
}

/// Ordered element chain stored in an arena with index links.
///
/// Order is chain order. Keys are generational, so a key taken from this
/// list never aliases an element of another list or a removed element.
#[derive(Debug, Clone, Default)]
pub struct ElemList {
    nodes: SlotMap<ElemKey, Node>,
    head: Option<ElemKey>,
    tail: Option<ElemKey>,
}

impl ElemList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<ElemKey> {
        self.head
    }

    #[must_use]
    pub fn last(&self) -> Option<ElemKey> {
        self.tail
    }

    #[must_use]
    pub fn next(&self, key: ElemKey) -> Option<ElemKey> {
        self.nodes.get(key).and_then(|n| n.next)
    }

    #[must_use]
    pub fn prev(&self, key: ElemKey) -> Option<ElemKey> {
        self.nodes.get(key).and_then(|n| n.prev)
    }

    #[must_use]
    pub fn contains(&self, key: ElemKey) -> bool {
        self.nodes.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: ElemKey) -> Option<&Elem> {
        self.nodes.get(key).map(|n| &n.elem)
    }

    pub fn get_mut(&mut self, key: ElemKey) -> Option<&mut Elem> {
        self.nodes.get_mut(key).map(|n| &mut n.elem)
    }

    /// Returns the element at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ElemNotFound`] if `key` is not in this list.
    pub fn elem(&self, key: ElemKey) -> Result<&Elem, TopologyError> {
        self.get(key).ok_or(TopologyError::ElemNotFound)
    }

    /// Returns the element at `key` mutably.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ElemNotFound`] if `key` is not in this list.
    pub fn elem_mut(&mut self, key: ElemKey) -> Result<&mut Elem, TopologyError> {
        self.get_mut(key).ok_or(TopologyError::ElemNotFound)
    }

    /// Mutable access to two distinct elements at once.
    pub fn pair_mut(&mut self, a: ElemKey, b: ElemKey) -> Option<(&mut Elem, &mut Elem)> {
        let [na, nb] = self.nodes.get_disjoint_mut([a, b])?;
        Some((&mut na.elem, &mut nb.elem))
    }

    pub fn push_back(&mut self, elem: Elem) -> ElemKey {
        let key = self.nodes.insert(Node {
            elem,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(t) => self.link_next(t, Some(key)),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        key
    }

    pub fn push_front(&mut self, elem: Elem) -> ElemKey {
        let key = self.nodes.insert(Node {
            elem,
            prev: None,
            next: self.head,
        });
        match self.head {
            Some(h) => self.link_prev(h, Some(key)),
            None => self.tail = Some(key),
        }
        self.head = Some(key);
        key
    }

    /// Inserts `elem` right after `at`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ElemNotFound`] if `at` is not in this list.
    pub fn insert_after(&mut self, at: ElemKey, elem: Elem) -> Result<ElemKey, TopologyError> {
        let next = self.nodes.get(at).ok_or(TopologyError::ElemNotFound)?.next;
        let key = self.nodes.insert(Node {
            elem,
            prev: Some(at),
            next,
        });
        self.link_next(at, Some(key));
        match next {
            Some(n) => self.link_prev(n, Some(key)),
            None => self.tail = Some(key),
        }
        Ok(key)
    }

    /// Inserts `elem` right before `at`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ElemNotFound`] if `at` is not in this list.
    pub fn insert_before(&mut self, at: ElemKey, elem: Elem) -> Result<ElemKey, TopologyError> {
        let prev = self.nodes.get(at).ok_or(TopologyError::ElemNotFound)?.prev;
        let key = self.nodes.insert(Node {
            elem,
            prev,
            next: Some(at),
        });
        self.link_prev(at, Some(key));
        match prev {
            Some(p) => self.link_next(p, Some(key)),
            None => self.head = Some(key),
        }
        Ok(key)
    }

    /// Unlinks and returns the element at `key`.
    pub fn remove(&mut self, key: ElemKey) -> Option<Elem> {
        let node = self.nodes.remove(key)?;
        match node.prev {
            Some(p) => self.link_next(p, node.next),
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.link_prev(n, node.prev),
            None => self.tail = node.prev,
        }
        Some(node.elem)
    }

    pub fn pop_front(&mut self) -> Option<Elem> {
        self.head.and_then(|k| self.remove(k))
    }

    pub fn pop_back(&mut self) -> Option<Elem> {
        self.tail.and_then(|k| self.remove(k))
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Moves the element at `key` of `other` to the back of this list.
    ///
    /// The element is re-keyed: `key` is dead in `other` afterwards and
    /// cursors must switch to the returned key, which is only meaningful
    /// for this list.
    pub fn take_from(&mut self, other: &mut ElemList, key: ElemKey) -> Option<ElemKey> {
        other.remove(key).map(|e| self.push_back(e))
    }

    /// Moves every element of `other` to the back of this list, in order.
    pub fn append(&mut self, other: &mut ElemList) {
        while let Some(e) = other.pop_front() {
            self.push_back(e);
        }
    }

    /// Reverses the chain order and every element in it.
    pub fn reverse(&mut self) {
        for node in self.nodes.values_mut() {
            std::mem::swap(&mut node.prev, &mut node.next);
            node.elem.reverse();
        }
        std::mem::swap(&mut self.head, &mut self.tail);
    }

    /// Rotates the chain so that `key` becomes the first element.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ElemNotFound`] if `key` is not in this list.
    pub fn rotate_to(&mut self, key: ElemKey) -> Result<(), TopologyError> {
        let prev = self.nodes.get(key).ok_or(TopologyError::ElemNotFound)?.prev;
        let Some(new_tail) = prev else {
            return Ok(());
        };
        if let (Some(h), Some(t)) = (self.head, self.tail) {
            self.link_next(t, Some(h));
            self.link_prev(h, Some(t));
        }
        self.link_next(new_tail, None);
        self.link_prev(key, None);
        self.head = Some(key);
        self.tail = Some(new_tail);
        Ok(())
    }

    /// Assigns consecutive `bpar` values starting at `start`.
    ///
    /// Returns the parameter at the end of the chain.
    pub fn renumber(&mut self, start: f64) -> f64 {
        let mut par = start;
        let mut cur = self.head;
        while let Some(k) = cur {
            let Some(node) = self.nodes.get_mut(k) else {
                break;
            };
            node.elem.set_bpar(par);
            par += node.elem.plen();
            cur = node.next;
        }
        par
    }

    /// Sum of the 3D and XY lengths of all elements.
    #[must_use]
    pub fn lengths(&self) -> (f64, f64) {
        self.elems()
            .fold((0.0, 0.0), |(l, lxy), e| (l + e.len(), lxy + e.len_xy()))
    }

    /// Union of all element boxes; invalid for an empty list.
    #[must_use]
    pub fn rect(&self) -> RectAx {
        let mut r = RectAx::empty();
        for e in self.elems() {
            r.union(e.rect());
        }
        r
    }

    /// Iterates `(key, elem)` pairs in chain order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len(),
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = ElemKey> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn elems(&self) -> impl DoubleEndedIterator<Item = &Elem> + '_ {
        self.iter().map(|(_, e)| e)
    }

    /// Iterates keys from `from` (inclusive) to the end of the chain.
    pub fn keys_from(&self, from: ElemKey) -> impl Iterator<Item = ElemKey> + '_ {
        std::iter::successors(self.contains(from).then_some(from), move |&k| self.next(k))
    }

    /// Drains the list into a vector in chain order.
    #[must_use]
    pub fn into_vec(mut self) -> Vec<Elem> {
        let mut out = Vec::with_capacity(self.len());
        while let Some(e) = self.pop_front() {
            out.push(e);
        }
        out
    }

    fn link_next(&mut self, key: ElemKey, next: Option<ElemKey>) {
        if let Some(n) = self.nodes.get_mut(key) {
            n.next = next;
        }
    }

    fn link_prev(&mut self, key: ElemKey, prev: Option<ElemKey>) {
        if let Some(n) = self.nodes.get_mut(key) {
            n.prev = prev;
        }
    }
}

impl FromIterator<Elem> for ElemList {
    fn from_iter<I: IntoIterator<Item = Elem>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl Extend<Elem> for ElemList {
    fn extend<I: IntoIterator<Item = Elem>>(&mut self, iter: I) {
        for e in iter {
            self.push_back(e);
        }
    }
}

/// Double-ended iterator over an [`ElemList`] in chain order.
pub struct Iter<'a> {
    list: &'a ElemList,
    front: Option<ElemKey>,
    back: Option<ElemKey>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (ElemKey, &'a Elem);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let key = self.front?;
        let node = self.list.nodes.get(key)?;
        self.front = node.next;
        self.remaining -= 1;
        Some((key, &node.elem))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let key = self.back?;
        let node = self.list.nodes.get(key)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some((key, &node.elem))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a ElemList {
    type Item = (ElemKey, &'a Elem);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
