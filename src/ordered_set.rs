//! A set that remembers the order in which items were first inserted
//!
//! Feature matrices use the union of all keys as their columns. The column
//! order must be reproducible for the same input, so it cannot depend on
//! hashing. [`OrderedSet`] keeps the items in a `Vec` and uses a `HashMap`
//! only as the membership index.
use std::collections::HashMap;
use std::hash::Hash;

/// A set of unique items, iterated in insertion order
///
/// # Examples
///
/// ```
/// use gsd::ordered_set::OrderedSet;
///
/// let mut set = OrderedSet::new();
/// assert!(set.insert(8908u32));
/// assert!(set.insert(2998u32));
/// assert!(!set.insert(8908u32));
///
/// let items: Vec<u32> = set.iter().copied().collect();
/// assert_eq!(items, vec![8908, 2998]);
/// assert_eq!(set.index_of(&2998), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct OrderedSet<T> {
    items: Vec<T>,
    index: HashMap<T, usize>,
}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    /// Constructs a new, empty [`OrderedSet`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a new, empty [`OrderedSet`] with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Returns `true` if the set contains no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items in the set
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Adds an item to the end of the set
    ///
    /// Returns whether the item was newly inserted. That is:
    ///
    /// - If the set did not previously contain the item, true is returned.
    /// - If the set already contained the item, false is returned and
    ///   the original position is kept.
    pub fn insert(&mut self, item: T) -> bool {
        if self.index.contains_key(&item) {
            return false;
        }
        self.index.insert(item.clone(), self.items.len());
        self.items.push(item);
        true
    }

    /// Returns `true` if the set contains the item
    pub fn contains(&self, item: &T) -> bool {
        self.index.contains_key(item)
    }

    /// Returns the insertion position of the item
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.index.get(item).copied()
    }

    /// Returns the item at the given position
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Returns an iterator of the items in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Returns the items as a slice, in insertion order
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Returns the number of items that are present in both sets
    pub fn intersection_len(&self, other: &OrderedSet<T>) -> usize {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().filter(|item| large.contains(item)).count()
    }

    /// Returns a new set with all items of `self`, followed by
    /// the items of `other` that are not yet present
    #[must_use]
    pub fn union(&self, other: &OrderedSet<T>) -> OrderedSet<T> {
        let mut res = self.clone();
        res.extend(other.iter().cloned());
        res
    }
}

/// Two sets are equal if they contain the same items, regardless of order
impl<T: Eq + Hash + Clone> PartialEq for OrderedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|item| other.contains(item))
    }
}

impl<T: Eq + Hash + Clone> Eq for OrderedSet<T> {}

impl<T: Eq + Hash + Clone> Extend<T> for OrderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = OrderedSet::new();
        set.extend(iter);
        set
    }
}

impl<'a, T> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> IntoIterator for OrderedSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
