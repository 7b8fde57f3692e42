//! Arena of singly linked lists.
//!
//! Lists are plain `(head, tail)` index pairs into one growable vector, so
//! creating, splitting and concatenating lists never copies elements. Index 0
//! is reserved as the null link. Records are never freed or reused while the
//! pool lives, which keeps a list valid after another list sharing its tail
//! has been split off or appended to.

/// Handle to a list stored in a [`ListPool`]. The default value is the empty
/// list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct List {
    head: usize,
    tail: usize,
}

impl List {
    pub fn is_empty(&self) -> bool {
        self.head == 0
    }
}

/// Position inside a list. Remembers the tail of the list it was created
/// from, so walking stops there even if the tail record was later linked to
/// further records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
    tail: usize,
}

impl Cursor {
    pub fn is_end(&self) -> bool {
        self.index == 0
    }
}

#[derive(Debug, Clone)]
struct Record<T> {
    next: usize,
    value: T,
}

#[derive(Debug, Clone)]
pub struct ListPool<T> {
    records: Vec<Record<T>>,
}

impl<T: Copy + Default> Default for ListPool<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T: Copy + Default> ListPool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut records = Vec::with_capacity(capacity + 1);
        records.push(Record {
            next: 0,
            value: T::default(),
        });
        Self { records }
    }

    /// Number of records allocated so far, the null record excluded.
    pub fn allocated(&self) -> usize {
        self.records.len() - 1
    }

    /// Allocate a one-element list.
    pub fn make_list(&mut self, value: T) -> List {
        let index = self.records.len();
        self.records.push(Record { next: 0, value });
        List {
            head: index,
            tail: index,
        }
    }

    pub fn head(&self, list: List) -> Cursor {
        Cursor {
            index: list.head,
            tail: list.tail,
        }
    }

    pub fn advance(&self, cursor: Cursor) -> Cursor {
        if cursor.index == 0 || cursor.index == cursor.tail {
            return Cursor {
                index: 0,
                tail: cursor.tail,
            };
        }
        Cursor {
            index: self.records[cursor.index].next,
            tail: cursor.tail,
        }
    }

    pub fn get(&self, cursor: Cursor) -> T {
        debug_assert!(!cursor.is_end(), "dereferenced end cursor");
        self.records[cursor.index].value
    }

    pub fn get_mut(&mut self, cursor: Cursor) -> &mut T {
        debug_assert!(!cursor.is_end(), "dereferenced end cursor");
        &mut self.records[cursor.index].value
    }

    /// The part of `list` starting at `from`. An end cursor gives the empty
    /// list.
    pub fn split_tail(&self, list: List, from: Cursor) -> List {
        if from.is_end() {
            return List::default();
        }
        List {
            head: from.index,
            tail: list.tail,
        }
    }

    /// Concatenate two lists. Links the tail record of `front` to the head of
    /// `back`, so `front` must not be walked past its tail by anyone else.
    pub fn append(&mut self, front: List, back: List) -> List {
        if front.is_empty() {
            return back;
        }
        if back.is_empty() {
            return front;
        }
        self.records[front.tail].next = back.head;
        List {
            head: front.head,
            tail: back.tail,
        }
    }

    pub fn iter(&self, list: List) -> Iter<'_, T> {
        Iter {
            pool: self,
            cursor: self.head(list),
        }
    }
}

pub struct Iter<'a, T> {
    pool: &'a ListPool<T>,
    cursor: Cursor,
}

impl<T: Copy + Default> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.cursor.is_end() {
            return None;
        }
        let value = self.pool.get(self.cursor);
        self.cursor = self.pool.advance(self.cursor);
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(pool: &mut ListPool<i32>, values: &[i32]) -> List {
        values.iter().fold(List::default(), |list, value| {
            let single = pool.make_list(*value);
            pool.append(list, single)
        })
    }

    fn collect(pool: &ListPool<i32>, list: List) -> Vec<i32> {
        pool.iter(list).collect()
    }

    #[test]
    fn append_concatenates_without_copying() {
        let mut pool = ListPool::with_capacity(8);
        let a = build(&mut pool, &[1, 2, 3]);
        let b = build(&mut pool, &[4, 5]);
        let allocated = pool.allocated();
        let joined = pool.append(a, b);
        assert_eq!(collect(&pool, joined), vec![1, 2, 3, 4, 5]);
        assert_eq!(pool.allocated(), allocated);
    }

    #[test]
    fn empty_lists_are_neutral() {
        let mut pool = ListPool::default();
        let a = build(&mut pool, &[7]);
        let empty = List::default();
        assert!(empty.is_empty());
        let front_empty = pool.append(empty, a);
        assert_eq!(collect(&pool, front_empty), vec![7]);
        let back_empty = pool.append(a, empty);
        assert_eq!(collect(&pool, back_empty), vec![7]);
        assert!(pool.iter(empty).next().is_none());
    }

    #[test]
    fn split_tail_shares_records() {
        let mut pool = ListPool::default();
        let list = build(&mut pool, &[10, 20, 30, 40]);
        let second = pool.advance(pool.head(list));
        let tail = pool.split_tail(list, second);
        assert_eq!(collect(&pool, tail), vec![20, 30, 40]);
        assert_eq!(collect(&pool, list), vec![10, 20, 30, 40]);

        let end = pool.advance(pool.advance(pool.advance(pool.advance(pool.head(list)))));
        assert!(end.is_end());
        assert!(pool.split_tail(list, end).is_empty());
    }

    #[test]
    fn values_are_mutable_in_place() {
        let mut pool = ListPool::default();
        let list = build(&mut pool, &[1, 2]);
        let cursor = pool.advance(pool.head(list));
        *pool.get_mut(cursor) += 40;
        assert_eq!(collect(&pool, list), vec![1, 42]);
    }
}
