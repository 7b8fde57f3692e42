//! Augmented complete binary trees over a fixed number of positions.
//!
//! Two generic shapes cover every use in the layout engine:
//!
//! - [`PointTree`]: point assignment, range aggregation and "nearest matching
//!   position" searches.
//! - [`LazyTree`]: range updates with deferred propagation, range aggregation.
//!
//! The behaviour of a tree is selected by the [`Aggregate`] (and
//! [`LazyAggregate`]) implementation it is instantiated with. The concrete
//! variants the layout needs are exported as type aliases at the bottom of the
//! module.

use std::fmt;

/// Associative combine function with a neutral element.
pub trait Aggregate {
    type Value: Copy + fmt::Debug;

    /// Neutral element of [`Aggregate::combine`]. Padding leaves hold it.
    fn identity() -> Self::Value;

    fn combine(left: Self::Value, right: Self::Value) -> Self::Value;
}

/// An [`Aggregate`] that can also absorb pending range updates.
///
/// `apply` must distribute over `combine`: applying an update to the aggregate
/// of a subtree gives the same result as applying it to every leaf and
/// aggregating afterwards.
pub trait LazyAggregate: Aggregate {
    type Update: Copy + PartialEq + fmt::Debug;

    /// The update that leaves every value unchanged.
    fn no_update() -> Self::Update;

    fn apply(update: Self::Update, value: Self::Value) -> Self::Value;

    /// Update equivalent to applying `older` first and `newer` second.
    fn compose(newer: Self::Update, older: Self::Update) -> Self::Update;
}

fn leaf_count(len: usize) -> usize {
    len.max(1).next_power_of_two()
}

/// Complete binary tree with point updates.
#[derive(Debug, Clone)]
pub struct PointTree<A: Aggregate> {
    len: usize,
    size: usize,
    nodes: Vec<A::Value>,
}

impl<A: Aggregate> PointTree<A> {
    pub fn new(len: usize) -> Self {
        let size = leaf_count(len);
        Self {
            len,
            size,
            nodes: vec![A::identity(); 2 * size],
        }
    }

    /// Tree with every position set to `value`.
    pub fn with_value(len: usize, value: A::Value) -> Self {
        let mut tree = Self::new(len);
        for leaf in tree.size..tree.size + len {
            tree.nodes[leaf] = value;
        }
        tree.rebuild_all();
        tree
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn rebuild_all(&mut self) {
        for node in (1..self.size).rev() {
            self.nodes[node] = A::combine(self.nodes[2 * node], self.nodes[2 * node + 1]);
        }
    }

    pub fn set(&mut self, position: usize, value: A::Value) {
        debug_assert!(position < self.len, "position {position} out of range");
        let mut node = position + self.size;
        self.nodes[node] = value;
        while node > 1 {
            node >>= 1;
            self.nodes[node] = A::combine(self.nodes[2 * node], self.nodes[2 * node + 1]);
        }
    }

    pub fn get(&self, position: usize) -> A::Value {
        self.nodes[position + self.size]
    }

    /// Aggregate over the half-open range `[left, right)`.
    pub fn query(&self, left: usize, right: usize) -> A::Value {
        let mut acc_left = A::identity();
        let mut acc_right = A::identity();
        let mut lo = left + self.size;
        let mut hi = right.min(self.len) + self.size;
        while lo < hi {
            if lo & 1 == 1 {
                acc_left = A::combine(acc_left, self.nodes[lo]);
                lo += 1;
            }
            if hi & 1 == 1 {
                hi -= 1;
                acc_right = A::combine(self.nodes[hi], acc_right);
            }
            lo >>= 1;
            hi >>= 1;
        }
        A::combine(acc_left, acc_right)
    }

    /// Rightmost position in `[0, last]` whose value satisfies `matches`.
    ///
    /// `matches` is evaluated on aggregates as well as on leaves, so it must
    /// hold for an aggregate exactly when it holds for at least one leaf below
    /// it (e.g. `min < bound` for a min tree).
    pub fn rightmost_matching(
        &self,
        last: usize,
        matches: impl Fn(A::Value) -> bool,
    ) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let mut found = None;
        let mut lo = self.size;
        let mut hi = last.min(self.len - 1) + 1 + self.size;
        while lo < hi {
            if lo & 1 == 1 {
                // keep going, a later subtree is further to the right
                if matches(self.nodes[lo]) {
                    found = Some(lo);
                }
                lo += 1;
            }
            if hi & 1 == 1 {
                hi -= 1;
                if matches(self.nodes[hi]) {
                    found = Some(hi);
                    break;
                }
            }
            lo >>= 1;
            hi >>= 1;
        }
        let mut node = found?;
        while node < self.size {
            node = 2 * node + 1;
            if !matches(self.nodes[node]) {
                node -= 1;
            }
        }
        Some(node - self.size)
    }

    /// Leftmost position in `[first, len)` whose value satisfies `matches`.
    ///
    /// Same contract on `matches` as [`PointTree::rightmost_matching`].
    pub fn leftmost_matching(
        &self,
        first: usize,
        matches: impl Fn(A::Value) -> bool,
    ) -> Option<usize> {
        if first >= self.len {
            return None;
        }
        let mut found = None;
        let mut lo = first + self.size;
        let mut hi = self.len + self.size;
        while lo < hi {
            if lo & 1 == 1 {
                if matches(self.nodes[lo]) {
                    found = Some(lo);
                    break;
                }
                lo += 1;
            }
            if hi & 1 == 1 {
                hi -= 1;
                // keep going, a later subtree is further to the left
                if matches(self.nodes[hi]) {
                    found = Some(hi);
                }
            }
            lo >>= 1;
            hi >>= 1;
        }
        let mut node = found?;
        while node < self.size {
            node *= 2;
            if !matches(self.nodes[node]) {
                node += 1;
            }
        }
        Some(node - self.size)
    }
}

/// Complete binary tree with lazily propagated range updates.
#[derive(Debug, Clone)]
pub struct LazyTree<A: LazyAggregate> {
    len: usize,
    size: usize,
    height: u32,
    nodes: Vec<A::Value>,
    pending: Vec<A::Update>,
}

impl<A: LazyAggregate> LazyTree<A> {
    pub fn new(len: usize) -> Self {
        let size = leaf_count(len);
        Self {
            len,
            size,
            height: size.trailing_zeros(),
            nodes: vec![A::identity(); 2 * size],
            pending: vec![A::no_update(); size],
        }
    }

    pub fn with_value(len: usize, value: A::Value) -> Self {
        let mut tree = Self::new(len);
        for leaf in tree.size..tree.size + len {
            tree.nodes[leaf] = value;
        }
        for node in (1..tree.size).rev() {
            tree.nodes[node] = A::combine(tree.nodes[2 * node], tree.nodes[2 * node + 1]);
        }
        tree
    }

    fn apply_node(&mut self, node: usize, update: A::Update) {
        self.nodes[node] = A::apply(update, self.nodes[node]);
        if node < self.size {
            self.pending[node] = A::compose(update, self.pending[node]);
        }
    }

    fn push(&mut self, node: usize) {
        let update = self.pending[node];
        if update != A::no_update() {
            self.apply_node(2 * node, update);
            self.apply_node(2 * node + 1, update);
            self.pending[node] = A::no_update();
        }
    }

    fn push_path(&mut self, leaf: usize) {
        for shift in (1..=self.height).rev() {
            self.push(leaf >> shift);
        }
    }

    fn rebuild_path(&mut self, leaf: usize) {
        let mut node = leaf >> 1;
        while node >= 1 {
            let mut value = A::combine(self.nodes[2 * node], self.nodes[2 * node + 1]);
            if self.pending[node] != A::no_update() {
                value = A::apply(self.pending[node], value);
            }
            self.nodes[node] = value;
            node >>= 1;
        }
    }

    /// Apply `update` to every position in `[left, right)`.
    pub fn update(&mut self, left: usize, right: usize, update: A::Update) {
        let right = right.min(self.len);
        if left >= right {
            return;
        }
        let first = left + self.size;
        let last = right - 1 + self.size;
        self.push_path(first);
        self.push_path(last);
        let mut lo = first;
        let mut hi = last + 1;
        while lo < hi {
            if lo & 1 == 1 {
                self.apply_node(lo, update);
                lo += 1;
            }
            if hi & 1 == 1 {
                hi -= 1;
                self.apply_node(hi, update);
            }
            lo >>= 1;
            hi >>= 1;
        }
        self.rebuild_path(first);
        self.rebuild_path(last);
    }

    /// Aggregate over `[left, right)`. Takes `&mut self` because pending
    /// updates on the boundary paths are pushed down first.
    pub fn query(&mut self, left: usize, right: usize) -> A::Value {
        let right = right.min(self.len);
        if left >= right {
            return A::identity();
        }
        let first = left + self.size;
        let last = right - 1 + self.size;
        self.push_path(first);
        self.push_path(last);
        let mut acc_left = A::identity();
        let mut acc_right = A::identity();
        let mut lo = first;
        let mut hi = last + 1;
        while lo < hi {
            if lo & 1 == 1 {
                acc_left = A::combine(acc_left, self.nodes[lo]);
                lo += 1;
            }
            if hi & 1 == 1 {
                hi -= 1;
                acc_right = A::combine(self.nodes[hi], acc_right);
            }
            lo >>= 1;
            hi >>= 1;
        }
        A::combine(acc_left, acc_right)
    }
}

// ── Concrete aggregates ─────────────────────────────────────────────

/// Minimum over `i32`.
#[derive(Debug, Clone, Copy)]
pub struct Min;

impl Aggregate for Min {
    type Value = i32;

    fn identity() -> i32 {
        i32::MAX
    }

    fn combine(left: i32, right: i32) -> i32 {
        left.min(right)
    }
}

/// Maximum over `i32` with range assignment.
#[derive(Debug, Clone, Copy)]
pub struct AssignMax;

impl Aggregate for AssignMax {
    type Value = i32;

    fn identity() -> i32 {
        i32::MIN
    }

    fn combine(left: i32, right: i32) -> i32 {
        left.max(right)
    }
}

impl LazyAggregate for AssignMax {
    type Update = Option<i32>;

    fn no_update() -> Option<i32> {
        None
    }

    fn apply(update: Option<i32>, value: i32) -> i32 {
        update.unwrap_or(value)
    }

    fn compose(newer: Option<i32>, older: Option<i32>) -> Option<i32> {
        newer.or(older)
    }
}

/// Closed interval of observed values; empty when `min > max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinMax {
    pub min: i32,
    pub max: i32,
}

impl MinMax {
    pub const EMPTY: MinMax = MinMax {
        min: i32::MAX,
        max: i32::MIN,
    };

    pub fn point(value: i32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Paired minimum/maximum with range "widen" updates: every position in the
/// range grows its interval to include the update's interval.
#[derive(Debug, Clone, Copy)]
pub struct WidenMinMax;

impl Aggregate for WidenMinMax {
    type Value = MinMax;

    fn identity() -> MinMax {
        MinMax::EMPTY
    }

    fn combine(left: MinMax, right: MinMax) -> MinMax {
        left.merge(right)
    }
}

impl LazyAggregate for WidenMinMax {
    type Update = MinMax;

    fn no_update() -> MinMax {
        MinMax::EMPTY
    }

    fn apply(update: MinMax, value: MinMax) -> MinMax {
        value.merge(update)
    }

    fn compose(newer: MinMax, older: MinMax) -> MinMax {
        older.merge(newer)
    }
}

/// Point assignment, range minimum, nearest-position-below-bound searches.
pub type PointMinTree = PointTree<Min>;
/// Range assignment, range maximum.
pub type RangeAssignMaxTree = LazyTree<AssignMax>;
/// Range widen, range (minimum, maximum).
pub type RangeMinMaxTree = LazyTree<WidenMinMax>;

impl PointMinTree {
    /// Rightmost position in `[0, position]` holding a value below `bound`.
    pub fn rightmost_less_than(&self, position: usize, bound: i32) -> Option<usize> {
        self.rightmost_matching(position, |value| value < bound)
    }

    /// Leftmost position in `[position, len)` holding a value below `bound`.
    pub fn leftmost_less_than(&self, position: usize, bound: i32) -> Option<usize> {
        self.leftmost_matching(position, |value| value < bound)
    }
}

impl RangeAssignMaxTree {
    pub fn set_range(&mut self, left: usize, right: usize, value: i32) {
        self.update(left, right, Some(value));
    }

    pub fn range_max(&mut self, left: usize, right: usize) -> i32 {
        self.query(left, right)
    }
}

impl RangeMinMaxTree {
    pub fn widen_range(&mut self, left: usize, right: usize, value: i32) {
        self.update(left, right, MinMax::point(value));
    }

    pub fn range_min_max(&mut self, left: usize, right: usize) -> MinMax {
        self.query(left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_rightmost(values: &[i32], position: usize, bound: i32) -> Option<usize> {
        (0..=position.min(values.len() - 1))
            .rev()
            .find(|&idx| values[idx] < bound)
    }

    fn brute_leftmost(values: &[i32], position: usize, bound: i32) -> Option<usize> {
        (position..values.len()).find(|&idx| values[idx] < bound)
    }

    #[test]
    fn min_tree_point_updates_and_queries() {
        let mut tree = PointMinTree::with_value(5, 10);
        tree.set(2, 3);
        tree.set(4, 7);
        assert_eq!(tree.query(0, 5), 3);
        assert_eq!(tree.query(3, 5), 7);
        assert_eq!(tree.query(0, 2), 10);
        assert_eq!(tree.get(2), 3);
        assert_eq!(tree.query(1, 1), i32::MAX);
    }

    #[test]
    fn nearest_searches_match_linear_scan() {
        let values = [5, -1, 8, 2, 9, 9, 0, 4, 6, 3, 7];
        let mut tree = PointMinTree::new(values.len());
        for (idx, value) in values.iter().enumerate() {
            tree.set(idx, *value);
        }
        for bound in [-1, 0, 1, 3, 5, 10] {
            for position in 0..values.len() {
                assert_eq!(
                    tree.rightmost_less_than(position, bound),
                    brute_rightmost(&values, position, bound),
                    "rightmost position={position} bound={bound}"
                );
                assert_eq!(
                    tree.leftmost_less_than(position, bound),
                    brute_leftmost(&values, position, bound),
                    "leftmost position={position} bound={bound}"
                );
            }
        }
    }

    #[test]
    fn searches_on_single_position() {
        let tree = PointMinTree::with_value(1, 4);
        assert_eq!(tree.rightmost_less_than(0, 5), Some(0));
        assert_eq!(tree.leftmost_less_than(0, 4), None);
        assert_eq!(tree.leftmost_less_than(1, 100), None);
    }

    #[test]
    fn assign_max_tree_tracks_overlapping_assignments() {
        let mut tree = RangeAssignMaxTree::with_value(10, 0);
        tree.set_range(2, 6, 5);
        assert_eq!(tree.range_max(0, 10), 5);
        assert_eq!(tree.range_max(0, 2), 0);
        tree.set_range(4, 9, 8);
        assert_eq!(tree.range_max(2, 4), 5);
        assert_eq!(tree.range_max(5, 6), 8);
        tree.set_range(0, 10, 1);
        assert_eq!(tree.range_max(0, 10), 1);
        tree.set_range(3, 4, 2);
        assert_eq!(tree.range_max(0, 3), 1);
        assert_eq!(tree.range_max(3, 4), 2);
        assert_eq!(tree.range_max(4, 10), 1);
    }

    #[test]
    fn assign_max_tree_agrees_with_array_model() {
        let len = 13;
        let mut model = vec![0i32; len];
        let mut tree = RangeAssignMaxTree::with_value(len, 0);
        let ops = [
            (0, 13, 3),
            (5, 7, 9),
            (6, 12, 4),
            (1, 2, 11),
            (11, 13, 2),
            (3, 9, 6),
            (8, 9, 1),
        ];
        for (left, right, value) in ops {
            tree.set_range(left, right, value);
            for slot in &mut model[left..right] {
                *slot = value;
            }
            for l in 0..len {
                for r in l + 1..=len {
                    let expected = *model[l..r].iter().max().unwrap();
                    assert_eq!(tree.range_max(l, r), expected, "range [{l}, {r})");
                }
            }
        }
    }

    #[test]
    fn min_max_tree_widens_ranges() {
        let mut tree = RangeMinMaxTree::new(8);
        assert!(tree.range_min_max(0, 8).is_empty());
        tree.widen_range(1, 4, 10);
        tree.widen_range(3, 6, 20);
        tree.widen_range(2, 3, 5);
        assert_eq!(tree.range_min_max(0, 8), MinMax { min: 5, max: 20 });
        assert_eq!(tree.range_min_max(1, 2), MinMax::point(10));
        assert_eq!(tree.range_min_max(3, 4), MinMax { min: 10, max: 20 });
        assert_eq!(tree.range_min_max(4, 6), MinMax::point(20));
        assert!(tree.range_min_max(6, 8).is_empty());
    }
}
