//! Approximate solver for the compaction linear program.
//!
//! Minimizes `sum(cost[v] * value[v])` subject to difference constraints
//! `value[upper] - value[lower] >= gap` and fixed distances between pairs of
//! variables. Variables are grouped with a disjoint-set union; a group with a
//! non-zero total cost slides in the improving direction until the tightest
//! constraint stops it and is then fused with the group on the other side of
//! that constraint. Fused groups never separate again within a pass.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct Constraint {
    lower: usize,
    upper: usize,
    gap: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct SolveStats {
    /// Group slides that changed at least one value.
    pub(super) moves: usize,
    pub(super) fusions: usize,
}

#[derive(Debug, Clone, Default)]
pub(super) struct LinearProgram {
    values: Vec<i32>,
    costs: Vec<i64>,
    constraints: Vec<Constraint>,
    /// Constraint indices by their `lower` variable.
    as_lower: Vec<Vec<usize>>,
    /// Constraint indices by their `upper` variable.
    as_upper: Vec<Vec<usize>>,
    equalities: Vec<(usize, usize)>,
}

struct Blocker {
    slack: i64,
    other: usize,
}

impl LinearProgram {
    pub(super) fn add_variable(&mut self, value: i32) -> usize {
        self.values.push(value);
        self.costs.push(0);
        self.as_lower.push(Vec::new());
        self.as_upper.push(Vec::new());
        self.values.len() - 1
    }

    pub(super) fn add_cost(&mut self, var: usize, cost: i64) {
        self.costs[var] = self.costs[var].saturating_add(cost);
    }

    /// Require `value[upper] - value[lower] >= gap`. The gap is lowered to the
    /// current distance when the constraint does not hold yet, so the starting
    /// point is always feasible.
    pub(super) fn add_min_distance(&mut self, lower: usize, upper: usize, gap: i32) {
        if lower == upper {
            return;
        }
        let current = i64::from(self.values[upper]) - i64::from(self.values[lower]);
        let idx = self.constraints.len();
        self.constraints.push(Constraint {
            lower,
            upper,
            gap: i64::from(gap).min(current),
        });
        self.as_lower[lower].push(idx);
        self.as_upper[upper].push(idx);
    }

    /// Keep the current distance between `a` and `b`.
    pub(super) fn add_fixed_distance(&mut self, a: usize, b: usize) {
        if a != b {
            self.equalities.push((a, b));
        }
    }

    pub(super) fn value(&self, var: usize) -> i32 {
        self.values[var]
    }

    pub(super) fn len(&self) -> usize {
        self.values.len()
    }

    pub(super) fn solve(&mut self, passes: usize) -> SolveStats {
        let mut stats = SolveStats::default();
        for _ in 0..passes {
            let pass = self.solve_pass();
            stats.moves += pass.moves;
            stats.fusions += pass.fusions;
            // a pass that moved nothing would repeat itself exactly
            if pass.moves == 0 {
                break;
            }
        }
        stats
    }

    fn solve_pass(&mut self) -> SolveStats {
        let mut stats = SolveStats::default();
        let mut groups = DisjointSets::new(&self.costs, &self.as_lower, &self.as_upper);
        for &(a, b) in &self.equalities {
            groups.union(&mut self.values, a, b);
        }

        let mut queue: VecDeque<usize> = (0..self.values.len())
            .filter(|var| groups.is_root(*var) && groups.cost(*var) != 0)
            .collect();
        while let Some(root) = queue.pop_front() {
            if !groups.is_root(root) {
                continue;
            }
            let cost = groups.cost(root);
            if cost == 0 {
                continue;
            }
            let decreasing = cost > 0;
            // unbounded groups stay where they are
            let Some(blocker) = self.nearest_blocker(&mut groups, root, decreasing) else {
                continue;
            };
            let delta = blocker.slack.max(0);
            if delta > 0 {
                groups.shift[root] += if decreasing { -delta } else { delta };
                stats.moves += 1;
            }
            let merged = groups.union(&mut self.values, root, blocker.other);
            stats.fusions += 1;
            if groups.cost(merged) != 0 {
                queue.push_back(merged);
            }
        }

        for var in 0..self.values.len() {
            let value = groups.value(&self.values, var);
            self.values[var] = clamp_to_i32(value);
        }
        stats
    }

    /// Tightest constraint against moving the group of `root`; ties go to the
    /// constraint added first. Constraints that became internal to the group
    /// are dropped from its incident list on the way.
    fn nearest_blocker(
        &self,
        groups: &mut DisjointSets,
        root: usize,
        decreasing: bool,
    ) -> Option<Blocker> {
        let mut incident = if decreasing {
            std::mem::take(&mut groups.as_upper[root])
        } else {
            std::mem::take(&mut groups.as_lower[root])
        };
        let mut best: Option<(i64, usize, usize)> = None;
        incident.retain(|&idx| {
            let constraint = self.constraints[idx];
            let other = if decreasing {
                constraint.lower
            } else {
                constraint.upper
            };
            if groups.find(other) == root {
                return false;
            }
            let slack = groups.value(&self.values, constraint.upper)
                - groups.value(&self.values, constraint.lower)
                - constraint.gap;
            let better = match best {
                None => true,
                Some((best_slack, best_idx, _)) => {
                    slack < best_slack || (slack == best_slack && idx < best_idx)
                }
            };
            if better {
                best = Some((slack, idx, other));
            }
            true
        });
        if decreasing {
            groups.as_upper[root] = incident;
        } else {
            groups.as_lower[root] = incident;
        }
        best.map(|(slack, _, other)| Blocker { slack, other })
    }
}

fn clamp_to_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Move the smaller of two incident lists onto the larger one and leave the
/// result at `into`.
fn absorb(lists: &mut [Vec<usize>], into: usize, from: usize) {
    let mut moved = std::mem::take(&mut lists[from]);
    if moved.len() > lists[into].len() {
        std::mem::swap(&mut moved, &mut lists[into]);
    }
    lists[into].extend(moved);
}

/// Groups of variables that move together. A group's members keep their
/// values relative to each other; sliding the group only touches `shift` at
/// its root.
#[derive(Debug)]
struct DisjointSets {
    parent: Vec<usize>,
    members: Vec<Vec<usize>>,
    cost: Vec<i64>,
    shift: Vec<i64>,
    /// Constraints with a member as `lower`, by root.
    as_lower: Vec<Vec<usize>>,
    /// Constraints with a member as `upper`, by root.
    as_upper: Vec<Vec<usize>>,
}

impl DisjointSets {
    fn new(costs: &[i64], as_lower: &[Vec<usize>], as_upper: &[Vec<usize>]) -> Self {
        Self {
            parent: (0..costs.len()).collect(),
            members: (0..costs.len()).map(|var| vec![var]).collect(),
            cost: costs.to_vec(),
            shift: vec![0; costs.len()],
            as_lower: as_lower.to_vec(),
            as_upper: as_upper.to_vec(),
        }
    }

    fn is_root(&self, var: usize) -> bool {
        self.parent[var] == var
    }

    fn cost(&self, root: usize) -> i64 {
        self.cost[root]
    }

    /// Current value of `var`, including the pending shift of its group.
    fn value(&mut self, values: &[i32], var: usize) -> i64 {
        let root = self.find(var);
        i64::from(values[var]) + self.shift[root]
    }

    fn find(&mut self, var: usize) -> usize {
        let mut root = var;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = var;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Merge two groups, the smaller into the larger, rebasing the stored
    /// values of the smaller one onto the shift of the larger. Returns the
    /// new root.
    fn union(&mut self, values: &mut [i32], a: usize, b: usize) -> usize {
        let mut a = self.find(a);
        let mut b = self.find(b);
        if a == b {
            return a;
        }
        if self.members[a].len() < self.members[b].len() {
            std::mem::swap(&mut a, &mut b);
        }
        let rebase = self.shift[b] - self.shift[a];
        let moved = std::mem::take(&mut self.members[b]);
        if rebase != 0 {
            for &var in &moved {
                values[var] = clamp_to_i32(i64::from(values[var]) + rebase);
            }
        }
        self.members[a].extend(moved);
        self.parent[b] = a;
        absorb(&mut self.as_lower, a, b);
        absorb(&mut self.as_upper, a, b);
        self.cost[a] = self.cost[a].saturating_add(self.cost[b]);
        self.cost[b] = 0;
        self.shift[b] = 0;
        a
    }
}
