use tracing::debug;

use super::LayoutState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnStack,
    Done,
}

/// Depth-first search from the entry, then from every node not reached yet in
/// id order. Edges into a node still on the stack close a cycle and are
/// marked as loop edges; every other edge is kept in the DAG subset. Nodes
/// are appended to `block_order` when they leave the stack.
pub(super) fn remove_cycles(state: &mut LayoutState) {
    let count = state.nodes.len();
    let mut visit = vec![Visit::New; count];
    // (node, next position in its edge list)
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut discovered = 0usize;
    let mut loop_edges = 0usize;

    let starts = std::iter::once(state.entry).chain(0..count);
    for start in starts {
        if visit[start] != Visit::New {
            continue;
        }
        visit[start] = Visit::OnStack;
        state.nodes[start].discovery = discovered;
        discovered += 1;
        stack.push((start, 0));

        while let Some(top) = stack.last_mut() {
            let (node, position) = *top;
            let Some(&edge_idx) = state.nodes[node].out_edges.get(position) else {
                stack.pop();
                visit[node] = Visit::Done;
                state.block_order.push(node);
                continue;
            };
            top.1 += 1;

            let Some(target) = state.edges[edge_idx].to else {
                continue;
            };
            match visit[target] {
                Visit::New => {
                    state.nodes[node].dag_edges.push(target);
                    visit[target] = Visit::OnStack;
                    state.nodes[target].discovery = discovered;
                    discovered += 1;
                    stack.push((target, 0));
                }
                Visit::Done => state.nodes[node].dag_edges.push(target),
                Visit::OnStack => {
                    state.edges[edge_idx].is_loop = true;
                    loop_edges += 1;
                }
            }
        }
    }

    debug!(nodes = count, loop_edges, "cycle removal finished");
}

/// Longest-path layering over the DAG subset: every DAG edge goes at least one
/// row down and roots sit in row 0.
pub(super) fn assign_rows(state: &mut LayoutState) {
    for position in (0..state.block_order.len()).rev() {
        let node = state.block_order[position];
        let next_row = state.nodes[node].row + 1;
        for idx in 0..state.nodes[node].dag_edges.len() {
            let target = state.nodes[node].dag_edges[idx];
            let row = &mut state.nodes[target].row;
            *row = (*row).max(next_row);
        }
    }
    state.rows = state
        .nodes
        .iter()
        .map(|node| node.row + 1)
        .max()
        .unwrap_or(0);
    debug!(rows = state.rows, "rows assigned");
}

/// Claim tree children: a DAG target exactly one row down that has no parent
/// yet becomes a child of the first node (in topological order) reaching it.
pub(super) fn select_tree_edges(state: &mut LayoutState) {
    let mut tree_edges = 0usize;
    for position in (0..state.block_order.len()).rev() {
        let node = state.block_order[position];
        let child_row = state.nodes[node].row + 1;
        for idx in 0..state.nodes[node].dag_edges.len() {
            let target = state.nodes[node].dag_edges[idx];
            if state.nodes[target].row == child_row && state.nodes[target].parent.is_none() {
                state.nodes[target].parent = Some(node);
                state.nodes[node].tree_edges.push(target);
                tree_edges += 1;
            }
        }
    }
    debug!(tree_edges, "spanning forest selected");
}
