use tracing::debug;

use super::{LayoutState, Silhouette};
use crate::list_pool::ListPool;

/// Grid columns a node occupies.
const NODE_SPAN: i32 = 2;

/// Detect branches that reconverge one row further down.
///
/// When every tree child of a node (up to the first one that does not) has a
/// DAG edge to the same single grandchild, the node records that grandchild as
/// its merge target, and the branch owning the grandchild in the tree gets a
/// column hint that puts the grandchild under the middle of the branches.
pub(super) fn find_merge_points(state: &mut LayoutState) {
    let mut merges = 0usize;
    for node in 0..state.nodes.len() {
        let children = &state.nodes[node].tree_edges;
        if children.len() < 2 {
            continue;
        }

        let mut merge_node = None;
        let mut grandchildren = 0usize;
        for &child in children {
            let child_tree = &state.nodes[child].tree_edges;
            if let Some(&first) = child_tree.first() {
                merge_node = Some(first);
            }
            grandchildren += child_tree.len();
        }
        let Some(merge_node) = merge_node else {
            continue;
        };
        if grandchildren != 1 {
            continue;
        }

        let mut reaching = 0i32;
        let mut owner = None;
        for (position, &child) in children.iter().enumerate() {
            if !state.nodes[child].dag_edges.contains(&merge_node) {
                break;
            }
            if state.nodes[child].tree_edges.len() == 1 {
                owner = Some((position as i32, child));
            }
            reaching += 1;
        }
        let Some((owner_position, owner)) = owner else {
            continue;
        };
        if reaching < 2 {
            continue;
        }

        state.nodes[node].merge_target = Some(merge_node);
        state.nodes[owner].merge_hint = Some((reaching - 1) - owner_position * 2);
        merges += 1;
    }
    debug!(merges, "merge points found");
}

/// Place every subtree of the spanning forest, children before parents, then
/// put the trees side by side and resolve relative columns to absolute ones.
pub(super) fn place_subtrees(state: &mut LayoutState) {
    let tight = state.config.layout_style.tight_packing();
    let over_extent = state.config.layout_style.parent_over_extent();

    for position in 0..state.block_order.len() {
        let node = state.block_order[position];
        place_node(state, node, tight, over_extent);
    }

    let mut roots: Vec<usize> = (0..state.nodes.len())
        .filter(|&node| state.nodes[node].parent.is_none())
        .collect();
    roots.sort_by_key(|&node| state.nodes[node].discovery);
    let mut next_free = 0;
    for &root in &roots {
        let silhouette = state.nodes[root].silhouette;
        state.nodes[root].col = next_free - silhouette.min_left;
        next_free = state.nodes[root].col + silhouette.max_right;
    }

    for position in (0..state.block_order.len()).rev() {
        let node = state.block_order[position];
        let col = state.nodes[node].col;
        for idx in 0..state.nodes[node].tree_edges.len() {
            let child = state.nodes[node].tree_edges[idx];
            state.nodes[child].col += col;
        }
    }

    state.columns = state
        .nodes
        .iter()
        .map(|node| node.col + NODE_SPAN)
        .max()
        .unwrap_or(0);
    debug!(
        roots = roots.len(),
        columns = state.columns,
        silhouette_records = state.silhouettes.allocated(),
        "subtrees placed"
    );
}

fn leaf_silhouette(pool: &mut ListPool<i32>) -> Silhouette {
    Silhouette {
        left: pool.make_list(0),
        right: pool.make_list(NODE_SPAN),
        last_left: 0,
        last_right: NODE_SPAN,
        min_left: 0,
        max_right: NODE_SPAN,
        row_count: 1,
    }
}

fn place_node(state: &mut LayoutState, node: usize, tight: bool, over_extent: bool) {
    let children = state.nodes[node].tree_edges.clone();
    let pool = &mut state.silhouettes;
    let Some((&first, rest)) = children.split_first() else {
        state.nodes[node].silhouette = leaf_silhouette(pool);
        return;
    };

    // merged silhouette of the children so far, in the frame of the first one
    let mut merged = state.nodes[first].silhouette;
    let mut offsets = Vec::with_capacity(children.len());
    offsets.push(0);
    for &child in rest {
        let (next, offset) = merge_right(pool, merged, state.nodes[child].silhouette, tight);
        merged = next;
        offsets.push(offset);
    }

    let last_offset = offsets.last().copied().unwrap_or(0);
    let col = match state.nodes[node].merge_hint {
        Some(hint) if children.len() == 1 => -hint,
        _ if over_extent => ((merged.min_left + merged.max_right).div_euclid(2) - NODE_SPAN / 2)
            .clamp(0, last_offset),
        _ => last_offset.div_euclid(2),
    };

    for (&child, offset) in children.iter().zip(&offsets) {
        state.nodes[child].col = offset - col;
    }
    state.nodes[node].silhouette = attach_parent(pool, merged, col);
}

/// Pack `right` to the right of `left`. Both silhouettes start on the same
/// row. Returns the merged silhouette (in `left`'s frame) and the column of
/// `right`'s root in that frame.
fn merge_right(
    pool: &mut ListPool<i32>,
    left: Silhouette,
    right: Silhouette,
    tight: bool,
) -> (Silhouette, i32) {
    let mut left_it = pool.head(left.right);
    let mut right_it = pool.head(right.left);
    let mut left_pos = 0;
    let mut right_pos = 0;
    let mut min_offset = i32::MIN;
    let mut widest_left = i32::MIN;
    let mut narrowest_right = i32::MAX;
    while !left_it.is_end() && !right_it.is_end() {
        left_pos += pool.get(left_it);
        right_pos += pool.get(right_it);
        min_offset = min_offset.max(left_pos - right_pos);
        widest_left = widest_left.max(left_pos);
        narrowest_right = narrowest_right.min(right_pos);
        left_it = pool.advance(left_it);
        right_it = pool.advance(right_it);
    }
    let offset = if tight {
        min_offset
    } else {
        widest_left - narrowest_right
    };

    let mut merged = left;
    *pool.get_mut(pool.head(right.right)) += offset;
    if left.row_count > right.row_count {
        // the left side is deeper: its remaining right boundary now continues
        // from the bottom of the shifted right side
        let rest = pool.split_tail(left.right, left_it);
        *pool.get_mut(left_it) += left_pos - (right.last_right + offset);
        merged.right = pool.append(right.right, rest);
    } else {
        merged.right = right.right;
        merged.last_right = right.last_right + offset;
    }
    if right.row_count > left.row_count {
        let rest = pool.split_tail(right.left, right_it);
        *pool.get_mut(right_it) += right_pos + offset - left.last_left;
        merged.left = pool.append(left.left, rest);
        merged.last_left = right.last_left + offset;
    }
    merged.min_left = left.min_left.min(right.min_left + offset);
    merged.max_right = left.max_right.max(right.max_right + offset);
    merged.row_count = left.row_count.max(right.row_count);
    (merged, offset)
}

/// Put a parent row on top of the merged children, with the parent at column
/// `col` of the children's frame. The result is in the parent's frame.
fn attach_parent(pool: &mut ListPool<i32>, children: Silhouette, col: i32) -> Silhouette {
    *pool.get_mut(pool.head(children.left)) -= col;
    *pool.get_mut(pool.head(children.right)) -= col + NODE_SPAN;
    let top_left = pool.make_list(0);
    let top_right = pool.make_list(NODE_SPAN);
    Silhouette {
        left: pool.append(top_left, children.left),
        right: pool.append(top_right, children.right),
        last_left: children.last_left - col,
        last_right: children.last_right - col,
        min_left: (children.min_left - col).min(0),
        max_right: (children.max_right - col).max(NODE_SPAN),
        row_count: children.row_count + 1,
    }
}
