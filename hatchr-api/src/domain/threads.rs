use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

pub trait ThreadItem {
    fn id(&self) -> Uuid;
    fn parent_id(&self) -> Option<Uuid>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadNode<T: Serialize> {
    #[serde(flatten)]
    pub item: T,
    pub replies: Vec<ThreadNode<T>>,
}

/// Deepest reply level a comment may sit at; top-level comments are level 0.
pub const MAX_REPLY_DEPTH: usize = 8;

/// Reassembles a flat, chronologically ordered list into a reply tree.
///
/// Siblings keep their input order. An item whose parent is not in the list,
/// or whose ancestry loops, is promoted to a root. Replies nested deeper than
/// [`MAX_REPLY_DEPTH`] are shown under their ancestor at the last allowed
/// level, so the tree never grows deeper than that.
pub fn build_tree<T: ThreadItem + Serialize>(items: Vec<T>) -> Vec<ThreadNode<T>> {
    let parents: HashMap<Uuid, Option<Uuid>> = items.iter().map(|i| (i.id(), i.parent_id())).collect();
    let placement = place(&parents);

    let mut roots = Vec::new();
    let mut children: HashMap<Uuid, Vec<T>> = HashMap::new();
    for item in items {
        match placement.get(&item.id()).copied().flatten() {
            Some(parent) => children.entry(parent).or_default().push(item),
            None => roots.push(item),
        }
    }

    roots
        .into_iter()
        .map(|root| attach(root, &mut children))
        .collect()
}

/// Parent each item is shown under. Walks every ancestor chain once,
/// iteratively, remembering `(depth, anchor)` per item where `anchor` is the
/// ancestor at level `MAX_REPLY_DEPTH - 1` once the chain has reached it.
fn place(parents: &HashMap<Uuid, Option<Uuid>>) -> HashMap<Uuid, Option<Uuid>> {
    let known_parent = |id: Uuid| {
        parents
            .get(&id)
            .copied()
            .flatten()
            .filter(|p| parents.contains_key(p))
    };

    let mut resolved: HashMap<Uuid, (usize, Option<Uuid>)> = HashMap::with_capacity(parents.len());
    let mut placement = HashMap::with_capacity(parents.len());

    for &start in parents.keys() {
        if resolved.contains_key(&start) {
            continue;
        }

        let mut path = vec![start];
        let mut on_path = HashSet::from([start]);
        let mut above = None;
        let mut current = start;
        while let Some(parent) = known_parent(current) {
            if let Some(&info) = resolved.get(&parent) {
                above = Some(info);
                break;
            }
            if !on_path.insert(parent) {
                // Loop: the topmost item on the path becomes a root.
                break;
            }
            path.push(parent);
            current = parent;
        }

        for &node in path.iter().rev() {
            let (depth, inherited, parent) = match above {
                None => (0, None, None),
                Some((d, anchor)) => (d + 1, anchor, known_parent(node)),
            };
            let shown_under = if depth > MAX_REPLY_DEPTH { inherited } else { parent };
            let anchor = if depth + 1 == MAX_REPLY_DEPTH { Some(node) } else { inherited };

            placement.insert(node, shown_under);
            resolved.insert(node, (depth, anchor));
            above = Some((depth, anchor));
        }
    }

    placement
}

fn attach<T: ThreadItem + Serialize>(item: T, children: &mut HashMap<Uuid, Vec<T>>) -> ThreadNode<T> {
    let replies = children
        .remove(&item.id())
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach(child, children))
        .collect();
    ThreadNode { item, replies }
}

/// Level of `id` in the chain described by `parents`, a top-level comment
/// being 0. Counting stops just past [`MAX_REPLY_DEPTH`], so loops end.
pub fn depth_of(id: Uuid, parents: &HashMap<Uuid, Option<Uuid>>) -> usize {
    let mut depth = 0;
    let mut current = id;
    while let Some(parent) = parents.get(&current).copied().flatten() {
        depth += 1;
        if depth > MAX_REPLY_DEPTH {
            break;
        }
        current = parent;
    }
    depth
}

/// Users to notify about a new comment: the project author, then the author
/// of the comment being replied to. The writer and duplicates are skipped.
pub fn notification_targets(writer: Uuid, project_author: Uuid, parent_author: Option<Uuid>) -> Vec<Uuid> {
    let mut targets = Vec::with_capacity(2);
    for candidate in std::iter::once(project_author).chain(parent_author) {
        if candidate != writer && !targets.contains(&candidate) {
            targets.push(candidate);
        }
    }
    targets
}
