//! Arena-backed trie over [`Index`] sequences.
//!
//! Each node corresponds to an index prefix and owns the
//! [`HoppingAmplitude`]s whose `from` index ends there. Nodes are stored in a
//! flat arena and refer to their children by position, so restricting to a
//! subspace is just a matter of starting a traversal at a different node.

use std::hash::BuildHasherDefault;
use indexmap::IndexMap;
use rustc_hash::FxHasher;
use crate::{ amplitude::HoppingAmplitude, index::Index };

type Children = IndexMap<i32, usize, BuildHasherDefault<FxHasher>>;

const ROOT: usize = 0;

#[derive(Clone, Debug, Default)]
struct Node {
    children: Children,
    amplitudes: Vec<HoppingAmplitude>,
    // set if some amplitude starts or ends at this node
    endpoint: bool,
    basis_index: Option<usize>,
}

/// Trie of [`HoppingAmplitude`]s keyed by their `from` index.
#[derive(Clone, Debug)]
pub struct AmplitudeTree {
    nodes: Vec<Node>,
    basis: Vec<Index>,
    num_amplitudes: usize,
}

impl Default for AmplitudeTree {
    fn default() -> Self {
        Self { nodes: vec![Node::default()], basis: Vec::new(), num_amplitudes: 0 }
    }
}

impl AmplitudeTree {
    /// Create a new, empty tree.
    pub fn new() -> Self { Self::default() }

    fn find(&self, index: &[i32]) -> Option<usize> {
        index.iter()
            .try_fold(ROOT, |node, k| self.nodes[node].children.get(k).copied())
    }

    fn find_or_create(&mut self, index: &[i32]) -> usize {
        let mut node = ROOT;
        for k in index.iter() {
            node = match self.nodes[node].children.get(k) {
                Some(child) => *child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].children.insert(*k, child);
                    child
                },
            };
        }
        node
    }

    /// Add an amplitude to the tree.
    ///
    /// Both endpoints are registered as basis elements. Any previously
    /// assigned basis is discarded.
    ///
    /// *Panics* if either index contains a wildcard.
    pub fn insert(&mut self, ha: HoppingAmplitude) {
        crate::tb_assert!(
            ha.to.is_concrete() && ha.from.is_concrete(),
            "AmplitudeTree::insert()",
            &format!(
                "Hopping amplitude {} <- {} contains a negative subindex.",
                ha.to, ha.from,
            ),
            "Only non-negative subindices can be stored.",
        );
        self.clear_basis();
        let to = self.find_or_create(&ha.to);
        self.nodes[to].endpoint = true;
        let from = self.find_or_create(&ha.from);
        self.nodes[from].endpoint = true;
        self.nodes[from].amplitudes.push(ha);
        self.num_amplitudes += 1;
    }

    fn clear_basis(&mut self) {
        if self.basis.is_empty() { return; }
        self.nodes.iter_mut().for_each(|node| { node.basis_index = None; });
        self.basis.clear();
    }

    /// Put the tree in canonical order and assign basis positions.
    ///
    /// Children of every node are sorted by value, after which every endpoint
    /// index receives the next basis position in depth-first (i.e.
    /// lexicographic) order. Finally, amplitudes stored at each node are
    /// (stably) sorted by the basis position of their `to` index. Returns the
    /// basis size.
    pub fn sort(&mut self) -> usize {
        self.clear_basis();
        self.nodes.iter_mut()
            .for_each(|node| { node.children.sort_keys(); });

        let mut stack: Vec<(usize, Vec<i32>)> = vec![(ROOT, Vec::new())];
        while let Some((node, path)) = stack.pop() {
            if self.nodes[node].endpoint {
                self.nodes[node].basis_index = Some(self.basis.len());
                self.basis.push(Index::new(path.clone()));
            }
            // reversed so that the smallest child is popped first
            for (k, child) in self.nodes[node].children.iter().rev() {
                let mut child_path = path.clone();
                child_path.push(*k);
                stack.push((*child, child_path));
            }
        }

        for n in 0..self.nodes.len() {
            let amplitudes = std::mem::take(&mut self.nodes[n].amplitudes);
            let mut keyed: Vec<(usize, HoppingAmplitude)>
                = amplitudes.into_iter()
                .map(|ha| {
                    let to = self.basis_index(&ha.to)
                        .expect("AmplitudeTree::sort: endpoint without basis index");
                    (to, ha)
                })
                .collect();
            keyed.sort_by_key(|(to, _)| *to);
            self.nodes[n].amplitudes
                = keyed.into_iter().map(|(_, ha)| ha).collect();
        }
        self.basis.len()
    }

    /// Return the basis position of an index, if it has one.
    ///
    /// Positions exist only after [`Self::sort`] and are discarded by the next
    /// [`Self::insert`].
    pub fn basis_index(&self, index: &Index) -> Option<usize> {
        self.find(index).and_then(|node| self.nodes[node].basis_index)
    }

    /// Return all basis elements ordered by basis position.
    pub fn basis(&self) -> &[Index] { &self.basis }

    /// Return the number of basis positions assigned by the last sort.
    pub fn basis_size(&self) -> usize { self.basis.len() }

    /// Return the number of stored amplitudes.
    pub fn len(&self) -> usize { self.num_amplitudes }

    /// Return `true` if no amplitudes are stored.
    pub fn is_empty(&self) -> bool { self.num_amplitudes == 0 }

    /// Return a cursor over all amplitudes.
    pub fn cursor(&self) -> AmplitudeCursor<'_> {
        AmplitudeCursor::new(self, Some(ROOT))
    }

    /// Return a cursor over the amplitudes whose `from` index starts with
    /// `subspace`.
    ///
    /// The cursor is empty if no stored index has this prefix.
    pub fn cursor_at(&self, subspace: &Index) -> AmplitudeCursor<'_> {
        AmplitudeCursor::new(self, self.find(subspace))
    }
}

/// Forward-only, restartable cursor over the amplitudes in (a subtree of) an
/// [`AmplitudeTree`].
///
/// Amplitudes are visited depth-first, with the amplitudes stored at a node
/// visited before those of its children. Once the tree is
/// [sorted][AmplitudeTree::sort], this is ascending order in (`from`, `to`)
/// basis position. Exhaustion is signalled by [`Self::current`] returning
/// `None`.
///
/// The cursor also implements [`Iterator`], yielding the current amplitude and
/// then advancing.
#[derive(Clone, Debug)]
pub struct AmplitudeCursor<'a> {
    tree: &'a AmplitudeTree,
    root: Option<usize>,
    stack: Vec<(usize, usize)>,
    node: Option<usize>,
    pos: usize,
}

impl<'a> AmplitudeCursor<'a> {
    fn new(tree: &'a AmplitudeTree, root: Option<usize>) -> Self {
        let mut cursor
            = Self { tree, root, stack: Vec::new(), node: None, pos: 0 };
        cursor.reset();
        cursor
    }

    /// Rewind to the first amplitude.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.node = self.root;
        self.pos = 0;
        if let Some(root) = self.root {
            self.stack.push((root, 0));
        }
        self.seek();
    }

    // move forward until `node`/`pos` point at an amplitude, or the traversal
    // is exhausted
    fn seek(&mut self) {
        loop {
            if let Some(node) = self.node {
                if self.pos < self.tree.nodes[node].amplitudes.len() { return; }
                self.node = None;
            }
            let Some((node, next_child)) = self.stack.last_mut()
                else { return; };
            match self.tree.nodes[*node].children.get_index(*next_child) {
                Some((_, child)) => {
                    *next_child += 1;
                    let child = *child;
                    self.stack.push((child, 0));
                    self.node = Some(child);
                    self.pos = 0;
                },
                None => { self.stack.pop(); },
            }
        }
    }

    /// Move to the next amplitude. Does nothing if already exhausted.
    pub fn advance(&mut self) {
        if self.node.is_some() {
            self.pos += 1;
            self.seek();
        }
    }

    /// Return the current amplitude, or `None` if exhausted.
    pub fn current(&self) -> Option<&'a HoppingAmplitude> {
        let tree: &'a AmplitudeTree = self.tree;
        self.node.map(|node| &tree.nodes[node].amplitudes[self.pos])
    }
}

impl<'a> Iterator for AmplitudeCursor<'a> {
    type Item = &'a HoppingAmplitude;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.current();
        self.advance();
        item
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ha(to: &[i32], from: &[i32]) -> HoppingAmplitude {
        HoppingAmplitude::new(1.0, to, from)
    }

    fn pairs(cursor: AmplitudeCursor) -> Vec<(Vec<i32>, Vec<i32>)> {
        cursor.map(|ha| (ha.from.to_vec(), ha.to.to_vec())).collect()
    }

    #[test]
    fn sorted_traversal() {
        let mut tree = AmplitudeTree::new();
        tree.insert(ha(&[0, 1], &[1, 0]));
        tree.insert(ha(&[1, 0], &[0, 1]));
        tree.insert(ha(&[0, 0], &[1, 0]));
        tree.insert(ha(&[1, 0], &[0, 0]));
        assert_eq!(tree.sort(), 3);
        assert_eq!(
            tree.basis(),
            &[Index::from([0, 0]), Index::from([0, 1]), Index::from([1, 0])],
        );
        assert_eq!(
            pairs(tree.cursor()),
            vec![
                (vec![0, 0], vec![1, 0]),
                (vec![0, 1], vec![1, 0]),
                (vec![1, 0], vec![0, 0]),
                (vec![1, 0], vec![0, 1]),
            ],
        );
    }

    #[test]
    fn to_only_indices_get_basis_positions() {
        let mut tree = AmplitudeTree::new();
        tree.insert(ha(&[5], &[2]));
        tree.sort();
        assert_eq!(tree.basis_index(&[2].into()), Some(0));
        assert_eq!(tree.basis_index(&[5].into()), Some(1));
        assert_eq!(tree.basis_index(&[3].into()), None);
    }

    #[test]
    fn prefix_node_with_children() {
        let mut tree = AmplitudeTree::new();
        tree.insert(ha(&[0, 0], &[0, 0]));
        tree.insert(ha(&[0], &[0]));
        tree.sort();
        assert_eq!(tree.basis_index(&[0].into()), Some(0));
        assert_eq!(tree.basis_index(&[0, 0].into()), Some(1));
        assert_eq!(
            pairs(tree.cursor()),
            vec![(vec![0], vec![0]), (vec![0, 0], vec![0, 0])],
        );
    }

    #[test]
    fn subspace_cursor() {
        let mut tree = AmplitudeTree::new();
        for x in 0..3 {
            tree.insert(ha(&[x, 1], &[x, 0]));
            tree.insert(ha(&[x, 0], &[x, 1]));
        }
        tree.sort();
        let sub = pairs(tree.cursor_at(&[1].into()));
        assert_eq!(
            sub,
            vec![(vec![1, 0], vec![1, 1]), (vec![1, 1], vec![1, 0])],
        );
        assert!(tree.cursor_at(&[7].into()).current().is_none());
    }

    #[test]
    fn cursor_restarts() {
        let mut tree = AmplitudeTree::new();
        tree.insert(ha(&[1], &[0]));
        tree.insert(ha(&[0], &[1]));
        tree.sort();
        let mut cursor = tree.cursor();
        let mut count = 0;
        while cursor.current().is_some() {
            count += 1;
            cursor.advance();
        }
        assert_eq!(count, 2);
        cursor.advance();
        assert!(cursor.current().is_none());
        cursor.reset();
        assert_eq!(cursor.current().map(|ha| ha.from.to_vec()), Some(vec![0]));
    }

    #[test]
    fn insert_discards_basis() {
        let mut tree = AmplitudeTree::new();
        tree.insert(ha(&[1], &[0]));
        tree.sort();
        assert_eq!(tree.basis_size(), 2);
        tree.insert(ha(&[2], &[1]));
        assert_eq!(tree.basis_size(), 0);
        assert_eq!(tree.basis_index(&[0].into()), None);
        assert_eq!(tree.sort(), 3);
    }

    #[test]
    #[should_panic(expected = "AmplitudeTree::insert()")]
    fn negative_subindex_rejected() {
        let mut tree = AmplitudeTree::new();
        tree.insert(ha(&[1, crate::SPIN], &[0, 0]));
    }
}
