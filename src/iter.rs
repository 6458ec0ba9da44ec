//! Lazy traversal over the contents of a tree.
use std::slice;

use crate::metric::Scalar;
use crate::node::VPNode;

/// Iterator over the leaf bins of a tree, closer subtrees first.
pub struct Leaves<'a, F: Scalar, T: 'a> {
    stack: Vec<&'a VPNode<F, T>>,
}

impl<'a, F: Scalar, T: 'a> Leaves<'a, F, T> {
    pub(crate) fn new(root: &'a VPNode<F, T>) -> Self {
        Leaves { stack: vec![root] }
    }
}

impl<'a, F: Scalar, T: 'a> Iterator for Leaves<'a, F, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<&'a [T]> {
        while let Some(node) = self.stack.pop() {
            match *node {
                VPNode::Leaf(ref points) => return Some(&points[..]),
                VPNode::Branch { ref closer, ref farther, .. } => {
                    self.stack.push(farther);
                    self.stack.push(closer);
                }
            }
        }
        None
    }
}

/// Iterator over every stored point. No ordering across leaves is
/// promised.
pub struct Iter<'a, F: Scalar, T: 'a> {
    leaves: Leaves<'a, F, T>,
    current: slice::Iter<'a, T>,
}

impl<'a, F: Scalar, T: 'a> Iter<'a, F, T> {
    pub(crate) fn new(root: &'a VPNode<F, T>) -> Self {
        Iter {
            leaves: Leaves::new(root),
            current: [].iter(),
        }
    }
}

impl<'a, F: Scalar, T: 'a> Iterator for Iter<'a, F, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(item) = self.current.next() {
                return Some(item);
            }
            self.current = self.leaves.next()?.iter();
        }
    }
}
