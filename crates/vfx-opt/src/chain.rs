//! Ordered op chain.
//!
//! Applying a chain means applying its ops in order, so order is never
//! changed by anything in this crate. The optimizer only shortens a chain or,
//! with the combine extension, swaps an adjacent pair for one op in the same
//! position.

use std::fmt;

use crate::op::OpRcPtr;

/// Ordered sequence of ops.
#[derive(Debug, Clone, Default)]
pub struct OpChain {
    ops: Vec<OpRcPtr>,
}

impl OpChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing op list.
    pub fn from_ops(ops: Vec<OpRcPtr>) -> Self {
        Self { ops }
    }

    /// Appends an op.
    pub fn push(&mut self, op: OpRcPtr) {
        self.ops.push(op);
    }

    /// Number of ops.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True if the chain holds no ops.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Op at `index`.
    pub fn get(&self, index: usize) -> Option<&OpRcPtr> {
        self.ops.get(index)
    }

    /// Iterates ops in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, OpRcPtr> {
        self.ops.iter()
    }

    /// Ops as a slice.
    pub fn ops(&self) -> &[OpRcPtr] {
        &self.ops
    }

    /// Consumes the chain, returning its ops.
    pub fn into_ops(self) -> Vec<OpRcPtr> {
        self.ops
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&OpRcPtr) -> bool) {
        self.ops.retain(keep);
    }

    /// Removes the ops at `index` and `index + 1`.
    pub(crate) fn remove_pair(&mut self, index: usize) {
        self.ops.drain(index..index + 2);
    }

    /// Replaces the ops at `index` and `index + 1` with `op`.
    pub(crate) fn replace_pair(&mut self, index: usize, op: OpRcPtr) {
        self.ops.splice(index..index + 2, std::iter::once(op));
    }

    /// One line per op, each prefixed with `indent` spaces.
    pub fn serialize(&self, indent: usize) -> String {
        let lines: Vec<String> = self
            .ops
            .iter()
            .enumerate()
            .map(|(i, op)| format!("{:indent$}[{i}] {}", "", op.serialize(0)))
            .collect();
        lines.join("\n")
    }

    /// Applies every op in order to RGBA pixels.
    pub fn apply(&self, pixels: &mut [[f32; 4]]) {
        for op in &self.ops {
            op.apply(pixels);
        }
    }

    /// Applies the chain to RGB pixels, with alpha held at 1.
    pub fn apply_rgb(&self, pixels: &mut [[f32; 3]]) {
        let mut rgba: Vec<[f32; 4]> = pixels.iter().map(|p| [p[0], p[1], p[2], 1.0]).collect();
        self.apply(&mut rgba);
        for (dst, src) in pixels.iter_mut().zip(&rgba) {
            *dst = [src[0], src[1], src[2]];
        }
    }
}

impl fmt::Display for OpChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize(0))
    }
}

impl FromIterator<OpRcPtr> for OpChain {
    fn from_iter<I: IntoIterator<Item = OpRcPtr>>(iter: I) -> Self {
        Self { ops: iter.into_iter().collect() }
    }
}

impl Extend<OpRcPtr> for OpChain {
    fn extend<I: IntoIterator<Item = OpRcPtr>>(&mut self, iter: I) {
        self.ops.extend(iter);
    }
}

impl<'a> IntoIterator for &'a OpChain {
    type Item = &'a OpRcPtr;
    type IntoIter = std::slice::Iter<'a, OpRcPtr>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl From<Vec<OpRcPtr>> for OpChain {
    fn from(ops: Vec<OpRcPtr>) -> Self {
        Self::from_ops(ops)
    }
}
