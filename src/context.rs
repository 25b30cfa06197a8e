//! Per-validation mutable state.
//!
//! An [`EvalContext`] is created at the top of each validate call, mutated
//! as validators descend, consulted when `unevaluated*` validators execute,
//! and discarded on return. It owns the annotation frame stack, the dynamic
//! scope for `$dynamicRef`, and the runtime reference stack used for cycle
//! detection.

use crate::schema::Schema;
use ahash::AHashSet;
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use url::Url;

/// A cloneable handle that aborts in-flight validation when cancelled.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Validators observe the flag at the top of each
    /// sub-schema evaluation and at reference crossings.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Bitmap of evaluated array positions.
#[derive(Debug, Default, Clone)]
pub(crate) struct ItemSet {
    blocks: Vec<u64>,
}

impl ItemSet {
    pub(crate) fn insert(&mut self, index: usize) {
        let block = index / 64;
        if block >= self.blocks.len() {
            self.blocks.resize(block + 1, 0);
        }
        self.blocks[block] |= 1 << (index % 64);
    }

    pub(crate) fn contains(&self, index: usize) -> bool {
        self.blocks
            .get(index / 64)
            .map_or(false, |block| block & (1 << (index % 64)) != 0)
    }

    fn union(&mut self, other: &ItemSet) {
        if other.blocks.len() > self.blocks.len() {
            self.blocks.resize(other.blocks.len(), 0);
        }
        for (mine, theirs) in self.blocks.iter_mut().zip(&other.blocks) {
            *mine |= theirs;
        }
    }

    fn indices(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        for (block_index, block) in self.blocks.iter().enumerate() {
            let mut bits = *block;
            while bits != 0 {
                let offset = bits.trailing_zeros() as usize;
                indices.push(block_index * 64 + offset);
                bits &= bits - 1;
            }
        }
        indices
    }
}

/// Annotations recorded while validating one instance location.
#[derive(Debug, Default)]
pub(crate) struct Frame {
    properties: AHashSet<String>,
    items: ItemSet,
}

impl Frame {
    fn merge(&mut self, other: Frame) {
        self.properties.extend(other.properties);
        self.items.union(&other.items);
    }
}

/// The annotation tables produced by a successful top-level evaluation:
/// which root-instance properties and items were evaluated by any keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub evaluated_properties: Vec<String>,
    pub evaluated_items: Vec<usize>,
}

/// One dynamic-scope entry: the identity of an entered schema node and the
/// base URI of the resource it belongs to.
#[derive(Debug, Clone)]
pub(crate) struct ScopeEntry {
    pub(crate) schema: Schema,
    pub(crate) base_uri: Arc<Url>,
}

pub(crate) struct EvalContext<'c> {
    frames: Vec<Frame>,
    scopes: Vec<ScopeEntry>,
    references: Vec<(String, usize)>,
    cancellation: Option<&'c Cancellation>,
}

impl<'c> EvalContext<'c> {
    pub(crate) fn new(cancellation: Option<&'c Cancellation>) -> Self {
        Self {
            frames: vec![Frame::default()],
            scopes: Vec::new(),
            references: Vec::new(),
            cancellation,
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation.map_or(false, Cancellation::is_cancelled)
    }

    fn current(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack is never empty")
    }

    pub(crate) fn mark_property(&mut self, name: &str) {
        if !self.current().properties.contains(name) {
            self.current().properties.insert(name.to_owned());
        }
    }

    pub(crate) fn mark_item(&mut self, index: usize) {
        self.current().items.insert(index);
    }

    pub(crate) fn property_evaluated(&self, name: &str) -> bool {
        self.frames
            .last()
            .expect("frame stack is never empty")
            .properties
            .contains(name)
    }

    pub(crate) fn item_evaluated(&self, index: usize) -> bool {
        self.frames
            .last()
            .expect("frame stack is never empty")
            .items
            .contains(index)
    }

    /// Open a scratch frame. Every `push_frame` is paired with either
    /// [`merge_frame`](Self::merge_frame) (keep the annotations) or
    /// [`discard_frame`](Self::discard_frame) (drop them).
    pub(crate) fn push_frame(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Fold the top frame's annotations into the frame below.
    pub(crate) fn merge_frame(&mut self) {
        let frame = self.frames.pop().expect("unbalanced frame stack");
        self.current().merge(frame);
    }

    pub(crate) fn discard_frame(&mut self) {
        self.frames.pop().expect("unbalanced frame stack");
    }

    /// Detach the top frame so the caller can decide later whether to keep
    /// it; re-attach with [`absorb_frame`](Self::absorb_frame).
    pub(crate) fn take_frame(&mut self) -> Frame {
        self.frames.pop().expect("unbalanced frame stack")
    }

    pub(crate) fn absorb_frame(&mut self, frame: Frame) {
        self.current().merge(frame);
    }

    pub(crate) fn annotations(&self) -> Annotations {
        let frame = self.frames.last().expect("frame stack is never empty");
        let mut evaluated_properties: Vec<String> =
            frame.properties.iter().cloned().collect();
        evaluated_properties.sort_unstable();
        Annotations {
            evaluated_properties,
            evaluated_items: frame.items.indices(),
        }
    }

    pub(crate) fn push_scope(&mut self, entry: ScopeEntry) {
        self.scopes.push(entry);
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Dynamic scope from outermost to innermost.
    pub(crate) fn scopes(&self) -> impl Iterator<Item = &ScopeEntry> {
        self.scopes.iter()
    }

    /// Record a reference crossing. Returns `false` when the same reference
    /// is already in flight for the same instance value, which means the
    /// evaluation is cycling without making progress.
    pub(crate) fn enter_reference(&mut self, reference: &str, instance: &Value) -> bool {
        let address = instance as *const Value as usize;
        if self
            .references
            .iter()
            .any(|(active, at)| active == reference && *at == address)
        {
            return false;
        }
        self.references.push((reference.to_owned(), address));
        true
    }

    pub(crate) fn leave_reference(&mut self) {
        self.references.pop();
    }
}
