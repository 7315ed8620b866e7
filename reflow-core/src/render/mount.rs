//! Mount Targets
//!
//! A mount target is the sink a render binding writes into. What it does with
//! the text (patch a DOM node, repaint a terminal, store it) is up to the
//! host; the render layer only hands over a [`RenderOutput`].
//!
//! [`MountPoint`] is an in-memory target and [`Document`] a set of them keyed
//! by selector, which lets hosts resolve targets up front and fail fast when
//! one is missing.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::output::RenderOutput;
use crate::error::{ReactiveError, Result};

/// A sink for rendered content.
pub trait MountTarget {
    /// Replace the target's content.
    fn set_content(&self, content: &RenderOutput);
}

impl<F> MountTarget for F
where
    F: Fn(&RenderOutput),
{
    fn set_content(&self, content: &RenderOutput) {
        self(content)
    }
}

/// In-memory mount target.
///
/// Clones share the same content, so a host can keep one handle and give
/// another to a render binding.
#[derive(Clone, Default)]
pub struct MountPoint {
    inner: Rc<MountInner>,
}

#[derive(Default)]
struct MountInner {
    content: RefCell<String>,
    writes: Cell<usize>,
}

impl MountPoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current content.
    pub fn content(&self) -> String {
        self.inner.content.borrow().clone()
    }

    /// How many times content was written.
    pub fn writes(&self) -> usize {
        self.inner.writes.get()
    }
}

impl MountTarget for MountPoint {
    fn set_content(&self, content: &RenderOutput) {
        *self.inner.content.borrow_mut() = content.to_string();
        self.inner.writes.set(self.inner.writes.get() + 1);
    }
}

impl fmt::Debug for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountPoint")
            .field("content", &*self.inner.content.borrow())
            .field("writes", &self.writes())
            .finish()
    }
}

/// Named mount points.
#[derive(Debug, Default)]
pub struct Document {
    mounts: IndexMap<String, MountPoint>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty mount point under `selector`, or return the existing one.
    pub fn insert(&mut self, selector: impl Into<String>) -> MountPoint {
        self.mounts.entry(selector.into()).or_default().clone()
    }

    /// Look up the mount point for `selector`.
    pub fn mount_point(&self, selector: &str) -> Result<MountPoint> {
        self.mounts
            .get(selector)
            .cloned()
            .ok_or_else(|| ReactiveError::MissingMountTarget {
                selector: selector.to_owned(),
            })
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}
