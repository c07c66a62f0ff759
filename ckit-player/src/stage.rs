//! Minimal presentation layer
//!
//! A `Stage` is a flat set of named nodes. Each node carries numeric
//! properties (position, opacity, ...) and a list of transient text
//! overlays. Effects mutate it; the scheduler never reads it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info};

/// Identifier of an overlay attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(u64);

/// Transient text attached to a node
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub id: OverlayId,
    pub text: String,
}

#[derive(Debug, Default)]
struct Node {
    properties: BTreeMap<String, f32>,
    overlays: Vec<Overlay>,
}

#[derive(Debug, Default)]
struct StageState {
    nodes: BTreeMap<String, Node>,
    next_overlay: u64,
}

/// Cloneable handle to a shared stage
#[derive(Clone, Default)]
pub struct Stage {
    inner: Rc<RefCell<StageState>>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; adding an existing name is a no-op
    pub fn add_node(&self, name: impl Into<String>) {
        self.inner
            .borrow_mut()
            .nodes
            .entry(name.into())
            .or_default();
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.inner.borrow().nodes.contains_key(name)
    }

    pub fn node_names(&self) -> Vec<String> {
        self.inner.borrow().nodes.keys().cloned().collect()
    }

    pub fn property(&self, node: &str, property: &str) -> Option<f32> {
        self.inner
            .borrow()
            .nodes
            .get(node)
            .and_then(|n| n.properties.get(property).copied())
    }

    /// Set a property, creating the node if needed
    pub fn set_property(&self, node: &str, property: &str, value: f32) {
        self.inner
            .borrow_mut()
            .nodes
            .entry(node.to_string())
            .or_default()
            .properties
            .insert(property.to_string(), value);
    }

    /// Attach a text overlay to `node`, creating the node if needed
    pub fn attach_overlay(&self, node: &str, text: impl Into<String>) -> OverlayId {
        let mut state = self.inner.borrow_mut();
        state.next_overlay += 1;
        let id = OverlayId(state.next_overlay);
        let text = text.into();
        info!(node, text = %text, "Overlay shown");
        state
            .nodes
            .entry(node.to_string())
            .or_default()
            .overlays
            .push(Overlay { id, text });
        id
    }

    /// Remove an overlay; returns `false` if it was not attached
    pub fn detach_overlay(&self, node: &str, id: OverlayId) -> bool {
        let mut state = self.inner.borrow_mut();
        let Some(entry) = state.nodes.get_mut(node) else {
            return false;
        };
        let Some(position) = entry.overlays.iter().position(|o| o.id == id) else {
            return false;
        };
        let overlay = entry.overlays.remove(position);
        debug!(node, text = %overlay.text, "Overlay removed");
        true
    }

    pub fn overlays(&self, node: &str) -> Vec<Overlay> {
        self.inner
            .borrow()
            .nodes
            .get(node)
            .map(|n| n.overlays.clone())
            .unwrap_or_default()
    }

    /// Overlays attached across all nodes
    pub fn overlay_count(&self) -> usize {
        self.inner
            .borrow()
            .nodes
            .values()
            .map(|n| n.overlays.len())
            .sum()
    }
}

impl fmt::Display for Stage {
    /// One line per node: `name: prop=value ... ["overlay", ...]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        for (name, node) in &state.nodes {
            write!(f, "{}:", name)?;
            for (property, value) in &node.properties {
                write!(f, " {}={:.2}", property, value)?;
            }
            if !node.overlays.is_empty() {
                let texts: Vec<_> = node.overlays.iter().map(|o| o.text.as_str()).collect();
                write!(f, " {:?}", texts)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("nodes", &self.inner.borrow().nodes.len())
            .field("overlays", &self.overlay_count())
            .finish()
    }
}
