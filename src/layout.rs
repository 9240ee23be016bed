//! Layered key table with parent inheritance.
//!
//! A [`Layout`] holds `layer_count x button_count` slots. Only slots the user
//! defined are stored; every other slot resolves through the layer's parent
//! chain, ending at the all-zero [`KeyDef`] when a layer has no parent.
//!
//! Invariants kept by the mutators:
//! - layer 0 never has a parent
//! - the parent relation is acyclic
//! - every in-range `(layer, button)` resolves

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::LayoutError;
use crate::keydef::KeyDef;

/// Layers on the reference controller
pub const DEFAULT_LAYER_COUNT: usize = 16;

/// Buttons on the reference (GH60) board
pub const DEFAULT_BUTTON_COUNT: usize = 61;

/// Bytes per `(layer, button)` record in the binary form
pub const RECORD_SIZE: usize = 3;

/// Largest layer count a layout file may declare
pub const MAX_LAYER_COUNT: usize = 256;

/// Largest button count a layout file may declare
pub const MAX_BUTTON_COUNT: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    layer_count: usize,
    button_count: usize,
    keys: BTreeMap<(usize, usize), KeyDef>,
    parents: Vec<Option<usize>>,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(DEFAULT_LAYER_COUNT, DEFAULT_BUTTON_COUNT)
    }
}

impl Layout {
    /// Empty layout: nothing defined, no parents
    pub fn new(layer_count: usize, button_count: usize) -> Self {
        Self {
            layer_count,
            button_count,
            keys: BTreeMap::new(),
            parents: vec![None; layer_count],
        }
    }

    /// Reject dimensions read from untrusted input before allocating
    pub fn check_dimensions(layer_count: usize, button_count: usize) -> Result<(), LayoutError> {
        if (1..=MAX_LAYER_COUNT).contains(&layer_count)
            && (1..=MAX_BUTTON_COUNT).contains(&button_count)
        {
            Ok(())
        } else {
            Err(LayoutError::InvalidDimensions {
                layers: layer_count,
                buttons: button_count,
            })
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    pub fn button_count(&self) -> usize {
        self.button_count
    }

    /// Size of the binary form
    pub fn blob_len(&self) -> usize {
        self.layer_count * self.button_count * RECORD_SIZE
    }

    fn check_layer(&self, layer: usize) -> Result<(), LayoutError> {
        if layer < self.layer_count {
            Ok(())
        } else {
            Err(LayoutError::LayerOutOfRange {
                layer,
                count: self.layer_count,
            })
        }
    }

    fn check_slot(&self, layer: usize, button: usize) -> Result<(), LayoutError> {
        self.check_layer(layer)?;
        if button < self.button_count {
            Ok(())
        } else {
            Err(LayoutError::ButtonOutOfRange {
                button,
                count: self.button_count,
            })
        }
    }

    /// Effective definition of a slot.
    ///
    /// A value stored on `layer` comes back with `inherited = false`. Anything
    /// found by walking parents, or the all-zero default at the end of the
    /// chain, comes back with `inherited = true`.
    pub fn resolve(&self, layer: usize, button: usize) -> Result<KeyDef, LayoutError> {
        self.check_slot(layer, button)?;

        let mut current = layer;
        for _ in 0..=self.layer_count {
            if let Some(key) = self.keys.get(&(current, button)) {
                return Ok(if current == layer {
                    key.as_defined()
                } else {
                    key.as_inherited()
                });
            }
            match self.parents[current] {
                Some(parent) => current = parent,
                None => return Ok(KeyDef::inherited()),
            }
        }
        Err(LayoutError::CyclicInheritance(layer))
    }

    /// Alias for [`Layout::resolve`]
    pub fn get(&self, layer: usize, button: usize) -> Result<KeyDef, LayoutError> {
        self.resolve(layer, button)
    }

    /// Define a slot, or clear it with `None` so it inherits again
    pub fn set(
        &mut self,
        layer: usize,
        button: usize,
        key: Option<KeyDef>,
    ) -> Result<(), LayoutError> {
        self.check_slot(layer, button)?;
        match key {
            Some(key) => {
                self.keys.insert((layer, button), key.as_defined());
            }
            None => {
                self.keys.remove(&(layer, button));
            }
        }
        Ok(())
    }

    /// The stored (non-inherited) value of a slot, if any
    pub fn defined(&self, layer: usize, button: usize) -> Result<Option<KeyDef>, LayoutError> {
        self.check_slot(layer, button)?;
        Ok(self.keys.get(&(layer, button)).copied())
    }

    /// Stored entries in layer-major, button-minor order
    pub fn defined_entries(&self) -> impl Iterator<Item = (usize, usize, KeyDef)> + '_ {
        self.keys
            .iter()
            .map(|(&(layer, button), &key)| (layer, button, key))
    }

    pub fn get_parent(&self, layer: usize) -> Result<Option<usize>, LayoutError> {
        self.check_layer(layer)?;
        Ok(self.parents[layer])
    }

    /// Parent pointer of every layer, indexed by layer
    pub fn parents(&self) -> &[Option<usize>] {
        &self.parents
    }

    /// Point `layer` at a new parent, or detach it with `None`.
    ///
    /// Rejects parents on layer 0, self-parents, out-of-range parents and
    /// edges that would close a cycle. The parent table is untouched on error.
    pub fn set_parent(&mut self, layer: usize, parent: Option<usize>) -> Result<(), LayoutError> {
        self.check_layer(layer)?;
        let Some(parent) = parent else {
            self.parents[layer] = None;
            return Ok(());
        };

        let invalid = |reason| LayoutError::InvalidParent {
            layer,
            parent,
            reason,
        };
        if layer == 0 {
            return Err(invalid("layer 0 cannot have a parent"));
        }
        if parent >= self.layer_count {
            return Err(invalid("parent layer out of range"));
        }
        if parent == layer {
            return Err(invalid("a layer cannot inherit from itself"));
        }

        // Walk up from the proposed parent; reaching `layer` means a cycle.
        let mut current = parent;
        for _ in 0..self.layer_count {
            match self.parents[current] {
                Some(p) if p == layer => return Err(invalid("would create an inheritance cycle")),
                Some(p) => current = p,
                None => {
                    debug!(layer, parent, "Set layer parent");
                    self.parents[layer] = Some(parent);
                    return Ok(());
                }
            }
        }
        Err(LayoutError::CyclicInheritance(parent))
    }

    /// Clear every stored entry on `layer`
    pub fn inherit_all(&mut self, layer: usize) -> Result<(), LayoutError> {
        self.check_layer(layer)?;
        let before = self.keys.len();
        self.keys.retain(|&(l, _), _| l != layer);
        debug!(layer, cleared = before - self.keys.len(), "Cleared layer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;

    fn key(scancode: u8) -> KeyDef {
        KeyDef::new(scancode, Action::NoAct, Action::NoAct)
    }

    #[test]
    fn empty_layout_resolves_to_default() {
        let layout = Layout::default();
        assert_eq!(layout.layer_count(), 16);
        assert_eq!(layout.button_count(), 61);
        let k = layout.resolve(15, 60).unwrap();
        assert!(k.is_empty());
        assert!(k.is_inherited());
    }

    #[test]
    fn child_inherits_from_parent() {
        let mut layout = Layout::new(16, 61);
        layout.set(0, 10, Some(key(0x04))).unwrap();
        layout.set_parent(1, Some(0)).unwrap();

        let k = layout.resolve(1, 10).unwrap();
        assert_eq!(k, key(0x04));
        assert!(k.is_inherited());

        let own = layout.resolve(0, 10).unwrap();
        assert!(!own.is_inherited());
    }

    #[test]
    fn defined_entry_shadows_parent() {
        let mut layout = Layout::new(4, 4);
        layout.set(0, 1, Some(key(0x04))).unwrap();
        layout.set(1, 1, Some(key(0x05))).unwrap();
        layout.set_parent(1, Some(0)).unwrap();
        assert_eq!(layout.resolve(1, 1).unwrap(), key(0x05));

        layout.set(1, 1, None).unwrap();
        assert_eq!(layout.resolve(1, 1).unwrap(), key(0x04));
    }

    #[test]
    fn chain_resolution() {
        let mut layout = Layout::new(4, 2);
        layout.set(0, 0, Some(key(0x29))).unwrap();
        layout.set_parent(1, Some(0)).unwrap();
        layout.set_parent(2, Some(1)).unwrap();
        layout.set_parent(3, Some(2)).unwrap();
        assert_eq!(layout.resolve(3, 0).unwrap(), key(0x29));
        assert!(layout.resolve(3, 1).unwrap().is_empty());
    }

    #[test]
    fn set_stores_defined_value() {
        let mut layout = Layout::new(2, 2);
        layout.set(1, 0, Some(key(0x04).as_inherited())).unwrap();
        assert!(!layout.defined(1, 0).unwrap().unwrap().is_inherited());
        assert!(!layout.resolve(1, 0).unwrap().is_inherited());
    }

    #[test]
    fn out_of_range_coordinates() {
        let mut layout = Layout::new(16, 61);
        assert!(matches!(
            layout.resolve(16, 0),
            Err(LayoutError::LayerOutOfRange {
                layer: 16,
                count: 16
            })
        ));
        assert!(matches!(
            layout.resolve(0, 61),
            Err(LayoutError::ButtonOutOfRange {
                button: 61,
                count: 61
            })
        ));
        assert!(layout.set(0, 61, Some(key(1))).is_err());
        assert!(layout.get_parent(16).is_err());
    }

    #[test]
    fn layer_zero_cannot_have_parent() {
        let mut layout = Layout::new(4, 1);
        assert!(matches!(
            layout.set_parent(0, Some(1)),
            Err(LayoutError::InvalidParent { layer: 0, .. })
        ));
        layout.set_parent(0, None).unwrap();
        assert_eq!(layout.get_parent(0).unwrap(), None);
    }

    #[test]
    fn rejects_self_and_out_of_range_parent() {
        let mut layout = Layout::new(4, 1);
        assert!(layout.set_parent(2, Some(2)).is_err());
        assert!(layout.set_parent(2, Some(4)).is_err());
        assert_eq!(layout.get_parent(2).unwrap(), None);
    }

    #[test]
    fn cycle_is_rejected_and_table_unchanged() {
        let mut layout = Layout::new(4, 1);
        layout.set_parent(1, Some(2)).unwrap();
        layout.set_parent(2, Some(3)).unwrap();
        let before = layout.parents().to_vec();

        assert!(matches!(
            layout.set_parent(3, Some(1)),
            Err(LayoutError::InvalidParent { layer: 3, parent: 1, .. })
        ));
        assert_eq!(layout.parents(), before.as_slice());
        assert!(layout.resolve(1, 0).is_ok());
    }

    #[test]
    fn set_parent_does_not_touch_keys() {
        let mut layout = Layout::new(3, 2);
        layout.set(2, 1, Some(key(0x10))).unwrap();
        layout.set_parent(2, Some(1)).unwrap();
        layout.set_parent(2, None).unwrap();
        assert_eq!(layout.defined(2, 1).unwrap(), Some(key(0x10)));
    }

    #[test]
    fn reparenting_is_allowed() {
        let mut layout = Layout::new(4, 1);
        layout.set_parent(2, Some(1)).unwrap();
        layout.set_parent(2, Some(0)).unwrap();
        assert_eq!(layout.get_parent(2).unwrap(), Some(0));
    }

    #[test]
    fn inherit_all_clears_one_layer() {
        let mut layout = Layout::new(3, 3);
        for b in 0..3 {
            layout.set(1, b, Some(key(0x04 + b as u8))).unwrap();
            layout.set(2, b, Some(key(0x10))).unwrap();
        }
        layout.inherit_all(1).unwrap();
        assert_eq!(layout.defined_entries().filter(|e| e.0 == 1).count(), 0);
        assert_eq!(layout.defined_entries().filter(|e| e.0 == 2).count(), 3);
    }

    #[test]
    fn defined_entries_order() {
        let mut layout = Layout::new(3, 3);
        layout.set(2, 0, Some(key(3))).unwrap();
        layout.set(0, 2, Some(key(2))).unwrap();
        layout.set(0, 1, Some(key(1))).unwrap();
        let order: Vec<_> = layout.defined_entries().map(|(l, b, _)| (l, b)).collect();
        assert_eq!(order, vec![(0, 1), (0, 2), (2, 0)]);
    }

    #[test]
    fn blob_len() {
        assert_eq!(Layout::new(16, 61).blob_len(), 2928);
    }
}
