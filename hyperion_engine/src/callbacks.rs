//! Typed event bus
//!
//! Listeners are registered per event key, either as one-shot (`once`) or
//! persistent (`on`). A key triggered with `trigger_persisted` stays in the
//! triggered state: listeners registered afterwards run immediately with the
//! last arguments.

use std::hash::Hash;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::graphics_device::Extent2D;

new_key_type! {
    /// Handle to a registered listener
    pub struct CallbackId;
}

type Listener<A> = Box<dyn FnMut(&A)>;

struct EventHolder<A> {
    once: Vec<CallbackId>,
    on: Vec<CallbackId>,
    /// Arguments of the last trigger while in the persisted state
    persisted: Option<A>,
}

impl<A> Default for EventHolder<A> {
    fn default() -> Self {
        Self {
            once: Vec::new(),
            on: Vec::new(),
            persisted: None,
        }
    }
}

pub struct Callbacks<E, A> {
    listeners: SlotMap<CallbackId, Listener<A>>,
    holders: FxHashMap<E, EventHolder<A>>,
}

impl<E: Copy + Eq + Hash, A: Clone> Callbacks<E, A> {
    pub fn new() -> Self {
        Self {
            listeners: SlotMap::with_key(),
            holders: FxHashMap::default(),
        }
    }

    /// Run `listener` on the next trigger of `key` only
    ///
    /// If `key` is in the persisted state the listener runs right away and
    /// is not stored; `None` is returned.
    pub fn once(&mut self, key: E, listener: impl FnMut(&A) + 'static) -> Option<CallbackId> {
        let mut listener: Listener<A> = Box::new(listener);
        let holder = self.holders.entry(key).or_default();

        if let Some(args) = &holder.persisted {
            listener(args);
            return None;
        }

        let id = self.listeners.insert(listener);
        holder.once.push(id);
        Some(id)
    }

    /// Run `listener` on every trigger of `key`
    pub fn on(&mut self, key: E, listener: impl FnMut(&A) + 'static) -> CallbackId {
        let mut listener: Listener<A> = Box::new(listener);
        let holder = self.holders.entry(key).or_default();

        if let Some(args) = &holder.persisted {
            listener(args);
        }

        let id = self.listeners.insert(listener);
        holder.on.push(id);
        id
    }

    /// Fire every listener of `key`: one-shot listeners first, then persistent ones
    pub fn trigger(&mut self, key: E, args: A) {
        self.fire(key, args, false);
    }

    /// Like `trigger`, and keep `key` triggered for listeners added later
    pub fn trigger_persisted(&mut self, key: E, args: A) {
        self.fire(key, args, true);
    }

    /// Fire the single listener `id`; returns whether it ran
    ///
    /// A one-shot listener is dropped after running.
    pub fn trigger_specific(&mut self, key: E, id: CallbackId, args: A) -> bool {
        let Some(holder) = self.holders.get_mut(&key) else {
            return false;
        };

        if let Some(position) = holder.once.iter().position(|once| *once == id) {
            holder.once.remove(position);
            if let Some(mut listener) = self.listeners.remove(id) {
                listener(&args);
                return true;
            }
            return false;
        }

        if holder.on.contains(&id) {
            if let Some(listener) = self.listeners.get_mut(id) {
                listener(&args);
                return true;
            }
        }
        false
    }

    /// Unregister a listener; returns whether it was registered under `key`
    pub fn remove(&mut self, key: E, id: CallbackId) -> bool {
        let Some(holder) = self.holders.get_mut(&key) else {
            return false;
        };

        let before = holder.once.len() + holder.on.len();
        holder.once.retain(|once| *once != id);
        holder.on.retain(|on| *on != id);
        if holder.once.len() + holder.on.len() == before {
            return false;
        }

        self.listeners.remove(id);
        true
    }

    /// `key` stays triggered for new listeners
    pub fn is_persisted(&self, key: E) -> bool {
        self.holders.get(&key).is_some_and(|holder| holder.persisted.is_some())
    }

    /// Number of listeners waiting on `key`
    pub fn listener_count(&self, key: E) -> usize {
        self.holders.get(&key).map_or(0, |holder| holder.once.len() + holder.on.len())
    }

    fn fire(&mut self, key: E, args: A, persist: bool) {
        let holder = self.holders.entry(key).or_default();
        let once = std::mem::take(&mut holder.once);
        let on = holder.on.clone();

        if persist || holder.persisted.is_some() {
            holder.persisted = Some(args.clone());
        }

        for id in once {
            if let Some(mut listener) = self.listeners.remove(id) {
                listener(&args);
            }
        }

        for id in on {
            if let Some(listener) = self.listeners.get_mut(id) {
                listener(&args);
            }
        }
    }
}

impl<E: Copy + Eq + Hash, A: Clone> Default for Callbacks<E, A> {
    fn default() -> Self {
        Self::new()
    }
}

// ===== ENGINE EVENTS =====

/// Engine lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineEvent {
    CreateSpatials,
    DestroySpatials,
    CreateMeshes,
    DestroyMeshes,
    CreateTextures,
    DestroyTextures,
    CreateMaterials,
    DestroyMaterials,
    CreateShaders,
    DestroyShaders,
    CreateGraphicsPipelines,
    DestroyGraphicsPipelines,
    CreateComputePipelines,
    DestroyComputePipelines,
}

/// Arguments passed to engine event listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineEventArgs {
    pub frames_in_flight: u32,
    pub extent: Extent2D,
}

pub type EngineCallbacks = Callbacks<EngineEvent, EngineEventArgs>;

#[cfg(test)]
#[path = "callbacks_tests.rs"]
mod tests;
