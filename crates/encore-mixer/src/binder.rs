//! Channel effect binder.
//!
//! Attaches effect instances to channels and owns their backend resources.
//! Each live effect is held by an [`FxHandle`], which releases the backend
//! resource when dropped; removing a [`Binding`] from the binder (explicit
//! unbind, channel release, re-bind of the same slot, or dropping the binder)
//! is therefore always enough to free it.
//!
//! # Invariants
//!
//! - At most one binding per (channel, slot key). Binding an occupied slot
//!   releases the previous resource first.
//! - A failed [`bind`](EffectBinder::bind) leaves nothing behind: if the
//!   parameters are rejected, the freshly allocated resource is released
//!   before the error is returned.
//! - A failed [`rebind`](EffectBinder::rebind) keeps the last successfully
//!   applied parameters.
//!
//! Failures are logged here, with the backend's error code, and returned to
//! the caller. The channel itself keeps playing without the effect.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use encore_core::{EffectParams, EffectSlot, EffectType};

use crate::backend::{AudioBackend, ChannelId, RawFxHandle};
use crate::{Error, Result};

/// Identifier of a binding, unique for the lifetime of one binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub(crate) u64);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fx{}", self.0)
    }
}

/// Scoped ownership of one backend effect resource.
///
/// Acquired with [`FxHandle::acquire`]; released on drop.
pub struct FxHandle {
    backend: Arc<dyn AudioBackend>,
    channel: ChannelId,
    raw: RawFxHandle,
    effect: EffectType,
}

impl FxHandle {
    /// Allocate an effect resource of type `effect` on `channel`.
    pub fn acquire(
        backend: &Arc<dyn AudioBackend>,
        channel: ChannelId,
        effect: EffectType,
    ) -> Result<Self> {
        match backend.channel_set_fx(channel, effect, 0) {
            Some(raw) => Ok(Self {
                backend: Arc::clone(backend),
                channel,
                raw,
                effect,
            }),
            None => Err(Error::EffectAllocation {
                channel,
                effect,
                code: backend.last_error(),
            }),
        }
    }

    /// Push an encoded parameter block to the resource.
    fn apply(&self, params: &EffectParams) -> Result<()> {
        if self.backend.fx_set_parameters(self.raw, &params.encode()) {
            Ok(())
        } else {
            Err(Error::ParameterApply {
                effect: self.effect,
                code: self.backend.last_error(),
            })
        }
    }

    /// Backend identifier of the resource.
    pub fn raw(&self) -> RawFxHandle {
        self.raw
    }

    /// Channel the resource lives on.
    pub fn channel(&self) -> ChannelId {
        self.channel
    }
}

impl Drop for FxHandle {
    fn drop(&mut self) {
        if !self.backend.channel_remove_fx(self.channel, self.raw) {
            // The backend may already have torn the channel down with its effects.
            tracing::debug!(
                channel = %self.channel,
                effect = %self.effect,
                code = %self.backend.last_error(),
                "effect resource already released"
            );
        }
    }
}

impl fmt::Debug for FxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FxHandle")
            .field("channel", &self.channel)
            .field("raw", &self.raw)
            .field("effect", &self.effect)
            .finish_non_exhaustive()
    }
}

/// One effect attached to one channel.
#[derive(Debug)]
pub struct Binding {
    id: BindingId,
    slot: EffectSlot,
    handle: FxHandle,
    params: EffectParams,
}

impl Binding {
    /// Binding identifier.
    pub fn id(&self) -> BindingId {
        self.id
    }

    /// Channel the effect is attached to.
    pub fn channel(&self) -> ChannelId {
        self.handle.channel
    }

    /// Slot the effect occupies.
    pub fn slot(&self) -> EffectSlot {
        self.slot
    }

    /// Last successfully applied parameters.
    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    /// Backend resource identifier.
    pub fn raw_handle(&self) -> RawFxHandle {
        self.handle.raw
    }
}

/// Attaches, updates and releases channel effects.
pub struct EffectBinder {
    backend: Arc<dyn AudioBackend>,
    bindings: HashMap<BindingId, Binding>,
    by_slot: HashMap<(ChannelId, EffectSlot), BindingId>,
    next_id: u64,
}

impl EffectBinder {
    /// Create a binder over `backend`.
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            bindings: HashMap::new(),
            by_slot: HashMap::new(),
            next_id: 0,
        }
    }

    /// Attach an effect in `slot` on `channel` with `params`.
    ///
    /// Replaces any binding already occupying the slot.
    pub fn bind(
        &mut self,
        channel: ChannelId,
        slot: EffectSlot,
        params: EffectParams,
    ) -> Result<BindingId> {
        if !slot.accepts(&params) {
            let err = Error::SlotMismatch {
                slot,
                effect: params.effect_type(),
            };
            tracing::error!(channel = %channel, "{err}");
            return Err(err);
        }

        if let Some(previous) = self.binding_for(channel, slot).map(Binding::id) {
            tracing::debug!(channel = %channel, %slot, binding = %previous, "replacing binding");
            self.unbind(previous);
        }

        let handle = FxHandle::acquire(&self.backend, channel, slot.effect_type())
            .inspect_err(|err| {
                tracing::error!(
                    channel = %channel,
                    %slot,
                    "failed to create effects handle: {err}"
                );
            })?;

        if let Err(err) = handle.apply(&params) {
            tracing::error!(channel = %channel, %slot, "failed to apply effects parameters: {err}");
            drop(handle);
            return Err(err);
        }

        self.next_id += 1;
        let id = BindingId(self.next_id);
        tracing::debug!(
            channel = %channel,
            %slot,
            binding = %id,
            raw = handle.raw.0,
            "effect bound"
        );
        self.by_slot.insert((channel, slot.key()), id);
        self.bindings.insert(
            id,
            Binding {
                id,
                slot,
                handle,
                params,
            },
        );
        Ok(id)
    }

    /// Release a binding. Unknown or already released ids are ignored.
    ///
    /// Returns `true` if a resource was released.
    pub fn unbind(&mut self, id: BindingId) -> bool {
        let Some(binding) = self.bindings.remove(&id) else {
            return false;
        };
        self.by_slot.remove(&(binding.channel(), binding.slot.key()));
        tracing::debug!(
            channel = %binding.channel(),
            slot = %binding.slot,
            binding = %id,
            "effect unbound"
        );
        true
    }

    /// Apply new parameters to an existing binding without reallocating.
    pub fn rebind(&mut self, id: BindingId, params: EffectParams) -> Result<()> {
        let binding = self.bindings.get_mut(&id).ok_or(Error::UnknownBinding(id))?;
        if !binding.slot.accepts(&params) {
            return Err(Error::SlotMismatch {
                slot: binding.slot,
                effect: params.effect_type(),
            });
        }
        match binding.handle.apply(&params) {
            Ok(()) => {
                binding.params = params;
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    channel = %binding.channel(),
                    slot = %binding.slot,
                    binding = %id,
                    "failed to update effects parameters: {err}"
                );
                Err(err)
            }
        }
    }

    /// Release every binding on `channel`. Returns how many were released.
    pub fn release_channel(&mut self, channel: ChannelId) -> usize {
        let ids = self.bindings_on(channel);
        for id in &ids {
            self.unbind(*id);
        }
        ids.len()
    }

    /// Look up a binding.
    pub fn binding(&self, id: BindingId) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    /// Binding occupying `slot` on `channel`, if any.
    pub fn binding_for(&self, channel: ChannelId, slot: EffectSlot) -> Option<&Binding> {
        self.by_slot
            .get(&(channel, slot.key()))
            .and_then(|id| self.bindings.get(id))
    }

    /// Ids of all bindings on `channel`, in creation order.
    pub fn bindings_on(&self, channel: ChannelId) -> Vec<BindingId> {
        let mut ids: Vec<BindingId> = self
            .bindings
            .values()
            .filter(|b| b.channel() == channel)
            .map(Binding::id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of live bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no bindings are live.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for EffectBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectBinder")
            .field("backend", &self.backend.name())
            .field("bindings", &self.bindings.len())
            .finish()
    }
}
