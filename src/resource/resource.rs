//! The `Resource` type itself: a tagged-union value carrying a type tag,
//! descriptor, handle, and optional extractor (spec §3, §4.2).

use std::sync::{Arc, Mutex};

use bitflags::bitflags;
use thiserror::Error;

use crate::ids::ResourceId;

use super::descriptor::ResourceDescriptor;
use super::handle::{BackendHandle, Extractor, HandleState, ResourceHandleValue};
use super::registry::ResourceType;

bitflags! {
    /// A resource's state, a subset of `{Clean, Dirty, Stale, Locked,
    /// Deleted}` (spec §3). More than one bit may be set at once, e.g. a
    /// resource can be both `Locked` and `Stale`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResourceState: u8 {
        /// Ready to read; handle reflects the current descriptor.
        const CLEAN = 0b0000_0001;
        /// Descriptor changed since the handle was last realized.
        const DIRTY = 0b0000_0010;
        /// Handle was realized from an upstream resource that has since
        /// been invalidated.
        const STALE = 0b0000_0100;
        /// Exclusively held; mutation must wait.
        const LOCKED = 0b0000_1000;
        /// Scheduled for (or past) destruction; must not be accessed.
        const DELETED = 0b0001_0000;
    }
}

/// How long a resource is expected to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifetimeClass {
    /// Outlives frames; survives across `RenderFrame` calls.
    Persistent,
    /// Valid only within the producing phase.
    Transient,
    /// Backed by N-of-N rotating copies, N = frames in flight.
    PerFrame,
    /// Drawn from and returned to a pool managed outside the graph.
    Pooled,
}

/// The granularity at which a resource is scoped for cleanup (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceScope {
    NodeLevel,
    TaskLevel,
    InstanceLevel,
}

/// Where a resource's bytes live (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryLocation {
    HostStack,
    HostHeap,
    DeviceLocal,
    HostVisible,
    Staging,
}

/// Errors raised by resource creation, mutation, or access (spec §4.2,
/// §7 `ResourceError`).
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource type registry lookup failed for tag {0:?}")]
    UnknownType(ResourceType),
    #[error("invalid descriptor for resource {0:?}: {1}")]
    InvalidDescriptor(ResourceId, String),
    #[error("resource {0:?} handle is not set")]
    HandleNotSet(ResourceId),
    #[error("resource {0:?} is not Clean (state: {1:?})")]
    NotReady(ResourceId, ResourceState),
    #[error("resource {0:?} descriptor mutation attempted outside Setup/Compile")]
    MutationOutsideSetupOrCompile(ResourceId),
    #[error("resource {0:?} handle-extraction failed: {1}")]
    ExtractionFailed(ResourceId, String),
}

/// A resource: the atomic unit of state flowing between nodes (spec §3).
///
/// Descriptor and handle live behind a `Mutex` so a `DescriptorBinding`
/// can hold an `Arc<Resource>` and re-extract the handle at bind time
/// without ever caching a snapshot (the "lazy handle extraction"
/// invariant) — a binding that stored the handle by value instead would
/// silently go stale the moment the producing node republishes.
pub struct Resource {
    id: ResourceId,
    type_tag: ResourceType,
    descriptor: Mutex<ResourceDescriptor>,
    handle: Mutex<HandleState>,
    extractor: Option<Extractor>,
    lifetime_class: LifetimeClass,
    scope: ResourceScope,
    state: Mutex<ResourceState>,
    size_bytes: u64,
    memory_location: MemoryLocation,
}

impl Resource {
    /// Create a new, not-yet-realized resource.
    pub fn new(
        id: ResourceId,
        type_tag: ResourceType,
        descriptor: ResourceDescriptor,
        lifetime_class: LifetimeClass,
        scope: ResourceScope,
        size_bytes: u64,
        memory_location: MemoryLocation,
    ) -> Result<Self, ResourceError> {
        if !descriptor.is_valid() {
            return Err(ResourceError::InvalidDescriptor(
                id,
                "descriptor failed validation (e.g. zero extent)".to_string(),
            ));
        }
        Ok(Self {
            id,
            type_tag,
            descriptor: Mutex::new(descriptor),
            handle: Mutex::new(HandleState::Unset),
            extractor: None,
            lifetime_class,
            scope,
            state: Mutex::new(ResourceState::DIRTY),
            size_bytes,
            memory_location,
        })
    }

    /// Attach a lazy extractor for a `Generic`-tagged wrapper resource.
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn type_tag(&self) -> ResourceType {
        self.type_tag
    }

    pub fn lifetime_class(&self) -> LifetimeClass {
        self.lifetime_class
    }

    pub fn scope(&self) -> ResourceScope {
        self.scope
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn memory_location(&self) -> MemoryLocation {
        self.memory_location
    }

    pub fn state(&self) -> ResourceState {
        *self.state.lock().unwrap()
    }

    /// Replace the current state bitset.
    pub fn set_state(&self, state: ResourceState) {
        *self.state.lock().unwrap() = state;
    }

    /// A read-only snapshot of the current descriptor.
    pub fn descriptor(&self) -> ResourceDescriptor {
        self.descriptor.lock().unwrap().clone()
    }

    /// Replace the descriptor.
    ///
    /// Per spec §4.2 this is only legal while the owning node is in Setup
    /// or Compile; this primitive does not itself know the owning node's
    /// phase (the `graph` module sits above `resource` in the dependency
    /// order), so phase enforcement happens one layer up, in the
    /// `SetupContext`/`CompileContext` wrappers that are the only way a
    /// node author can reach this method.
    pub fn set_descriptor(&self, descriptor: ResourceDescriptor) -> Result<(), ResourceError> {
        if !descriptor.is_valid() {
            return Err(ResourceError::InvalidDescriptor(
                self.id,
                "descriptor failed validation".to_string(),
            ));
        }
        *self.descriptor.lock().unwrap() = descriptor;
        let mut state = self.state.lock().unwrap();
        *state |= ResourceState::DIRTY;
        *state &= !ResourceState::CLEAN;
        Ok(())
    }

    /// Publish a realized handle value, transitioning `Unset -> Set` (or
    /// replacing a previously-set handle, e.g. after invalidation).
    pub fn publish_handle(&self, value: ResourceHandleValue) {
        *self.handle.lock().unwrap() = HandleState::Set(value);
        let mut state = self.state.lock().unwrap();
        *state |= ResourceState::CLEAN;
        *state &= !(ResourceState::DIRTY | ResourceState::STALE);
    }

    /// Whether the handle has ever been published.
    pub fn is_realized(&self) -> bool {
        self.handle.lock().unwrap().is_set()
    }

    /// Access the handle, applying the extractor lazily if one is
    /// attached. Never caches the result — call this again after any
    /// republication to see the new value (spec §4.2, §8 property 3).
    ///
    /// # Safety contract
    /// Per spec §3, calling this when state is not `Clean` or the
    /// resource is not realized is undefined behavior in the source
    /// system; here it is a recoverable `Result` instead (spec §9,
    /// "Exception-based control flow... replaced by explicit result
    /// types").
    pub fn get_descriptor_handle(&self) -> Result<BackendHandle, ResourceError> {
        let state = *self.state.lock().unwrap();
        if !state.contains(ResourceState::CLEAN) || state.intersects(ResourceState::STALE | ResourceState::DELETED) {
            return Err(ResourceError::NotReady(self.id, state));
        }
        let handle = self.handle.lock().unwrap();
        match &*handle {
            HandleState::Unset => Err(ResourceError::HandleNotSet(self.id)),
            HandleState::Set(value) => match (&self.extractor, value) {
                (Some(extractor), ResourceHandleValue::Generic(inner)) => Ok(extractor(inner.as_ref())),
                (_, other) => other
                    .raw_backend_handle()
                    .ok_or_else(|| ResourceError::ExtractionFailed(self.id, "not a GPU-backed handle".to_string())),
            },
        }
    }

    /// Mark this resource stale without clearing its handle; a subsequent
    /// `publish_handle` clears the flag (used on `SwapChainInvalidated`
    /// and similar invalidation events, spec §8 scenario S3).
    pub fn mark_stale(&self) {
        let mut state = self.state.lock().unwrap();
        *state |= ResourceState::STALE;
        *state &= !ResourceState::CLEAN;
    }
}

/// A non-owning reference to a resource used for descriptor binding at
/// Execute/Compile time. Holding `Arc<Resource>` rather than a copy of
/// the handle is what makes lazy extraction possible.
pub type ResourceRef = Arc<Resource>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::descriptor::BufferDescriptor;
    use slotmap::DefaultKey;

    fn make_id() -> ResourceId {
        ResourceId::new(DefaultKey::default())
    }

    #[test]
    fn new_resource_starts_dirty_and_unrealized() {
        let r = Resource::new(
            make_id(),
            ResourceType::Buffer,
            ResourceDescriptor::Buffer(BufferDescriptor::new(256, 0)),
            LifetimeClass::Transient,
            ResourceScope::NodeLevel,
            256,
            MemoryLocation::DeviceLocal,
        )
        .unwrap();
        assert!(!r.is_realized());
        assert!(r.state().contains(ResourceState::DIRTY));
    }

    #[test]
    fn get_descriptor_handle_rejects_non_clean_state() {
        let r = Resource::new(
            make_id(),
            ResourceType::Buffer,
            ResourceDescriptor::Buffer(BufferDescriptor::new(256, 0)),
            LifetimeClass::Transient,
            ResourceScope::NodeLevel,
            256,
            MemoryLocation::DeviceLocal,
        )
        .unwrap();
        assert!(r.get_descriptor_handle().is_err());
    }

    #[test]
    fn lazy_extraction_observes_republished_handle_without_caching() {
        let r = Arc::new(
            Resource::new(
                make_id(),
                ResourceType::Buffer,
                ResourceDescriptor::Buffer(BufferDescriptor::new(256, 0)),
                LifetimeClass::Transient,
                ResourceScope::NodeLevel,
                256,
                MemoryLocation::DeviceLocal,
            )
            .unwrap(),
        );
        r.publish_handle(ResourceHandleValue::Buffer(1));
        assert_eq!(r.get_descriptor_handle().unwrap(), 1);

        // Simulate SwapChainInvalidated then republication with a new handle.
        r.mark_stale();
        assert!(r.get_descriptor_handle().is_err());
        r.publish_handle(ResourceHandleValue::Buffer(2));
        assert_eq!(r.get_descriptor_handle().unwrap(), 2);
    }

    #[test]
    fn invalid_descriptor_is_rejected_at_construction() {
        let result = Resource::new(
            make_id(),
            ResourceType::Buffer,
            ResourceDescriptor::Buffer(BufferDescriptor::new(0, 0)),
            LifetimeClass::Transient,
            ResourceScope::NodeLevel,
            0,
            MemoryLocation::DeviceLocal,
        );
        assert!(result.is_err());
    }
}
