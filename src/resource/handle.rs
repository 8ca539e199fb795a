//! The realized backend handle behind a resource, and the lazy extractor
//! that projects a backend primitive out of a wrapper value (spec §4.2,
//! "Critical invariant (Lazy handle extraction)").

use std::any::Any;
use std::sync::Arc;

/// An opaque backend object handle. The GPU backend (spec §6) mints these;
/// the core never interprets the bits, only threads them through.
pub type BackendHandle = u64;

/// The realized value behind one resource, variant by [`ResourceType`](super::registry::ResourceType).
///
/// `Generic` carries a type-erased, node-author-defined wrapper value
/// (e.g. a debug ring buffer that owns a backend buffer internally); an
/// [`Extractor`] projects the backend handle out of it lazily, at bind
/// time, rather than ever snapshotting it.
#[derive(Clone)]
pub enum ResourceHandleValue {
    Buffer(BackendHandle),
    Image(BackendHandle),
    ImageView(BackendHandle),
    Sampler(BackendHandle),
    Pipeline(BackendHandle),
    DescriptorSetLayout(BackendHandle),
    AccelerationStructure(BackendHandle),
    RenderPass(BackendHandle),
    CommandPool(BackendHandle),
    Generic(Arc<dyn Any + Send + Sync>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
    String(String),
}

impl std::fmt::Debug for ResourceHandleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffer(h) => write!(f, "Buffer({h})"),
            Self::Image(h) => write!(f, "Image({h})"),
            Self::ImageView(h) => write!(f, "ImageView({h})"),
            Self::Sampler(h) => write!(f, "Sampler({h})"),
            Self::Pipeline(h) => write!(f, "Pipeline({h})"),
            Self::DescriptorSetLayout(h) => write!(f, "DescriptorSetLayout({h})"),
            Self::AccelerationStructure(h) => write!(f, "AccelerationStructure({h})"),
            Self::RenderPass(h) => write!(f, "RenderPass({h})"),
            Self::CommandPool(h) => write!(f, "CommandPool({h})"),
            Self::Generic(_) => write!(f, "Generic(<opaque>)"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Vec2(v) => write!(f, "Vec2({v:?})"),
            Self::Vec3(v) => write!(f, "Vec3({v:?})"),
            Self::Vec4(v) => write!(f, "Vec4({v:?})"),
            Self::Mat4(_) => write!(f, "Mat4(..)"),
            Self::String(v) => write!(f, "String({v:?})"),
        }
    }
}

impl ResourceHandleValue {
    /// The raw backend handle for GPU-tagged variants, without going
    /// through an extractor. Returns `None` for value types and for
    /// `Generic` (which requires an extractor to interpret).
    pub fn raw_backend_handle(&self) -> Option<BackendHandle> {
        match self {
            Self::Buffer(h)
            | Self::Image(h)
            | Self::ImageView(h)
            | Self::Sampler(h)
            | Self::Pipeline(h)
            | Self::DescriptorSetLayout(h)
            | Self::AccelerationStructure(h)
            | Self::RenderPass(h)
            | Self::CommandPool(h) => Some(*h),
            _ => None,
        }
    }
}

/// Whether a resource's handle has been realized yet.
///
/// `Unset` is the default; a resource transitions to `Set` on first
/// publication (spec §4.2, "defaulted to 'unset'; transitions to 'set' on
/// first publication").
#[derive(Clone)]
pub enum HandleState {
    Unset,
    Set(ResourceHandleValue),
}

impl HandleState {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }
}

/// A callback projecting a backend handle out of a `Generic` wrapper
/// value, invoked lazily at bind time and never cached.
///
/// Construct one with [`extractor`], which requires the wrapper's
/// concrete type `W` to be in scope at the call site — a forward
/// declaration of `W` alone cannot satisfy the `Any::downcast_ref::<W>()`
/// call inside, which is this crate's compile-time stand-in for the
/// spec's "the registry must assert otherwise with a compile-time trait
/// check" (spec §4.2).
pub type Extractor = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> BackendHandle + Send + Sync>;

/// Build an [`Extractor`] for a wrapper type `W` that owns an embedded
/// backend handle reachable via `project`.
pub fn extractor<W, F>(project: F) -> Extractor
where
    W: Any + Send + Sync + 'static,
    F: Fn(&W) -> BackendHandle + Send + Sync + 'static,
{
    Arc::new(move |any: &(dyn Any + Send + Sync)| {
        let wrapper = any
            .downcast_ref::<W>()
            .expect("Generic resource handle type does not match the extractor's wrapper type");
        project(wrapper)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DebugRingBuffer {
        backing_buffer: BackendHandle,
    }

    #[test]
    fn extractor_projects_embedded_handle_lazily() {
        let proj = extractor::<DebugRingBuffer, _>(|w| w.backing_buffer);
        let wrapper: Arc<dyn Any + Send + Sync> = Arc::new(DebugRingBuffer { backing_buffer: 42 });
        assert_eq!(proj(wrapper.as_ref()), 42);
    }

    #[test]
    fn raw_backend_handle_only_for_gpu_variants() {
        assert_eq!(ResourceHandleValue::Buffer(7).raw_backend_handle(), Some(7));
        assert_eq!(ResourceHandleValue::Int(7).raw_backend_handle(), None);
    }
}
