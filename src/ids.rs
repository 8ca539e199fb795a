//! Stable identity types shared across the runtime.
//!
//! Every long-lived entity in the graph (nodes, edges, resources, event
//! subscriptions) is identified by a [`TypedHandle`](crate::foundation::collections::TypedHandle)
//! over a `slotmap` key, following the same "slotmap-backed handle" idiom
//! the teacher crate uses for asset references. Defining the marker types
//! here — below every other module — lets `event_bus`, `resource`, and
//! `graph` all refer to the same identity types without a dependency
//! cycle between them.

use crate::foundation::collections::TypedHandle;

/// Marker type for [`NodeId`].
#[derive(Debug)]
pub struct NodeMarker;
/// Marker type for [`EdgeId`].
#[derive(Debug)]
pub struct EdgeMarker;
/// Marker type for [`ResourceId`].
#[derive(Debug)]
pub struct ResourceMarker;
/// Marker type for [`SubscriptionId`].
#[derive(Debug)]
pub struct SubscriptionMarker;
/// Marker type for [`TaskId`].
#[derive(Debug)]
pub struct TaskMarker;

/// Stable identity of a node instance, valid for the lifetime of the graph.
pub type NodeId = TypedHandle<NodeMarker>;
/// Stable identity of an edge.
pub type EdgeId = TypedHandle<EdgeMarker>;
/// Stable, pointer-equivalent identity of a resource.
pub type ResourceId = TypedHandle<ResourceMarker>;
/// Identity of one event-bus subscription.
pub type SubscriptionId = TypedHandle<SubscriptionMarker>;
/// Identity of one virtual task emitted during Execute.
pub type TaskId = TypedHandle<TaskMarker>;
