//! # Graph
//!
//! The node/slot type system, connection rules, dependency topology, and
//! the multi-phase compiler that turns a declared graph into an
//! [`ExecutionPlan`] (spec §3, §4.1, §4.3, §4.4). Sits directly above the
//! lifetime/aliasing and calibration subsystems in the dependency order;
//! the scheduler and backend consume what this module produces.

mod compiler;
mod context;
mod edge;
mod error;
mod graph;
mod node;
mod plan;
mod rules;
mod slot;
mod task;
mod topology;

#[cfg(feature = "testing")]
pub mod testing;

pub use compiler::Compiler;
pub use context::{CleanupContext, CompileContext, ExecuteContext, ParamValue, SetupContext};
pub use edge::{Edge, Modifier, SortOrder};
pub use error::GraphError;
pub use graph::{FrameResult, Graph, NodeFactory};
pub use node::{Bundle, Node, NodeBehavior, PhaseState};
pub use plan::{DescriptorBinding, ExecutionPlan, PlanStep};
pub use rules::{build_edge, default_rules, validate_connection, ConnectionContext, ConnectionRule};
pub use slot::{InputSlotDesc, NodeSchema, OutputSlotDesc, SlotIndex, SlotRole};
pub use task::VirtualTask;
pub use topology::Topology;
