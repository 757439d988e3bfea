//! The block pipeline: everything that happens to one vector between a typed
//! slice and its serialized blocks.
//!
//! * `partition` splits an index range into ordered blocks.
//! * `transform` runs the delta transform and the finisher over one block.
//! * `block_state` is the self-describing block layout.
//! * `frame` wraps the blocks of every vector in a single envelope.
//! * `orchestrator` fans the blocks of one vector out in parallel.

pub mod block_state;
pub mod context;
pub mod frame;
pub mod orchestrator;
pub mod partition;
pub mod transform;

pub use block_state::{DeltaBlockState, DeltaFlags};
pub use context::{BlockSettings, PipelineContext};
pub use partition::{BlockRange, OrderedRangeFactory};
