#![doc = include_str!("../README.md")]

// Macro-generated impls refer to the engine crate through this alias.
pub use td_codec as codec;

#[doc(hidden)]
pub use inventory;

// -----------------------------------------------------------------------------
// Modules

pub mod field;
pub mod msg;
pub mod property;
pub mod stage;
pub mod time;

mod records;

// -----------------------------------------------------------------------------
// Exports

pub use field::FieldType;
pub use property::PropertyMap;
pub use records::{Header, JointConstraint, MotionPlanRequest, Property};
pub use stage::{
    Alternatives, Connect, CurrentState, Fallbacks, FixedState, Merger, MoveRelative, MoveTo,
    SerialContainer, Task,
};
pub use time::{Duration, Time};
