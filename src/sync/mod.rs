pub mod coordinator;

pub use coordinator::{MutationState, QadaTracker};
