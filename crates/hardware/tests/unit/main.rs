//! Unit tests for the simulator's leaf components.

/// Assembly parser: accepted forms and every load-time error.
pub mod isa;



/// Coherence bus transactions driven without any pipeline.
pub mod bus;
