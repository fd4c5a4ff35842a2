//! Reference implementations of the collaborator interfaces.
//!
//! [`UnitModel`] segments a text into units on its own, and
//! [`MemoryProvider`] is a conformant in-memory text provider built on top of
//! it. Drivers use the provider to exercise the oracles end to end; tests wrap
//! it to inject faults.

mod memory;
pub mod segment;

pub use memory::DOCUMENT_HANDLE;
pub use memory::MemoryProvider;
pub use segment::UnitModel;
