//! Occurrence records and the Occurrence Emitter.

mod emitter;
mod occurrence;
mod signature;

pub use emitter::OccurrenceEmitter;
pub use occurrence::{Documentation, Occurrence, Role, SymbolInformation, UnitIndex};
pub use signature::SignatureRenderer;
