// Medi - A lightweight in-process publish/subscribe mediator for Rust
//
// This library lets components register handlers on named channels,
// optionally behind structural filters, and collect the (possibly
// asynchronous) results of every emit.

// Re-export core functionality
pub use medi_bus::*;

// Re-export the logger collaborator
pub use medi_log::{ConsoleLogger, FacadeLogger, Logger, MemoryLogger, NoopLogger};

#[cfg(feature = "tracing")]
pub use medi_log::TracingLogger;

pub use medi_log;
pub use serde_json;

// Re-export optional crates
#[cfg(feature = "testing")]
pub use medi_testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        DeleteError, EmitError, Emission, Filter, FilterValue, Handler, HandlerError, Logger,
        Mediator, MediatorBuilder, MediatorConfig, Reply,
    };
}
