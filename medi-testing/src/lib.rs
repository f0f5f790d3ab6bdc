//! Testing utilities for code built on the medi mediator.
//!
//! ## Features
//!
//! - 👁️ **HandlerSpy** - Records payloads and replies with a fixed value
//! - ✅ **Assertions** - Spy and log assertions with readable failures
//! - 📝 **MemoryLogger** - Re-exported log capture for warning checks
//!
//! ## Quick Start
//!
//! ```
//! use medi_bus::Mediator;
//! use medi_testing::*;
//!
//! let bus: Mediator<String, ()> = Mediator::new();
//! let spy: HandlerSpy<String, ()> = HandlerSpy::new();
//!
//! bus.when("somechannel", spy.handler());
//! let _ = bus.emit("somechannel", "somemessage".to_string());
//!
//! assert_called_with(&spy, &"somemessage".to_string());
//! ```
//!
//! ## Awaiting Replies
//!
//! ```
//! use medi_bus::Mediator;
//! use medi_testing::*;
//!
//! # tokio_test::block_on(async {
//! let bus: Mediator<String, i32> = Mediator::new();
//! let spy: HandlerSpy<String, i32> = HandlerSpy::returning(7);
//!
//! bus.when("answers", spy.handler());
//! let values = bus.emit("answers", "question".to_string()).await.unwrap();
//!
//! assert_eq!(values, vec![7]);
//! assert_call_count(&spy, 1);
//! # });
//! ```
//!
//! ## Checking Warnings
//!
//! ```
//! use medi_bus::{Mediator, MediatorBuilder};
//! use medi_testing::*;
//!
//! let logger = MemoryLogger::new();
//! let bus: Mediator<String, ()> = MediatorBuilder::new()
//!     .log(true)
//!     .logger(logger.clone())
//!     .build();
//!
//! assert!(bus.delete("unknown").is_err());
//! assert_warned(&logger, "No handlers for channel");
//! ```

pub mod assertions;
pub mod spy;

pub use assertions::*;
pub use medi_log::MemoryLogger;
pub use spy::HandlerSpy;
