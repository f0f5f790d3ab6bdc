//! In-process publish/subscribe mediator
//!
//! Handlers register on named channels, optionally behind a structural
//! [`Filter`]. Emitting on a channel runs every matching handler right away,
//! in registration order, and hands back an [`Emission`] that resolves to the
//! values the handlers replied with.
//!
//! ## Features
//!
//! - **Channels** - Any number of handlers per named channel
//! - **Filters** - Flat key/value subset matching between subscriptions and emits
//! - **Result Aggregation** - Immediate and deferred replies collected in order
//! - **Shared Handles** - Clones share one registry
//! - **Injected Logging** - Advisory diagnostics through a [`medi_log::Logger`]
//!
//! ## Quick Start
//!
//! ```rust
//! use medi_bus::{Handler, Mediator};
//!
//! # tokio_test::block_on(async {
//! let bus: Mediator<String, usize> = Mediator::new();
//!
//! bus.when("greet", Handler::from_fn(|name: &String| name.len()));
//!
//! let lengths = bus.emit("greet", "Alice".to_string()).await.unwrap();
//! assert_eq!(lengths, vec![5]);
//! # });
//! ```
//!
//! ## Filters
//!
//! A filtered subscription only fires for emits that carry a filter
//! containing all of its keys with equal values. Unfiltered subscriptions
//! never fire for a filtered emit.
//!
//! ```rust
//! use medi_bus::{Filter, Handler, Mediator};
//! use std::sync::{Arc, Mutex};
//!
//! let bus: Mediator<String, ()> = Mediator::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let s = Arc::clone(&seen);
//! bus.when_filtered(
//!     "orders",
//!     Filter::new().with("region", "eu"),
//!     Handler::observer(move |order: &String| s.lock().unwrap().push(order.clone())),
//! );
//!
//! let _ = bus.emit_filtered("orders", Filter::new().with("region", "eu").with("tier", 1), "A".into());
//! let _ = bus.emit_filtered("orders", Filter::new().with("region", "us"), "B".into());
//! let _ = bus.emit("orders", "C".into());
//!
//! assert_eq!(*seen.lock().unwrap(), vec!["A".to_string()]);
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! let bus: Mediator = MediatorBuilder::new()
//!     .log(true)                       // Report through the logger
//!     .continue_on_error(false)        // Stop at the first failing handler
//!     .logger(ConsoleLogger::new())
//!     .build();
//! ```
//!
//! ## Removing Handlers
//!
//! ```rust,ignore
//! let handler = Handler::observer(|msg: &String| println!("{}", msg));
//! bus.when("news", handler.clone());
//!
//! bus.delete_handler("news", &handler)?; // first entry bound to `handler`
//! bus.delete("news")?;                   // whole channel
//! ```

pub mod bus;
pub mod emission;
pub mod filter;
pub mod handler;

pub use bus::{DeleteError, Mediator, MediatorBuilder, MediatorConfig};
pub use emission::{EmitError, Emission, HandlerFailure};
pub use filter::{Filter, FilterError, FilterValue};
pub use handler::{Handler, HandlerError, HandlerResult, Reply};
