//! Mediator implementation

use crate::emission::Emission;
use crate::filter::{DisplayFilter, Filter};
use crate::handler::Handler;
use dashmap::DashMap;
use medi_log::{info, warn, ConsoleLogger, Logger, NoopLogger};
use std::env;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A handler registered on a channel, with its optional required filter.
pub(crate) struct Subscription<P, R> {
    filter: Option<Filter>,
    handler: Handler<P, R>,
}

impl<P, R> Subscription<P, R> {
    fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    fn handler(&self) -> &Handler<P, R> {
        &self.handler
    }

    /// Decide whether an emit carrying `offered` reaches this subscription.
    pub(crate) fn admit(&self, offered: Option<&Filter>) -> Admission {
        match (self.filter.as_ref(), offered) {
            (None, None) => Admission::Dispatch,
            (Some(_), None) => Admission::FilterRequired,
            (Some(required), Some(offered)) if required.matches(offered) => Admission::Dispatch,
            (Some(_), Some(_)) => Admission::FilterMismatch,
            // A filtered emit only targets filtered subscriptions
            (None, Some(_)) => Admission::Unfiltered,
        }
    }
}

impl<P, R> Clone for Subscription<P, R> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<P, R> fmt::Debug for Subscription<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("filter", &self.filter)
            .field("handler", &self.handler)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Dispatch,
    FilterRequired,
    FilterMismatch,
    Unfiltered,
}

/// In-process channel mediator.
///
/// Cloning is cheap and every clone shares the same channel registry, so a
/// clone can be handed to any component that needs to emit or subscribe.
pub struct Mediator<P = serde_json::Value, R = serde_json::Value> {
    /// Subscriptions for each channel, in registration order
    channels: Arc<DashMap<String, Vec<Subscription<P, R>>>>,

    /// Injected logger (no-op unless logging is enabled)
    logger: Arc<dyn Logger>,

    /// Configuration
    config: Arc<MediatorConfig>,
}

/// Mediator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediatorConfig {
    /// Send info/warning lines to the logger
    pub log: bool,

    /// Keep dispatching after a handler fails synchronously
    pub continue_on_error: bool,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            log: false,
            continue_on_error: true,
        }
    }
}

impl MediatorConfig {
    /// Create config from environment variables.
    ///
    /// - `MEDI_LOG=1|true` enables logging
    /// - `MEDI_CONTINUE_ON_ERROR=0|false` stops dispatch at the first failure
    ///
    /// Unrecognized values leave the default in place.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            log: env_flag("MEDI_LOG").unwrap_or(defaults.log),
            continue_on_error: env_flag("MEDI_CONTINUE_ON_ERROR")
                .unwrap_or(defaults.continue_on_error),
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl<P, R> Mediator<P, R> {
    /// Create new mediator
    pub fn new() -> Self {
        Self::with_config(MediatorConfig::default())
    }

    /// Create mediator with custom config.
    ///
    /// Logging, when enabled, goes to a [`ConsoleLogger`].
    pub fn with_config(config: MediatorConfig) -> Self {
        let logger: Arc<dyn Logger> = if config.log {
            Arc::new(ConsoleLogger::new())
        } else {
            Arc::new(NoopLogger)
        };
        Self::with_logger(config, logger)
    }

    /// Create mediator with custom config and an injected logger.
    ///
    /// The logger only receives lines while `config.log` is set.
    pub fn with_logger(config: MediatorConfig, logger: Arc<dyn Logger>) -> Self {
        let logger: Arc<dyn Logger> = if config.log {
            logger
        } else {
            Arc::new(NoopLogger)
        };

        Self {
            channels: Arc::new(DashMap::new()),
            logger,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    /// Register a handler on a channel.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use medi_bus::{Handler, Mediator};
    ///
    /// let bus: Mediator<String, ()> = Mediator::new();
    /// bus.when("orders", Handler::observer(|order: &String| println!("{}", order)))
    ///     .when("orders", Handler::observer(|_: &String| {}));
    ///
    /// assert_eq!(bus.handler_count("orders"), 2);
    /// ```
    pub fn when(&self, channel: &str, handler: Handler<P, R>) -> &Self {
        self.subscribe(channel, None, handler)
    }

    /// Register a handler that only fires for emits whose filter contains `filter`.
    pub fn when_filtered(&self, channel: &str, filter: Filter, handler: Handler<P, R>) -> &Self {
        self.subscribe(channel, Some(filter), handler)
    }

    fn subscribe(&self, channel: &str, filter: Option<Filter>, handler: Handler<P, R>) -> &Self {
        if self.config.log {
            debug!(
                "Subscribed handler on channel \"{}\" (filter: {})",
                channel,
                DisplayFilter(filter.as_ref())
            );
        }

        self.channels
            .entry(channel.to_string())
            .or_default()
            .push(Subscription { filter, handler });

        self
    }

    /// Remove every subscription on a channel.
    pub fn delete(&self, channel: &str) -> Result<&Self, DeleteError> {
        match self.channels.remove(channel) {
            Some((_, subscriptions)) => {
                if self.config.log {
                    debug!(
                        "Removed {} subscription(s) from channel \"{}\"",
                        subscriptions.len(),
                        channel
                    );
                }
                Ok(self)
            }
            None => {
                warn!(self.logger, "Delete: No handlers for channel \"{}\"", channel);
                Err(DeleteError::NoSuchChannel(channel.to_string()))
            }
        }
    }

    /// Remove the first subscription bound to `handler`.
    ///
    /// Other subscriptions using the same handler stay registered. The channel
    /// itself goes away once its last subscription is removed.
    pub fn delete_handler(&self, channel: &str, handler: &Handler<P, R>) -> Result<&Self, DeleteError> {
        let removed = match self.channels.get_mut(channel) {
            Some(mut subscriptions) => {
                match subscriptions.iter().position(|s| s.handler() == handler) {
                    Some(index) => {
                        subscriptions.remove(index);
                        Some(true)
                    }
                    None => Some(false),
                }
            }
            None => None,
        };

        match removed {
            Some(true) => {
                self.channels.remove_if(channel, |_, subscriptions| subscriptions.is_empty());
                if self.config.log {
                    debug!("Removed handler from channel \"{}\"", channel);
                }
                Ok(self)
            }
            Some(false) => {
                warn!(
                    self.logger,
                    "Delete: Handler is not registered on channel \"{}\"", channel
                );
                Err(DeleteError::NoSuchHandler(channel.to_string()))
            }
            None => {
                warn!(self.logger, "Delete: No handlers for channel \"{}\"", channel);
                Err(DeleteError::NoSuchChannel(channel.to_string()))
            }
        }
    }

    /// Get handler count for a channel
    pub fn handler_count(&self, channel: &str) -> usize {
        self.channels.get(channel).map(|s| s.len()).unwrap_or(0)
    }

    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    /// Names of all channels with subscriptions, sorted
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Clear all channels
    pub fn clear(&self) {
        self.channels.clear();
        info!(self.logger, "Cleared all channels");
    }
}

impl<P: fmt::Debug, R: 'static> Mediator<P, R> {
    /// Emit a payload to the unfiltered subscriptions of a channel.
    ///
    /// Handlers run before this returns. The returned [`Emission`] resolves
    /// to the collected replies.
    pub fn emit(&self, channel: &str, payload: P) -> Emission<R> {
        self.dispatch(channel, None, payload)
    }

    /// Emit a payload to the filtered subscriptions whose required filter is
    /// contained in `filter`.
    pub fn emit_filtered(&self, channel: &str, filter: Filter, payload: P) -> Emission<R> {
        self.dispatch(channel, Some(&filter), payload)
    }

    fn dispatch(&self, channel: &str, filter: Option<&Filter>, payload: P) -> Emission<R> {
        // Snapshot so handlers can re-enter the mediator
        let subscriptions = match self.channels.get(channel) {
            Some(entry) if !entry.is_empty() => entry.value().clone(),
            _ => {
                warn!(
                    self.logger,
                    "Emit: No handlers for event: \"{}\", payload: {:?}", channel, payload
                );
                return Emission::idle(channel);
            }
        };

        info!(
            self.logger,
            "Emitting event: \"{}\" with payload: {:?} and filter: {}",
            channel,
            payload,
            DisplayFilter(filter)
        );

        let mut emission = Emission::new(channel);

        for subscription in &subscriptions {
            match subscription.admit(filter) {
                Admission::Dispatch => {}
                Admission::FilterRequired => {
                    warn!(
                        self.logger,
                        "Trying to emit an event on channel \"{}\" without a filter, requires filter: {}",
                        channel,
                        DisplayFilter(subscription.filter())
                    );
                    continue;
                }
                Admission::FilterMismatch => {
                    warn!(
                        self.logger,
                        "Filter {} did not match required filter {} on channel \"{}\"",
                        DisplayFilter(filter),
                        DisplayFilter(subscription.filter()),
                        channel
                    );
                    continue;
                }
                Admission::Unfiltered => continue,
            }

            let index = emission.begin();
            match subscription.handler().call(&payload) {
                Ok(reply) => emission.capture(index, reply),
                Err(error) => {
                    warn!(
                        self.logger,
                        "Handler #{} on channel \"{}\" failed: {}", index, channel, error
                    );
                    if self.config.continue_on_error {
                        emission.fail(index, error);
                    } else {
                        emission.abort(index, error);
                        break;
                    }
                }
            }
        }

        emission
    }
}

impl<P, R> Clone for Mediator<P, R> {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
            logger: Arc::clone(&self.logger),
            config: Arc::clone(&self.config),
        }
    }
}

impl<P, R> Default for Mediator<P, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, R> fmt::Debug for Mediator<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("channels", &self.channels())
            .field("config", &self.config)
            .finish()
    }
}

/// Delete errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeleteError {
    #[error("No handlers registered on channel \"{0}\"")]
    NoSuchChannel(String),

    #[error("Handler is not registered on channel \"{0}\"")]
    NoSuchHandler(String),
}

/// Mediator builder
pub struct MediatorBuilder {
    config: MediatorConfig,
    logger: Option<Arc<dyn Logger>>,
}

impl MediatorBuilder {
    /// Create new mediator builder
    pub fn new() -> Self {
        Self {
            config: MediatorConfig::default(),
            logger: None,
        }
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: MediatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable/disable logging
    pub fn log(mut self, enabled: bool) -> Self {
        self.config.log = enabled;
        self
    }

    /// Enable/disable continue on error
    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.config.continue_on_error = enabled;
        self
    }

    /// Inject the logger collaborator
    pub fn logger(self, logger: impl Logger + 'static) -> Self {
        self.shared_logger(Arc::new(logger))
    }

    /// Inject an already shared logger
    pub fn shared_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Build the mediator
    pub fn build<P, R>(self) -> Mediator<P, R> {
        match self.logger {
            Some(logger) => Mediator::with_logger(self.config, logger),
            None => Mediator::with_config(self.config),
        }
    }
}

impl Default for MediatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
