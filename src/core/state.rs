//! # Application state built from a [`SetupConfig`].
//!
//! Construction is one-directional:
//! ```text
//! bus (+ subscription) → logger → UIs → initializers (in order)
//! ```
//! Each step may read everything built before it; the first failure aborts.

use std::fmt;
use std::sync::Arc;

use tracing::{Dispatch, debug};

use crate::config::{Config, SetupConfig};
use crate::error::SetupError;
use crate::events::{Bus, Subscription};
use crate::ui::Ui;

/// Resources owned by one application.
pub struct State {
    /// The resolved configuration.
    pub config: Config,
    /// Event bus, unless the application runs without one.
    pub bus: Option<Bus>,
    /// The event loop's subscription, taken right after the bus is built.
    pub subscription: Option<Subscription>,
    /// Application logger.
    pub logger: Dispatch,
    /// UI candidates in priority order.
    pub uis: Vec<Arc<dyn Ui>>,
}

impl State {
    /// Builds every resource from `setup` for `config`.
    pub fn build(setup: &SetupConfig, config: Config) -> Result<Self, SetupError> {
        let bus = (setup.bus)(&config);
        let subscription = bus.as_ref().map(Bus::subscribe);

        let logger = (setup.logger)(&config).map_err(SetupError::Logger)?;
        let uis = (setup.uis)(&config).map_err(SetupError::Ui)?;

        let mut state = State {
            config,
            bus,
            subscription,
            logger,
            uis,
        };

        let config = state.config.clone();
        for init in &setup.initializers {
            init(&config, &mut state).map_err(SetupError::Initializer)?;
        }
        state.follow_bus();
        Ok(state)
    }

    /// Re-subscribes when an initializer swapped or removed the bus.
    fn follow_bus(&mut self) {
        let stale = match (&self.bus, &self.subscription) {
            (Some(bus), Some(sub)) => !sub.is_from(bus),
            (None, Some(_)) => true,
            (_, None) => false,
        };
        if !stale {
            return;
        }
        if let Some(old) = self.subscription.take() {
            old.unsubscribe();
        }
        self.subscription = self.bus.as_ref().map(Bus::subscribe);
        debug!(subscribed = self.subscription.is_some(), "bus replaced by initializer");
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("config", &self.config)
            .field("bus", &self.bus)
            .field("subscribed", &self.subscription.is_some())
            .field("uis", &self.uis.iter().map(|u| u.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::Identification;
    use crate::testsupport::{MockUi, dyn_ui};

    fn recipe() -> SetupConfig {
        SetupConfig::new(Identification::new("app", "1.0.0")).with_no_logging()
    }

    #[test]
    fn builds_in_order_and_initializers_see_everything() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let ui = MockUi::new("tui").arc();

        let first = seen.clone();
        let second = seen.clone();
        let ui_for_ctor = ui.clone();
        let setup = recipe()
            .with_ui(move |_| Ok(vec![dyn_ui(&ui_for_ctor)]))
            .with_initializer(move |cfg, state| {
                assert_eq!(cfg.id.name, "app");
                assert!(state.bus.is_some());
                assert!(state.subscription.is_some());
                first.lock().unwrap().push(format!("first:{}", state.uis.len()));
                Ok(())
            })
            .with_initializer(move |_, state| {
                state.uis.clear();
                second.lock().unwrap().push("second".to_string());
                Ok(())
            });

        let state = State::build(&setup, setup.default_config()).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["first:1", "second"]);
        assert!(state.uis.is_empty());
    }

    #[test]
    fn no_bus_means_no_subscription() {
        let setup = recipe().with_no_bus();
        let state = State::build(&setup, setup.default_config()).unwrap();
        assert!(state.bus.is_none());
        assert!(state.subscription.is_none());
    }

    #[test]
    fn subscription_is_registered_on_the_bus() {
        let setup = recipe();
        let state = State::build(&setup, setup.default_config()).unwrap();
        assert_eq!(state.bus.as_ref().map(Bus::subscriber_count), Some(1));
    }

    #[test]
    fn swapped_bus_gets_a_fresh_subscription() {
        let replacement = Bus::new();
        let old_bus = Arc::new(Mutex::new(None));

        let new_bus = replacement.clone();
        let seen_old = old_bus.clone();
        let setup = recipe().with_initializer(move |_, state| {
            *seen_old.lock().unwrap() = state.bus.replace(new_bus.clone());
            Ok(())
        });

        let state = State::build(&setup, setup.default_config()).unwrap();

        let old_bus = old_bus.lock().unwrap().take().unwrap();
        assert_eq!(old_bus.subscriber_count(), 0);
        assert_eq!(replacement.subscriber_count(), 1);
        assert!(state.subscription.as_ref().unwrap().is_from(&replacement));
    }

    #[test]
    fn removed_bus_drops_the_subscription() {
        let setup = recipe().with_initializer(|_, state| {
            state.bus = None;
            Ok(())
        });
        let state = State::build(&setup, setup.default_config()).unwrap();
        assert!(state.subscription.is_none());
    }

    #[test]
    fn constructor_failures_are_wrapped() {
        let setup = recipe().with_logger(|_| Err("no sink".into()));
        let err = State::build(&setup, setup.default_config()).unwrap_err();
        assert_eq!(err.to_string(), "unable to setup logger: no sink");

        let setup = recipe().with_ui(|_| Err("no terminal".into()));
        let err = State::build(&setup, setup.default_config()).unwrap_err();
        assert_eq!(err.to_string(), "unable to setup UI: no terminal");
    }

    #[test]
    fn failing_initializer_stops_the_chain() {
        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();
        let setup = recipe()
            .with_initializer(|_, _| Err("bad init".into()))
            .with_initializer(move |_, _| {
                *flag.lock().unwrap() = true;
                Ok(())
            });

        let err = State::build(&setup, setup.default_config()).unwrap_err();
        assert_eq!(err.as_label(), "setup_initializer");
        assert!(!*ran.lock().unwrap());
    }
}
