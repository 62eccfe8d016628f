//! Access mediation around destructive flash operations
//!
//! The host and the management controller share the PNOR through a
//! mediation daemon (hiomapd). It must stop serving host flash traffic
//! while partitions are being cleared, and must always be told to resume
//! afterwards. [`Suspended`] ties the resume to scope exit.

use crate::config::MediatorConfig;
use crate::tool::{command_line, process};
use log::{error, info};
use std::time::Duration;

/// Suspend/resume signals to the shared flash mediation service
///
/// Both calls are fire-and-forget: failures are logged by the
/// implementation and never reported back.
pub trait AccessMediator {
    /// Stop independent flash traffic
    fn suspend(&self);

    /// Allow flash traffic again
    fn resume(&self);
}

impl<M: AccessMediator + ?Sized> AccessMediator for &M {
    fn suspend(&self) {
        (**self).suspend()
    }

    fn resume(&self) {
        (**self).resume()
    }
}

impl<M: AccessMediator + ?Sized> AccessMediator for Box<M> {
    fn suspend(&self) {
        (**self).suspend()
    }

    fn resume(&self) {
        (**self).resume()
    }
}

/// Suspends the mediator for as long as it is alive
///
/// Resume runs from `Drop`, so it fires on normal exit, early return and
/// unwinding alike.
#[must_use = "dropping the guard resumes the mediator immediately"]
pub struct Suspended<'a, M: AccessMediator + ?Sized> {
    mediator: &'a M,
}

impl<'a, M: AccessMediator + ?Sized> Suspended<'a, M> {
    /// Suspend `mediator` and return the guard
    pub fn new(mediator: &'a M) -> Self {
        mediator.suspend();
        Self { mediator }
    }
}

impl<M: AccessMediator + ?Sized> Drop for Suspended<'_, M> {
    fn drop(&mut self) {
        self.mediator.resume();
    }
}

/// Signals hiomapd through `busctl call`
///
/// Each call runs under the `[mediator]` deadline; a `busctl` that hangs
/// is killed and the failure logged.
#[derive(Debug, Clone)]
pub struct HiomapdMediator {
    config: MediatorConfig,
    timeout: Option<Duration>,
}

impl HiomapdMediator {
    /// Create a mediator client from the `[mediator]` config section
    pub fn new(config: MediatorConfig) -> Self {
        let timeout = match config.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self { config, timeout }
    }

    /// Kill a bus call that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Configured deadline, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn call(&self, method: &str) {
        let busctl = self.config.busctl.to_string_lossy();
        let args = [
            "call",
            self.config.service.as_str(),
            self.config.object.as_str(),
            self.config.interface.as_str(),
            method,
        ];

        match process::run(&self.config.busctl, &busctl, &args, self.timeout) {
            Ok(out) if out.success() => info!("hiomapd {} done", method),
            Ok(out) => error!(
                "Error in hiomapd {}: {} returned {}",
                method,
                command_line(&busctl, &args),
                out.status
            ),
            Err(e) => error!("Error in hiomapd {}: {}", method, e),
        }
    }
}

impl AccessMediator for HiomapdMediator {
    fn suspend(&self) {
        self.call("Suspend");
    }

    fn resume(&self) {
        self.call("Resume");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Events(RefCell<Vec<&'static str>>);

    impl AccessMediator for Events {
        fn suspend(&self) {
            self.0.borrow_mut().push("suspend");
        }

        fn resume(&self) {
            self.0.borrow_mut().push("resume");
        }
    }

    #[test]
    fn test_guard_brackets_scope() {
        let events = Events::default();
        {
            let _guard = Suspended::new(&events);
            events.0.borrow_mut().push("work");
        }
        assert_eq!(*events.0.borrow(), vec!["suspend", "work", "resume"]);
    }

    #[test]
    fn test_guard_resumes_on_early_return() {
        fn clear(events: &Events) -> Result<(), ()> {
            let _guard = Suspended::new(events);
            let failed: Result<(), ()> = Err(());
            failed?;
            events.0.borrow_mut().push("unreachable");
            Ok(())
        }

        let events = Events::default();
        assert!(clear(&events).is_err());
        assert_eq!(*events.0.borrow(), vec!["suspend", "resume"]);
    }

    #[test]
    fn test_guard_resumes_on_panic() {
        let events = Events::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = Suspended::new(&events);
            panic!("clear blew up");
        }));
        assert!(result.is_err());
        assert_eq!(*events.0.borrow(), vec!["suspend", "resume"]);
    }

    #[test]
    fn test_hiomapd_timeout_from_config() {
        let mediator = HiomapdMediator::new(MediatorConfig::default());
        assert_eq!(mediator.timeout(), Some(Duration::from_secs(30)));

        let mediator = HiomapdMediator::new(MediatorConfig {
            timeout_secs: 0,
            ..MediatorConfig::default()
        });
        assert_eq!(mediator.timeout(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_hiomapd_hung_busctl_is_killed() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Instant;

        let dir = tempfile::tempdir().unwrap();
        let busctl = dir.path().join("busctl");
        std::fs::write(&busctl, "#!/bin/sh\nexec sleep 5\n").unwrap();
        std::fs::set_permissions(&busctl, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mediator = HiomapdMediator::new(MediatorConfig {
            busctl,
            ..MediatorConfig::default()
        })
        .with_timeout(Duration::from_millis(300));

        let started = Instant::now();
        {
            let _guard = Suspended::new(&mediator);
        }
        // Suspend and resume each give up at the deadline
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_hiomapd_missing_busctl_does_not_panic() {
        let mediator = HiomapdMediator::new(MediatorConfig {
            busctl: PathBuf::from("/nonexistent/busctl"),
            ..MediatorConfig::default()
        });
        mediator.suspend();
        mediator.resume();
    }
}
