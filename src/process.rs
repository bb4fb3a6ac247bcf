use std::time::Duration;

pub trait ProcessControl {
    /// Ends the process after `grace`. Not cancellable.
    fn schedule_termination(&self, grace: Duration);
}

/// Kills the current process from a timer thread once the grace period ends.
pub struct DelayedKill;

impl ProcessControl for DelayedKill {
    fn schedule_termination(&self, grace: Duration) {
        log::info!("Terminating in {} ms", grace.as_millis());
        std::thread::spawn(move || {
            std::thread::sleep(grace);
            terminate_now();
        });
    }
}

#[cfg(windows)]
fn terminate_now() {
    crate::platform::terminate_current_process(0);
}

#[cfg(not(windows))]
fn terminate_now() {
    std::process::exit(0);
}
