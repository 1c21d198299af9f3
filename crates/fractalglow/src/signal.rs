use anyhow::Result;
use renderer::StopHandle;

/// Routes SIGINT to `stop`, so Ctrl-C ends the render loop at the next tick
/// and the snapshot still gets written. A second Ctrl-C exits immediately.
#[cfg(unix)]
pub fn install_stop_on_interrupt(stop: StopHandle) -> Result<()> {
    use std::sync::OnceLock;

    use anyhow::Context;
    use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

    static INTERRUPT_STOP: OnceLock<StopHandle> = OnceLock::new();

    extern "C" fn on_interrupt(_: nix::libc::c_int) {
        if let Some(stop) = INTERRUPT_STOP.get() {
            if stop.is_stopped() {
                // SAFETY: `_exit` is async-signal-safe.
                unsafe { nix::libc::_exit(130) };
            }
            stop.stop();
        }
    }

    if INTERRUPT_STOP.set(stop).is_err() {
        tracing::debug!("interrupt handler already installed");
        return Ok(());
    }

    let action = SigAction::new(
        SigHandler::Handler(on_interrupt),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: the handler only touches an initialised OnceLock and atomics.
    unsafe { sigaction(Signal::SIGINT, &action) }.context("failed to install SIGINT handler")?;
    Ok(())
}

#[cfg(not(unix))]
pub fn install_stop_on_interrupt(_stop: StopHandle) -> Result<()> {
    Ok(())
}
