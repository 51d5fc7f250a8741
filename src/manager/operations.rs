use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

/// Which signal the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Terminate,
    Kill,
}

impl SignalKind {
    fn as_signal(self) -> Signal {
        match self {
            SignalKind::Terminate => Signal::SIGTERM,
            SignalKind::Kill => Signal::SIGKILL,
        }
    }
}

/// Delivers a signal to a process. Callers do not wait on or retry a delivery.
pub trait SignalSender {
    fn send(&mut self, pid: u32, kind: SignalKind) -> Result<(), String>;
}

/// `SignalSender` that calls kill(2).
#[derive(Debug, Clone, Copy, Default)]
pub struct NixSignaller;

impl SignalSender for NixSignaller {
    fn send(&mut self, pid: u32, kind: SignalKind) -> Result<(), String> {
        match kind {
            SignalKind::Terminate => terminate_process(pid),
            SignalKind::Kill => kill_process(pid),
        }
    }
}

fn deliver(pid: u32, kind: SignalKind) -> Result<(), String> {
    let signal = kind.as_signal();
    //Pid 0 or a negative value would address a whole process group
    if pid == 0 || pid > i32::MAX as u32 {
        return Err(format!("Refusing to send {} to PID {}", signal, pid));
    }

    signal::kill(Pid::from_raw(pid as i32), signal)
        .map_err(|e| format!("Failed to send {} to PID {}: {}", signal, pid, e))
}

//Terminate (Graceful stop)
//Sends SIGTERM, giving process a chance to shut down cleanly
pub fn terminate_process(pid: u32) -> Result<(), String> {
    deliver(pid, SignalKind::Terminate)
}

//Kill (Force terminate)
pub fn kill_process(pid: u32) -> Result<(), String> {
    deliver(pid, SignalKind::Kill)
}
