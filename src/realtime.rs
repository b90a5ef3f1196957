//! Asking the operating system for real-time scheduling.

#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("sched_setscheduler failed: {0}")]
    SetScheduler(std::io::Error),
    #[error("real-time scheduling is not supported on this platform")]
    NotSupported,
}

/// Switch the calling thread to SCHED_FIFO at a priority halfway
/// between the minimum and maximum.
/// Threads spawned afterwards inherit the policy,
/// so call this before starting the pipeline.
#[cfg(target_os = "linux")]
pub fn enable_realtime_scheduling() -> Result<(), RealtimeError> {
    // SAFETY: plain libc calls with a zeroed, fully initialized sched_param.
    unsafe {
        let min = libc::sched_get_priority_min(libc::SCHED_FIFO);
        let max = libc::sched_get_priority_max(libc::SCHED_FIFO);
        if min < 0 || max < 0 {
            return Err(RealtimeError::SetScheduler(std::io::Error::last_os_error()));
        }
        let mut param: libc::sched_param = std::mem::zeroed();
        param.sched_priority = min + (max - min) / 2;

        if libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) != 0 {
            return Err(RealtimeError::SetScheduler(std::io::Error::last_os_error()));
        }
    }
    log::info!("Real-time scheduling enabled");
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn enable_realtime_scheduling() -> Result<(), RealtimeError> {
    Err(RealtimeError::NotSupported)
}

/// Run the given scheduling request and log a warning if it fails.
/// Returns whether real-time scheduling is in use.
pub fn request_realtime(enable: impl FnOnce() -> Result<(), RealtimeError>) -> bool {
    match enable() {
        Ok(()) => true,
        Err(err) => {
            log::warn!("Failed to enable real-time scheduling: {}", err);
            false
        },
    }
}
