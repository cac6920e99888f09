//! Process liveness probe used for stale lock detection

/// Check whether a process with the given PID is still running.
///
/// Uses `kill(pid, 0)`, which performs the permission and existence checks
/// without delivering a signal. Only `ESRCH` counts as dead; `EPERM` means
/// the process exists under another user and is treated as alive.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: signal 0 only probes for existence; the PID has been range
    // checked against pid_t above.
    let result = unsafe { libc::kill(pid, 0) };
    if result == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() != Some(libc::ESRCH)
}

/// Without a portable probe the owner cannot be proven dead, so report alive.
#[cfg(not(unix))]
pub fn is_process_alive(pid: u32) -> bool {
    pid != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_is_alive() {
        assert!(is_process_alive(std::process::id()));
    }

    #[test]
    fn test_pid_zero_is_never_alive() {
        assert!(!is_process_alive(0));
    }

    #[cfg(unix)]
    #[test]
    fn test_pid_beyond_pid_max_is_dead() {
        // Far above any kernel pid_max, so kill() reports ESRCH.
        assert!(!is_process_alive(i32::MAX as u32));
    }
}
