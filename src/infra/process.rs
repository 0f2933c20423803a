use std::env;
use std::io;
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};

pub(crate) fn command_exists(cmd: &str) -> bool {
    if cmd.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(cmd).is_file();
    }
    if let Ok(path) = env::var("PATH") {
        for entry in env::split_paths(&path) {
            let candidate = entry.join(cmd);
            if candidate.is_file() {
                return true;
            }
        }
    }
    false
}

pub(crate) fn run_output(cmd: &[&str]) -> io::Result<Output> {
    let Some((program, args)) = cmd.split_first() else {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
    };
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
}

/// Spawns `cmd` as the leader of a new session so the whole process tree can
/// be signalled at once.
pub(crate) fn spawn_process_group(cmd: &mut Command) -> io::Result<Child> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }
    cmd.spawn()
}

// Callers only pass children that have not been reaped yet, so the group id
// still belongs to this tree even when the leader itself already exited.

/// Asks the process group led by `child` to stop.
pub(crate) fn terminate_group(child: &mut Child) {
    #[cfg(unix)]
    unsafe {
        libc::killpg(child.id() as i32, libc::SIGTERM);
    }
    #[cfg(not(unix))]
    {
        let _ = child.kill();
    }
}

pub(crate) fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    unsafe {
        libc::killpg(child.id() as i32, libc::SIGKILL);
    }
    #[cfg(not(unix))]
    {
        let _ = child.kill();
    }
}
