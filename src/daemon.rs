//! Process spawning.

use std::io;
use std::mem::MaybeUninit;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::ptr;

use crate::config::SHELL;

/// Run a shell command line in the background.
///
/// The command is reparented to init, so it never turns into a zombie of the
/// engine. Its output is discarded.
pub fn spawn_shell(command_line: &str) -> io::Result<()> {
    let mut shell = Command::new(SHELL);
    shell.arg("-c").arg(command_line);
    shell.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

    // SAFETY: The hook only calls async-signal-safe libc functions.
    unsafe {
        shell.pre_exec(detach);
    }

    // The intermediate child exits right after forking the shell.
    shell.spawn()?.wait()?;

    Ok(())
}

/// Detach the forked child from the engine's process.
///
/// Runs in the child between `fork` and `exec`.
fn detach() -> io::Result<()> {
    // SAFETY: Called in the single-threaded child before `exec`.
    unsafe {
        match libc::fork() {
            -1 => return Err(io::Error::last_os_error()),
            0 => (),
            _ => libc::_exit(0),
        }

        if libc::setsid() == -1 {
            return Err(io::Error::last_os_error());
        }

        // Don't inherit the engine's blocked signals.
        let mut unblocked = MaybeUninit::uninit();
        libc::sigemptyset(unblocked.as_mut_ptr());
        libc::sigprocmask(libc::SIG_SETMASK, unblocked.as_ptr(), ptr::null_mut());
    }

    Ok(())
}
