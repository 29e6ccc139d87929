//! Ossuary configuration.

use std::path::PathBuf;

/// Default log directives, used when `RUST_LOG` is unset.
pub const LOG_DIRECTIVES: &str = "warn,ossuary=info";

/// Directory below the user's configuration directory.
pub const CONFIG_DIR: &str = "ossuary";

/// Default action list file name.
pub const ACTION_FILE: &str = "actions.conf";

/// Shell used by the `Execute` action.
pub const SHELL: &str = "/bin/sh";

/// Default action list location.
///
/// This is `$XDG_CONFIG_HOME/ossuary/actions.conf`, or `actions.conf` in the
/// working directory if there is no configuration directory.
pub fn action_file_path() -> PathBuf {
    match dirs::config_dir() {
        Some(config_dir) => config_dir.join(CONFIG_DIR).join(ACTION_FILE),
        None => PathBuf::from(ACTION_FILE),
    }
}
