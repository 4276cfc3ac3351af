use std::sync::{Mutex, OnceLock};

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Locks process environment mutation for the entire test body.
pub(crate) fn with_locked_env<R>(run: impl FnOnce() -> R) -> R {
    let _guard = env_lock().lock().unwrap_or_else(|e| e.into_inner());
    run()
}

/// Sets environment variables and restores their previous values on drop.
///
/// Only use inside `with_locked_env` so parallel tests never race.
pub(crate) struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub(crate) fn set(vars: &[(&str, &str)]) -> Self {
        let previous = vars
            .iter()
            .map(|(key, value)| {
                let old = std::env::var(key).ok();
                // SAFETY: callers hold the env lock, so no other test thread touches the environment.
                unsafe { std::env::set_var(key, value) };
                (key.to_string(), old)
            })
            .collect();
        Self { previous }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in self.previous.drain(..).rev() {
            // SAFETY: see `EnvGuard::set`.
            unsafe {
                match old {
                    Some(value) => std::env::set_var(&key, value),
                    None => std::env::remove_var(&key),
                }
            }
        }
    }
}
