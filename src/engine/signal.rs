// SIGINT/SIGTERM -> run cancellation

use std::sync::OnceLock;

use super::monitor::CancelToken;

static TOKEN: OnceLock<CancelToken> = OnceLock::new();

#[cfg(unix)]
extern "C" fn on_signal(_signal: libc::c_int) {
    // Only an atomic store happens here
    if let Some(token) = TOKEN.get() {
        token.cancel();
    }
}

/// Route SIGINT and SIGTERM to `token` for the rest of the process lifetime.
///
/// Only the first token installed is used. Children still receive the
/// terminal's SIGINT themselves; the token makes sure the monitors stop
/// polling and the output directory is rolled back.
pub fn install(token: &CancelToken) {
    if TOKEN.set(token.clone()).is_err() {
        tracing::debug!("signal handler already installed");
        return;
    }

    #[cfg(unix)]
    {
        let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        // SAFETY: the handler only performs an atomic store on a token that is
        // initialized before the handler is registered.
        unsafe {
            libc::signal(libc::SIGINT, handler);
            libc::signal(libc::SIGTERM, handler);
        }
    }
}
