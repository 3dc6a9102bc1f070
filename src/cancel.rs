use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

static SIGINT_TOKEN: OnceLock<CancelToken> = OnceLock::new();

#[cfg(unix)]
pub fn install_sigint(token: &CancelToken) {
    if SIGINT_TOKEN.set(token.clone()).is_err() {
        return;
    }
    let handler = handle_sigint as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
    }
}

// Only the atomic store is allowed here; the handler runs in signal context.
#[cfg(unix)]
extern "C" fn handle_sigint(_signal: libc::c_int) {
    if let Some(token) = SIGINT_TOKEN.get() {
        token.cancel();
    }
}

#[cfg(not(unix))]
pub fn install_sigint(token: &CancelToken) {
    let _ = SIGINT_TOKEN.set(token.clone());
}
