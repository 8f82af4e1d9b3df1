use std::sync::{Arc, Mutex, OnceLock};

type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync + 'static>;

static DOWNLOAD_PROGRESS_CB: OnceLock<Mutex<Option<ProgressCallback>>> = OnceLock::new();

/// Register an observer for audio download progress as `(bytes_done, total)`.
/// `total` is 0 when the server sends no `Content-Length`. Replaces any
/// previously registered callback.
pub fn set_download_progress_callback(cb: impl Fn(u64, u64) + Send + Sync + 'static) {
    let slot = DOWNLOAD_PROGRESS_CB.get_or_init(|| Mutex::new(None));
    if let Ok(mut g) = slot.lock() {
        *g = Some(Arc::new(cb));
    }
}

pub fn clear_download_progress_callback() {
    if let Some(m) = DOWNLOAD_PROGRESS_CB.get() {
        if let Ok(mut g) = m.lock() {
            *g = None;
        }
    }
}

pub fn emit_download_progress(done: u64, total: u64) {
    // called outside the lock so a callback may re-register or clear itself
    let cb = DOWNLOAD_PROGRESS_CB
        .get()
        .and_then(|m| m.lock().ok().and_then(|g| g.clone()));
    if let Some(cb) = cb {
        cb(done, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static SEEN: AtomicU64 = AtomicU64::new(0);

    #[test]
    fn callback_can_replace_and_clear_itself() {
        set_download_progress_callback(|done, _| {
            SEEN.store(done, Ordering::SeqCst);
            set_download_progress_callback(|done, _| {
                SEEN.store(done * 10, Ordering::SeqCst);
                clear_download_progress_callback();
            });
        });

        emit_download_progress(1, 3);
        assert_eq!(SEEN.load(Ordering::SeqCst), 1);

        emit_download_progress(2, 3);
        assert_eq!(SEEN.load(Ordering::SeqCst), 20);

        // cleared by the second callback
        emit_download_progress(3, 3);
        assert_eq!(SEEN.load(Ordering::SeqCst), 20);
    }
}
