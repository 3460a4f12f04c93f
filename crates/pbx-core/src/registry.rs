use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use crate::error::PbxError;
use crate::tu::Tu;
use crate::MAX_EXTENSIONS;

/// The extension table and shutdown coordinator. One `Pbx` per running
/// server; every connected client's [`Tu`] is registered here under
/// its extension for the lifetime of the connection.
///
/// The registry's own lock is never held while acquiring a TU's lock:
/// `register` assigns the extension before taking the registry lock,
/// and `unregister`/`dial` only ever touch the registry's own map
/// under that lock, calling out to a TU's methods (which take the
/// TU's own lock) only after releasing it.
pub struct Pbx {
    inner: Mutex<PbxInner>,
    drained: Condvar,
}

struct PbxInner {
    slots: HashMap<usize, Arc<Tu>>,
    shutting_down: bool,
}

impl Pbx {
    pub fn new() -> Self {
        Pbx {
            inner: Mutex::new(PbxInner {
                slots: HashMap::new(),
                shutting_down: false,
            }),
            drained: Condvar::new(),
        }
    }

    /// Register `tu` under `ext`. Assigns the extension to the TU
    /// before the registry lock is ever taken, so no TU lock is held
    /// while the registry lock is held.
    pub fn register(&self, tu: Arc<Tu>, ext: usize) -> Result<(), PbxError> {
        if ext >= MAX_EXTENSIONS {
            return Err(PbxError::ExtensionOutOfRange);
        }
        tu.set_extension(ext);

        let mut inner = self.inner.lock().unwrap();
        if inner.shutting_down {
            return Err(PbxError::ShuttingDown);
        }
        if inner.slots.contains_key(&ext) {
            return Err(PbxError::ExtensionInUse);
        }
        inner.slots.insert(ext, tu);
        Ok(())
    }

    /// Remove `tu` from the table and hang it up. Fails with
    /// `NotRegistered` if `tu` has no assigned extension, or if the slot
    /// for its extension holds some other TU (already unregistered, or
    /// never registered). The registry lock is released before `tu`'s
    /// own lock is taken by `hangup`.
    pub fn unregister(&self, tu: &Arc<Tu>) -> Result<(), PbxError> {
        let ext = tu.extension().ok_or(PbxError::NotRegistered)?;
        {
            let mut inner = self.inner.lock().unwrap();
            match inner.slots.get(&ext) {
                Some(registered) if Arc::ptr_eq(registered, tu) => {
                    inner.slots.remove(&ext);
                }
                _ => return Err(PbxError::NotRegistered),
            }
            if inner.shutting_down && inner.slots.is_empty() {
                self.drained.notify_all();
            }
        }
        tu.hangup();
        Ok(())
    }

    /// Resolve `ext` to a registered TU and hand it to `caller.dial`.
    /// The lookup happens entirely under the registry lock; the lock
    /// is released before `caller`'s own (and the target's) lock is
    /// ever touched.
    pub fn dial(&self, caller: &Arc<Tu>, ext: i64) {
        let target = usize::try_from(ext)
            .ok()
            .filter(|&e| e < MAX_EXTENSIONS)
            .and_then(|e| {
                let inner = self.inner.lock().unwrap();
                inner.slots.get(&e).cloned()
            });
        caller.dial(target);
    }

    /// Enter shutdown: refuse further registrations, hang up every
    /// currently registered TU and unblock its client thread's read,
    /// then block until every TU has unregistered (drained).
    pub fn shutdown(&self) {
        let tus: Vec<Arc<Tu>> = {
            let mut inner = self.inner.lock().unwrap();
            inner.shutting_down = true;
            inner.slots.values().cloned().collect()
        };
        for tu in &tus {
            tu.hangup();
            tu.shutdown_read();
        }

        let guard = self.inner.lock().unwrap();
        let _guard = self
            .drained
            .wait_while(guard, |inner| !inner.slots.is_empty())
            .unwrap();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.lock().unwrap().shutting_down
    }
}

impl Default for Pbx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::TuSink;
    use std::sync::Mutex as StdMutex;

    struct RecordingSink(Arc<StdMutex<Vec<String>>>);

    impl TuSink for RecordingSink {
        fn write_line(&mut self, line: &str) -> std::io::Result<()> {
            self.0.lock().unwrap().push(line.to_string());
            Ok(())
        }

        fn shutdown_read(&mut self) {}
    }

    fn new_tu(log: Arc<StdMutex<Vec<String>>>) -> Arc<Tu> {
        Tu::new(Box::new(RecordingSink(log)))
    }

    #[test]
    fn register_then_dial_by_extension() {
        let pbx = Pbx::new();
        let caller_log = Arc::new(StdMutex::new(Vec::new()));
        let callee_log = Arc::new(StdMutex::new(Vec::new()));
        let caller = new_tu(caller_log);
        let callee = new_tu(callee_log);
        pbx.register(caller.clone(), 1).unwrap();
        pbx.register(callee.clone(), 2).unwrap();

        caller.pickup();
        pbx.dial(&caller, 2);
        assert_eq!(caller.state(), pbx_proto::TuState::RingBack);
        assert_eq!(callee.state(), pbx_proto::TuState::Ringing);
    }

    #[test]
    fn duplicate_extension_is_rejected() {
        let pbx = Pbx::new();
        let a = new_tu(Arc::new(StdMutex::new(Vec::new())));
        let b = new_tu(Arc::new(StdMutex::new(Vec::new())));
        pbx.register(a, 5).unwrap();
        assert_eq!(pbx.register(b, 5), Err(PbxError::ExtensionInUse));
    }

    #[test]
    fn dial_unknown_extension_resolves_to_none() {
        let pbx = Pbx::new();
        let caller_log = Arc::new(StdMutex::new(Vec::new()));
        let caller = new_tu(caller_log);
        pbx.register(caller.clone(), 1).unwrap();
        caller.pickup();
        pbx.dial(&caller, 99);
        assert_eq!(caller.state(), pbx_proto::TuState::Error);
    }

    #[test]
    fn shutdown_drains_after_unregister() {
        let pbx = Arc::new(Pbx::new());
        let tu = new_tu(Arc::new(StdMutex::new(Vec::new())));
        pbx.register(tu.clone(), 1).unwrap();

        let pbx2 = pbx.clone();
        let tu2 = tu.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            pbx2.unregister(&tu2).unwrap();
        });

        pbx.shutdown();
        handle.join().unwrap();
        assert!(pbx.is_shutting_down());
    }

    #[test]
    fn unregister_rejects_a_tu_that_is_not_the_registered_one() {
        let pbx = Pbx::new();
        let a = new_tu(Arc::new(StdMutex::new(Vec::new())));
        let b = new_tu(Arc::new(StdMutex::new(Vec::new())));
        pbx.register(a.clone(), 1).unwrap();

        // `b` was never registered, so it has no extension at all.
        assert_eq!(pbx.unregister(&b), Err(PbxError::NotRegistered));

        // Unregistering the same extension twice fails the second time.
        pbx.unregister(&a).unwrap();
        assert_eq!(pbx.unregister(&a), Err(PbxError::NotRegistered));
    }
}
