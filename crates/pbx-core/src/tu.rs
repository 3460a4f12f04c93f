use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use pbx_proto::{encode_state_line, TuState};

use crate::sink::TuSink;

/// A telephone unit: one TU per connected client. Holds the state
/// machine, the link to whatever TU it is currently paired with, and
/// the sink used to notify the client of state changes.
///
/// The extension is assigned once, before the TU is registered, and
/// never changes afterward — it lives in a [`OnceLock`] outside the
/// state [`Mutex`] so reading a peer's extension while already holding
/// this TU's own lock can never deadlock.
pub struct Tu {
    extension: OnceLock<usize>,
    inner: Mutex<TuInner>,
}

struct TuInner {
    state: TuState,
    peer: Option<Arc<Tu>>,
    sink: Box<dyn TuSink>,
}

impl Tu {
    /// Construct a new TU in the `ON_HOOK` state, not yet assigned an
    /// extension.
    pub fn new(sink: Box<dyn TuSink>) -> Arc<Tu> {
        Arc::new(Tu {
            extension: OnceLock::new(),
            inner: Mutex::new(TuInner {
                state: TuState::OnHook,
                peer: None,
                sink,
            }),
        })
    }

    /// Assign the extension this TU is reachable at. Called once, by
    /// the registry, immediately after construction and before the TU
    /// becomes visible to any other thread.
    pub fn set_extension(&self, ext: usize) {
        let _ = self.extension.set(ext);
    }

    pub fn extension(&self) -> Option<usize> {
        self.extension.get().copied()
    }

    pub fn state(&self) -> TuState {
        self.inner.lock().unwrap().state
    }

    /// Shut down the read half of this TU's sink, used by the registry
    /// during an orderly shutdown to unblock a client thread parked in
    /// a blocking read so it can observe EOF and tear itself down.
    pub fn shutdown_read(&self) {
        self.inner.lock().unwrap().sink.shutdown_read();
    }

    /// Send the TU's current state to its own sink. Used right after
    /// registration to deliver the initial `ON HOOK <ext>` greeting.
    pub fn notify(self: &Arc<Tu>) {
        let mut guard = self.inner.lock().unwrap();
        self.notify_locked(&mut guard);
    }

    fn notify_locked(self: &Arc<Tu>, inner: &mut TuInner) {
        let peer_ext = inner.peer.as_ref().and_then(|p| p.extension());
        let line = encode_state_line(inner.state, self.extension(), peer_ext);
        if let Err(err) = inner.sink.write_line(&line) {
            tracing::warn!(ext = ?self.extension(), %err, "failed writing state line to client");
        }
    }

    /// Take the handset off hook. `ON_HOOK` moves to `DIAL_TONE`.
    /// `RINGING` answers the incoming call and connects both ends.
    /// Every other state is unaffected but re-notifies the caller of
    /// its current state, matching a real handset that reports what
    /// it's already doing.
    pub fn pickup(self: &Arc<Tu>) {
        let old_state = self.state();
        match old_state {
            TuState::OnHook => {
                let mut guard = self.inner.lock().unwrap();
                guard.state = TuState::DialTone;
                self.notify_locked(&mut guard);
            }
            TuState::Ringing => {
                let peer = {
                    let guard = self.inner.lock().unwrap();
                    guard.peer.clone()
                };
                match peer {
                    Some(peer) => self.connect_with(&peer),
                    // Peer hung up between the state read above and
                    // here; fall back to a plain dial tone.
                    None => {
                        let mut guard = self.inner.lock().unwrap();
                        guard.state = TuState::DialTone;
                        self.notify_locked(&mut guard);
                    }
                }
            }
            _ => {
                let mut guard = self.inner.lock().unwrap();
                self.notify_locked(&mut guard);
            }
        }
    }

    fn connect_with(self: &Arc<Tu>, peer: &Arc<Tu>) {
        let (mut a, mut b) = lock_pair(self, peer);
        a.state = TuState::Connected;
        b.state = TuState::Connected;
        self.notify_locked(&mut a);
        peer.notify_locked(&mut b);
    }

    /// Hang up the handset. Always returns to `ON_HOOK`. A paired peer
    /// (in `CONNECTED`, `RINGING`, or `RING_BACK`) is unwound as well: if
    /// this TU was `CONNECTED` or `RINGING` (the handset still off hook,
    /// or an incoming call just declined) the peer gets a fresh dial
    /// tone; if this TU was `RING_BACK` (a call placed but never
    /// answered), the peer goes on hook, matching an aborted call on a
    /// real line.
    pub fn hangup(self: &Arc<Tu>) {
        let old_peer = {
            let guard = self.inner.lock().unwrap();
            guard.peer.clone()
        };
        match old_peer {
            Some(peer) => {
                let (mut a, mut b) = lock_pair(self, &peer);
                let peer_gets_dial_tone = matches!(a.state, TuState::Connected | TuState::Ringing);
                a.state = TuState::OnHook;
                a.peer = None;
                b.state = if peer_gets_dial_tone { TuState::DialTone } else { TuState::OnHook };
                b.peer = None;
                self.notify_locked(&mut a);
                peer.notify_locked(&mut b);
            }
            None => {
                let mut guard = self.inner.lock().unwrap();
                guard.state = TuState::OnHook;
                self.notify_locked(&mut guard);
            }
        }
    }

    /// Dial `target`. Applies regardless of this TU's current state:
    /// a missing target (`None`, i.e. not registered) is an `ERROR`; a
    /// self-dial is a `BUSY_SIGNAL` without ever touching the peer's
    /// lock twice; dialing a target that isn't `ON_HOOK` is a
    /// `BUSY_SIGNAL`; otherwise the target starts `RINGING` and this TU
    /// enters `RING_BACK`, paired with each other. None of the
    /// no-target/self-dial/busy-target outcomes touch this TU's
    /// existing `peer` link — matching the reference `tu_dial`, which
    /// leaves it in place too.
    pub fn dial(self: &Arc<Tu>, target: Option<Arc<Tu>>) {
        let target = match target {
            None => {
                let mut guard = self.inner.lock().unwrap();
                guard.state = TuState::Error;
                self.notify_locked(&mut guard);
                return;
            }
            Some(t) => t,
        };

        if Arc::ptr_eq(self, &target) {
            let mut guard = self.inner.lock().unwrap();
            guard.state = TuState::BusySignal;
            self.notify_locked(&mut guard);
            return;
        }

        let (mut a, mut b) = lock_pair(self, &target);
        if b.state != TuState::OnHook {
            a.state = TuState::BusySignal;
            self.notify_locked(&mut a);
            return;
        }

        b.state = TuState::Ringing;
        b.peer = Some(self.clone());
        a.state = TuState::RingBack;
        a.peer = Some(target.clone());
        self.notify_locked(&mut a);
        target.notify_locked(&mut b);
    }

    /// Forward a chat line to this TU's peer. A no-op unless this TU is
    /// currently `CONNECTED` — chatting to nobody isn't meaningful and
    /// this TU's own state is never touched by a chat.
    pub fn chat(self: &Arc<Tu>, text: &str) {
        let peer = {
            let guard = self.inner.lock().unwrap();
            if guard.state != TuState::Connected {
                return;
            }
            guard.peer.clone()
        };
        if let Some(peer) = peer {
            let mut guard = peer.inner.lock().unwrap();
            if let Err(err) = guard.sink.write_line(&format!("CHAT {text}")) {
                tracing::warn!(ext = ?peer.extension(), %err, "failed writing chat line to client");
            }
        }
    }
}

/// Lock two distinct TUs' state mutexes in a stable address order,
/// so that two threads racing to lock the same pair from opposite
/// ends can never deadlock. Callers must ensure `a` and `b` are not
/// the same TU; every call site here already guarantees that (either
/// by an explicit `Arc::ptr_eq` check, or because the invariant that
/// a TU's peer is always a distinct TU).
fn lock_pair<'a>(a: &'a Arc<Tu>, b: &'a Arc<Tu>) -> (MutexGuard<'a, TuInner>, MutexGuard<'a, TuInner>) {
    let pa = Arc::as_ptr(a) as usize;
    let pb = Arc::as_ptr(b) as usize;
    if pa < pb {
        let ga = a.inner.lock().unwrap();
        let gb = b.inner.lock().unwrap();
        (ga, gb)
    } else {
        let gb = b.inner.lock().unwrap();
        let ga = a.inner.lock().unwrap();
        (ga, gb)
    }
}
