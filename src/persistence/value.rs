//! A value bound to one key of an async key-value store
//!
//! Lifecycle: `Loading → Ready`. The initial read runs as a local task; calls
//! made before it resolves are queued and replayed in order. Once ready,
//! every change updates the in-memory value synchronously and schedules a
//! write. Writes for one value go through a single pending slot drained by
//! one task, so a newer change supersedes an unissued older one and the
//! last call is always the last write issued.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::task::{LocalSpawn, LocalSpawnExt};
use web_time::SystemTime;

use super::codec::Codec;
use crate::error::{PersistError, StoreOp};
use crate::platform::KeyValueStore;

/// Handle returned by [`PersistentValue::subscribe`]
pub type SubscriptionId = usize;

/// Load state of a [`PersistentValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial read in progress; mutations are queued
    Loading,
    /// Initial read resolved (found, missing or failed)
    Ready,
}

/// A mutation waiting for the initial read
enum Intent<T> {
    Set(T),
    Update(Box<dyn FnOnce(&mut T)>),
    Clear,
}

/// Store operation owed for the latest change. `Put` encodes whatever
/// `current` holds when the write is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingWrite {
    Put,
    Remove,
}

type Listener<T> = Rc<dyn Fn(&T)>;
type ErrorHandler = Rc<dyn Fn(&PersistError)>;

struct State<T> {
    current: T,
    phase: Phase,
    /// False after a failed initial read: the stored value was never seen,
    /// so nothing is written back.
    durable: bool,
    queued: VecDeque<Intent<T>>,
    /// True while an `update` closure runs; same-value changes it makes
    /// wait in `deferred` until its result is stored.
    updating: bool,
    deferred: VecDeque<Intent<T>>,
    pending: Option<PendingWrite>,
    writing: bool,
    last_synced_at: Option<SystemTime>,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
    next_subscription: SubscriptionId,
    ready_waiters: Vec<oneshot::Sender<()>>,
    settled_waiters: Vec<oneshot::Sender<()>>,
}

impl<T> State<T> {
    fn is_settled(&self) -> bool {
        self.phase == Phase::Ready && !self.writing && self.pending.is_none()
    }
}

struct Shared<T, S> {
    key: String,
    default: T,
    store: S,
    codec: Box<dyn Codec<T>>,
    spawner: Rc<dyn LocalSpawn>,
    on_error: ErrorHandler,
    state: RefCell<State<T>>,
}

/// In-memory value kept in sync with one durable slot.
///
/// Cloning gives another handle to the same value.
pub struct PersistentValue<T, S> {
    shared: Rc<Shared<T, S>>,
}

impl<T, S> Clone for PersistentValue<T, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

/// Configures a [`PersistentValue`] before its initial read starts
pub struct PersistentValueBuilder<T> {
    key: String,
    default: T,
    codec: Box<dyn Codec<T>>,
    on_error: ErrorHandler,
}

impl<T: Clone + 'static> PersistentValueBuilder<T> {
    /// Start configuring a value for `key`
    pub fn new(key: impl Into<String>, default: T, codec: impl Codec<T> + 'static) -> Self {
        Self {
            key: key.into(),
            default,
            codec: Box::new(codec),
            on_error: Rc::new(|_| {}),
        }
    }

    /// Handler for non-fatal errors. Errors are logged whether or not one is set.
    pub fn on_error(mut self, handler: impl Fn(&PersistError) + 'static) -> Self {
        self.on_error = Rc::new(handler);
        self
    }

    /// Bind to `store` and start the initial read on `spawner`
    pub fn spawn<S>(self, store: S, spawner: impl LocalSpawn + 'static) -> PersistentValue<T, S>
    where
        S: KeyValueStore + 'static,
    {
        let shared = Rc::new(Shared {
            state: RefCell::new(State {
                current: self.default.clone(),
                phase: Phase::Loading,
                durable: false,
                queued: VecDeque::new(),
                updating: false,
                deferred: VecDeque::new(),
                pending: None,
                writing: false,
                last_synced_at: None,
                listeners: Vec::new(),
                next_subscription: 0,
                ready_waiters: Vec::new(),
                settled_waiters: Vec::new(),
            }),
            key: self.key,
            default: self.default,
            store,
            codec: self.codec,
            spawner: Rc::new(spawner),
            on_error: self.on_error,
        });
        Shared::start_load(&shared);
        PersistentValue { shared }
    }
}

impl<T, S> PersistentValue<T, S>
where
    T: Clone + 'static,
    S: KeyValueStore + 'static,
{
    /// Create a value for `key` and start reading it from `store`
    pub fn initialize(
        key: impl Into<String>,
        default: T,
        codec: impl Codec<T> + 'static,
        store: S,
        spawner: impl LocalSpawn + 'static,
    ) -> Self {
        PersistentValueBuilder::new(key, default, codec).spawn(store, spawner)
    }

    /// Replace the value. Queued while loading.
    pub fn set(&self, value: T) {
        self.dispatch(Intent::Set(value));
    }

    /// Modify the value in place. Queued while loading; `f` then sees the
    /// value as it stands at replay time.
    ///
    /// `set`, `update` or `clear` calls that `f` makes on this same value
    /// are applied in order after `f`'s result, so they are not overwritten
    /// by it.
    pub fn update(&self, f: impl FnOnce(&mut T) + 'static) {
        self.dispatch(Intent::Update(Box::new(f)));
    }

    /// Reset to the default and remove the key from the store
    pub fn clear(&self) {
        self.dispatch(Intent::Clear);
    }

    /// Current in-memory value
    pub fn read(&self) -> T {
        self.shared.state.borrow().current.clone()
    }

    /// Borrow the current value.
    ///
    /// # Panics
    ///
    /// Panics if `f` calls `set`, `update` or `clear` on this value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.shared.state.borrow().current)
    }

    /// Resolves once the initial read has completed
    pub async fn ready(&self) {
        let rx = {
            let mut state = self.shared.state.borrow_mut();
            if state.phase == Phase::Ready {
                return;
            }
            let (tx, rx) = oneshot::channel();
            state.ready_waiters.push(tx);
            rx
        };
        let _ = rx.await;
    }

    /// Resolves once ready with no write pending or in flight
    pub async fn settled(&self) {
        let rx = {
            let mut state = self.shared.state.borrow_mut();
            if state.is_settled() {
                return;
            }
            let (tx, rx) = oneshot::channel();
            state.settled_waiters.push(tx);
            rx
        };
        let _ = rx.await;
    }

    /// Call `listener` with the new value after every change.
    ///
    /// Listeners are owned by the value: a listener that captures a clone of
    /// this value forms an `Rc` cycle and keeps it alive until unsubscribed.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> SubscriptionId {
        let mut state = self.shared.state.borrow_mut();
        let id = state.next_subscription;
        state.next_subscription += 1;
        state.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.shared.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|(sub, _)| *sub != id);
        state.listeners.len() != before
    }

    fn dispatch(&self, intent: Intent<T>) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.phase == Phase::Loading {
                state.queued.push_back(intent);
                log::debug!("Queued change to `{}` until loaded", self.shared.key);
                return;
            }
            if state.updating {
                state.deferred.push_back(intent);
                return;
            }
        }
        Shared::apply(&self.shared, intent);
    }
}

impl<T, S> PersistentValue<T, S> {
    /// Store key this value is bound to
    pub fn key(&self) -> &str {
        &self.shared.key
    }

    /// Value used when the store has nothing (or nothing readable)
    pub fn default_value(&self) -> &T {
        &self.shared.default
    }

    /// `Loading` until the initial read resolves, then `Ready` for good
    pub fn phase(&self) -> Phase {
        self.shared.state.borrow().phase
    }

    /// True once the initial read has resolved
    pub fn is_ready(&self) -> bool {
        self.phase() == Phase::Ready
    }

    /// False while loading, and after a failed initial read (changes then
    /// stay in memory)
    pub fn is_durable(&self) -> bool {
        self.shared.state.borrow().durable
    }

    /// Time of the last successful write or remove
    pub fn last_synced_at(&self) -> Option<SystemTime> {
        self.shared.state.borrow().last_synced_at
    }
}

impl<T, S> Shared<T, S>
where
    T: Clone + 'static,
    S: KeyValueStore + 'static,
{
    fn start_load(this: &Rc<Self>) {
        if let Err(source) = this.spawner.spawn_local(Self::load(Rc::clone(this))) {
            this.report(PersistError::Spawn {
                key: this.key.clone(),
                source,
            });
            Self::finish_load(this, this.default.clone(), false);
        }
    }

    async fn load(this: Rc<Self>) {
        let (value, durable) = match this.store.get(&this.key).await {
            Ok(Some(raw)) => match this.codec.decode(&raw) {
                Ok(value) => {
                    log::info!("Loaded `{}` from store", this.key);
                    (value, true)
                }
                Err(source) => {
                    this.report(PersistError::Deserialization {
                        key: this.key.clone(),
                        source,
                    });
                    (this.default.clone(), true)
                }
            },
            Ok(None) => {
                log::info!("No stored value for `{}`, using default", this.key);
                (this.default.clone(), true)
            }
            Err(source) => {
                this.report(PersistError::StoreUnavailable {
                    key: this.key.clone(),
                    op: StoreOp::Get,
                    source,
                });
                (this.default.clone(), false)
            }
        };
        Self::finish_load(&this, value, durable);
    }

    fn finish_load(this: &Rc<Self>, value: T, durable: bool) {
        let waiters = {
            let mut state = this.state.borrow_mut();
            state.current = value;
            state.phase = Phase::Ready;
            state.durable = durable;
            std::mem::take(&mut state.ready_waiters)
        };
        this.notify();

        loop {
            let next = this.state.borrow_mut().queued.pop_front();
            match next {
                Some(intent) => Self::apply(this, intent),
                None => break,
            }
        }

        for tx in waiters {
            let _ = tx.send(());
        }
        this.wake_if_settled();
    }

    fn apply(this: &Rc<Self>, intent: Intent<T>) {
        let write = match intent {
            Intent::Set(value) => {
                this.state.borrow_mut().current = value;
                PendingWrite::Put
            }
            Intent::Update(f) => {
                // Run user code without holding the borrow
                let mut value = this.state.borrow().current.clone();
                this.state.borrow_mut().updating = true;
                f(&mut value);
                let mut state = this.state.borrow_mut();
                state.current = value;
                state.updating = false;
                PendingWrite::Put
            }
            Intent::Clear => {
                this.state.borrow_mut().current = this.default.clone();
                log::info!("Cleared `{}`", this.key);
                PendingWrite::Remove
            }
        };
        this.notify();
        Self::schedule(this, write);

        loop {
            let next = this.state.borrow_mut().deferred.pop_front();
            match next {
                Some(intent) => Self::apply(this, intent),
                None => break,
            }
        }
    }

    fn schedule(this: &Rc<Self>, write: PendingWrite) {
        let start_writer = {
            let mut state = this.state.borrow_mut();
            if !state.durable {
                return;
            }
            state.pending = Some(write);
            !std::mem::replace(&mut state.writing, true)
        };
        if !start_writer {
            return;
        }

        if let Err(source) = this.spawner.spawn_local(Self::write_loop(Rc::clone(this))) {
            {
                let mut state = this.state.borrow_mut();
                state.writing = false;
                state.pending = None;
            }
            this.report(PersistError::Spawn {
                key: this.key.clone(),
                source,
            });
            this.wake_if_settled();
        }
    }

    async fn write_loop(this: Rc<Self>) {
        loop {
            let next = {
                let mut state = this.state.borrow_mut();
                let next = state.pending.take();
                if next.is_none() {
                    state.writing = false;
                }
                next
            };
            let Some(write) = next else {
                this.wake_if_settled();
                return;
            };

            let result = match write {
                PendingWrite::Put => {
                    let encoded = this.codec.encode(&this.state.borrow().current);
                    match encoded {
                        Ok(raw) => this.store.set(&this.key, &raw).await.map_err(|source| {
                            PersistError::StoreUnavailable {
                                key: this.key.clone(),
                                op: StoreOp::Set,
                                source,
                            }
                        }),
                        Err(source) => Err(PersistError::Serialization {
                            key: this.key.clone(),
                            source,
                        }),
                    }
                }
                PendingWrite::Remove => this.store.remove(&this.key).await.map_err(|source| {
                    PersistError::StoreUnavailable {
                        key: this.key.clone(),
                        op: StoreOp::Remove,
                        source,
                    }
                }),
            };

            match result {
                Ok(()) => {
                    this.state.borrow_mut().last_synced_at = Some(SystemTime::now());
                    log::debug!("Synced `{}` ({:?})", this.key, write);
                }
                Err(err) => this.report(err),
            }
        }
    }
}

impl<T: Clone, S> Shared<T, S> {
    fn notify(&self) {
        let (value, listeners) = {
            let state = self.state.borrow();
            if state.listeners.is_empty() {
                return;
            }
            let listeners: Vec<Listener<T>> =
                state.listeners.iter().map(|(_, l)| Rc::clone(l)).collect();
            (state.current.clone(), listeners)
        };
        for listener in listeners {
            listener(&value);
        }
    }

    fn report(&self, err: PersistError) {
        log::warn!("{}", err);
        (self.on_error)(&err);
    }

    fn wake_if_settled(&self) {
        let waiters = {
            let mut state = self.state.borrow_mut();
            if !state.is_settled() {
                return;
            }
            std::mem::take(&mut state.settled_waiters)
        };
        for tx in waiters {
            let _ = tx.send(());
        }
    }
}

impl<T: fmt::Debug, S> fmt::Debug for PersistentValue<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("PersistentValue")
            .field("key", &self.shared.key)
            .field("current", &state.current)
            .field("phase", &state.phase)
            .field("durable", &state.durable)
            .field("last_synced_at", &state.last_synced_at)
            .finish()
    }
}
