//! The convergence loop as a tokio actor.
//!
//! A single task owns the scheduler, the debouncer and the in-flight pass.
//! Host events and manual requests reach it over a channel held by
//! [`SyncHandle`]. Passes run on their own task so the loop keeps receiving
//! events while mutations are being applied.
//!
//! Shutdown drains accepted work first: the in-flight pass, every pending
//! unpin confirmation (at its deadline), then any debounced pass.

use std::collections::VecDeque;
use std::future;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use super::pass::{PassContext, run_pass};
use super::scheduler::{Debouncer, LoopState, Scheduler};
use super::types::{HostEvent, PassReport, SyncError, Trigger};
use crate::canonical::{CanonicalStore, KvStore};
use crate::config::{SyncConfig, TimingConfig};
use crate::host::{Host, InstanceId};

const CHANNEL_CAPACITY: usize = 256;

type PassResult = Result<PassReport, SyncError>;

#[derive(Debug)]
enum EngineMsg {
  Event(HostEvent),
  Force { resp: oneshot::Sender<PassResult> },
  State { resp: oneshot::Sender<LoopState> },
  Shutdown { resp: oneshot::Sender<()> },
}

/// Cloneable handle to a running [`SyncEngine`].
#[derive(Debug, Clone)]
pub struct SyncHandle {
  tx: mpsc::Sender<EngineMsg>,
}

impl SyncHandle {
  /// Delivers a host event.
  pub async fn notify(&self, event: HostEvent) -> Result<(), SyncError> {
    self
      .tx
      .send(EngineMsg::Event(event))
      .await
      .map_err(|_| SyncError::EngineStopped)
  }

  /// Requests a pass and waits for its result.
  ///
  /// The request is debounced with the `manual` delay. If a pass is already
  /// running, the caller receives the result of the follow-up pass.
  pub async fn force_reconcile(&self) -> PassResult {
    let (resp, rx) = oneshot::channel();
    self
      .tx
      .send(EngineMsg::Force { resp })
      .await
      .map_err(|_| SyncError::EngineStopped)?;
    rx.await.map_err(|_| SyncError::EngineStopped)?
  }

  pub async fn state(&self) -> Result<LoopState, SyncError> {
    let (resp, rx) = oneshot::channel();
    self
      .tx
      .send(EngineMsg::State { resp })
      .await
      .map_err(|_| SyncError::EngineStopped)?;
    rx.await.map_err(|_| SyncError::EngineStopped)
  }

  /// Stops the loop once accepted work has finished: the in-flight pass,
  /// pending unpin confirmations and any scheduled pass.
  pub async fn shutdown(&self) -> Result<(), SyncError> {
    let (resp, rx) = oneshot::channel();
    self
      .tx
      .send(EngineMsg::Shutdown { resp })
      .await
      .map_err(|_| SyncError::EngineStopped)?;
    rx.await.map_err(|_| SyncError::EngineStopped)
  }
}

/// An unpin awaiting confirmation.
#[derive(Debug, Clone, Copy)]
struct PendingUnpin {
  instance: InstanceId,
  due: Instant,
}

/// Debounced, single-flight reconciliation driven by host events.
pub struct SyncEngine<H: ?Sized, K> {
  host: Arc<H>,
  store: Arc<Mutex<CanonicalStore<K>>>,
  ctx: Arc<PassContext>,
  timing: TimingConfig,
  scheduler: Scheduler,
  debouncer: Debouncer,
  in_flight: Option<JoinHandle<PassResult>>,
  /// Callers waiting on the in-flight pass.
  waiting: Vec<oneshot::Sender<PassResult>>,
  /// Callers waiting on the next pass to start.
  queued: Vec<oneshot::Sender<PassResult>>,
  /// Ordered by deadline; every unpin waits the same delay.
  unpins: VecDeque<PendingUnpin>,
  rx: mpsc::Receiver<EngineMsg>,
}

impl<H, K> SyncEngine<H, K>
where
  H: Host + ?Sized + 'static,
  K: KvStore + 'static,
{
  /// Starts the loop on the current tokio runtime.
  ///
  /// The loop stops when [`SyncHandle::shutdown`] is called or every handle
  /// has been dropped.
  pub fn spawn(host: Arc<H>, store: Arc<Mutex<CanonicalStore<K>>>, config: SyncConfig) -> SyncHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let engine = Self {
      host,
      store,
      ctx: Arc::new(PassContext::from_config(&config)),
      timing: config.timing,
      scheduler: Scheduler::new(),
      debouncer: Debouncer::new(),
      in_flight: None,
      waiting: Vec::new(),
      queued: Vec::new(),
      unpins: VecDeque::new(),
      rx,
    };
    tokio::spawn(engine.run());
    SyncHandle { tx }
  }

  async fn run(mut self) {
    info!(policy = %self.ctx.policy, "sync engine started");
    let mut shutdown_ack = None;

    loop {
      let deadline = self.debouncer.deadline();
      let unpin_due = self.unpins.front().map(|unpin| unpin.due);
      tokio::select! {
        msg = self.rx.recv() => match msg {
          Some(EngineMsg::Shutdown { resp }) => {
            shutdown_ack = Some(resp);
            break;
          }
          Some(msg) => self.handle(msg).await,
          None => {
            debug!("all handles dropped");
            break;
          }
        },

        _ = sleep_until_deadline(deadline) => {
          if self.debouncer.fire(Instant::now()) {
            self.request_pass();
          }
        }

        _ = sleep_until_deadline(unpin_due) => {
          if let Some(unpin) = self.unpins.pop_front() {
            self.confirm_unpin(unpin.instance).await;
          }
        }

        result = join_in_flight(&mut self.in_flight) => {
          self.finish_pass(result);
          if self.scheduler.complete() {
            debug!("running follow-up pass");
            self.start_pass();
          }
        }
      }
    }

    self.rx.close();
    self.drain().await;
    info!("sync engine stopped");
    if let Some(resp) = shutdown_ack {
      let _ = resp.send(());
    }
  }

  /// Finishes accepted work before the loop stops.
  ///
  /// Pending unpins are confirmed at their deadlines, not early, so a
  /// collection being torn down still aborts them.
  async fn drain(&mut self) {
    loop {
      if let Some(handle) = self.in_flight.take() {
        debug!("waiting for in-flight pass before stopping");
        let result = handle.await;
        self.finish_pass(result);
        if self.scheduler.complete() {
          self.start_pass();
        }
        continue;
      }

      if let Some(unpin) = self.unpins.pop_front() {
        debug!(instance = %unpin.instance, "confirming pending unpin before stopping");
        sleep_until(unpin.due).await;
        self.confirm_unpin(unpin.instance).await;
        continue;
      }

      if self.debouncer.deadline().is_some() {
        info!("running scheduled pass before stopping");
        self.request_pass();
        continue;
      }

      return;
    }
  }

  async fn handle(&mut self, msg: EngineMsg) {
    match msg {
      EngineMsg::Event(event) => self.on_event(event).await,
      EngineMsg::Force { resp } => {
        self.queued.push(resp);
        self.schedule(Trigger::Manual);
      }
      EngineMsg::State { resp } => {
        let _ = resp.send(self.scheduler.state());
      }
      // Handled by the run loop.
      EngineMsg::Shutdown { .. } => {}
    }
  }

  async fn on_event(&mut self, event: HostEvent) {
    let trigger = event.trigger();
    match event {
      HostEvent::Installed | HostEvent::Startup | HostEvent::CollectionCreated { .. } => self.schedule(trigger),
      HostEvent::PinChanged { instance, .. } | HostEvent::ItemCreated { instance } if self.suppressed(instance) => {}
      HostEvent::PinChanged { instance, pinned: true } | HostEvent::ItemCreated { instance } => {
        if self.record_pin(instance).await {
          self.schedule(trigger);
        }
      }
      HostEvent::PinChanged { instance, pinned: false } => {
        if self.ctx.policy.is_derived() {
          self.schedule(trigger);
        } else {
          self.defer_unpin(instance);
        }
      }
    }
  }

  fn suppressed(&self, instance: InstanceId) -> bool {
    let suppressed = self.ctx.suppressor.is_suppressed();
    if suppressed {
      debug!(%instance, "ignoring event inside suppression window");
    }
    suppressed
  }

  /// Records the current target of a pinned instance. Returns true if the
  /// instance is pinned and syncable.
  async fn record_pin(&mut self, instance: InstanceId) -> bool {
    let item = match self.host.get_item(instance).await {
      Ok(Some((_, item))) if item.pinned => item,
      Ok(_) => {
        debug!(%instance, "instance missing or not pinned, nothing to record");
        return false;
      }
      Err(e) => {
        error!(%instance, error = %e, "failed to query pinned instance");
        return false;
      }
    };

    let Some(classified) = self.ctx.identity.classify(&item) else {
      debug!(%instance, "pinned instance is not syncable");
      return false;
    };

    if !self.ctx.policy.is_derived()
      && let Err(e) = self
        .store
        .lock()
        .await
        .pin(&classified.key, &classified.representation, self.ctx.policy)
    {
      error!(%instance, key = %classified.key, target = %classified.representation, error = %e, "failed to record pin");
    }
    true
  }

  fn defer_unpin(&mut self, instance: InstanceId) {
    let delay = self.timing.unpin_confirm_delay;
    debug!(%instance, ?delay, "unpin observed, confirming later");
    self.unpins.push_back(PendingUnpin {
      instance,
      due: Instant::now() + delay,
    });
  }

  /// Removes the instance's key once the unpin is known to be genuine.
  ///
  /// A collection being torn down reports its items as unpinned too, so an
  /// instance that has disappeared, or was pinned again, aborts the removal.
  async fn confirm_unpin(&mut self, instance: InstanceId) {
    let item = match self.host.get_item(instance).await {
      Ok(Some((_, item))) if item.pinned => {
        debug!(%instance, "instance was pinned again, keeping canonical entry");
        return;
      }
      Ok(Some((_, item))) => item,
      Ok(None) => {
        warn!(%instance, "instance closed before unpin was confirmed, keeping canonical entry");
        return;
      }
      Err(e) => {
        error!(%instance, error = %e, "failed to confirm unpin");
        return;
      }
    };

    let Some(classified) = self.ctx.identity.classify(&item) else {
      debug!(%instance, "unpinned instance is not syncable");
      return;
    };

    let removed = self.store.lock().await.unpin(&classified.key);
    match removed {
      Ok(true) => self.schedule(Trigger::PinChanged),
      Ok(false) => debug!(%instance, key = %classified.key, "key already absent from canonical mapping"),
      Err(e) => error!(%instance, key = %classified.key, error = %e, "failed to record unpin"),
    }
  }

  fn schedule(&mut self, trigger: Trigger) {
    let delay = self.timing.debounce.delay_for(trigger);
    debug!(%trigger, ?delay, "reconcile scheduled");
    self.debouncer.schedule(Instant::now(), delay);
  }

  fn request_pass(&mut self) {
    if self.scheduler.request() {
      self.start_pass();
    } else {
      debug!("pass in flight, follow-up queued");
    }
  }

  fn start_pass(&mut self) {
    self.debouncer.cancel();
    self.waiting.append(&mut self.queued);

    let host = Arc::clone(&self.host);
    let store = Arc::clone(&self.store);
    let ctx = Arc::clone(&self.ctx);
    self.in_flight = Some(tokio::spawn(async move { run_pass(&*host, &store, &ctx).await }));
  }

  fn finish_pass(&mut self, result: Result<PassResult, JoinError>) {
    self.in_flight = None;
    let result = result.unwrap_or_else(|e| Err(SyncError::Aborted(e.to_string())));
    if let Err(e) = &result {
      error!(error = %e, "reconciliation pass failed");
    }

    let shared = result.map_err(Arc::new);
    for resp in self.waiting.drain(..) {
      let _ = resp.send(shared.clone().map_err(SyncError::Failed));
    }
  }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
  match deadline {
    Some(deadline) => sleep_until(deadline).await,
    None => future::pending().await,
  }
}

async fn join_in_flight(handle: &mut Option<JoinHandle<PassResult>>) -> Result<PassResult, JoinError> {
  match handle {
    Some(handle) => handle.await,
    None => future::pending().await,
  }
}
