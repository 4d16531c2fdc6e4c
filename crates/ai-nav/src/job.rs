//! Cancellable, pollable path queries.
//!
//! Path computation may run on any executor; the cooperative thread only ever observes a
//! job's outcome by polling it. A job owns a [`CancelToken`] shared with its worker so the
//! worker can abandon the computation early. Cancelling is idempotent, and a cancelled job
//! never reports a result afterwards.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ai_core::{AgentId, Vec3};
use futures::channel::oneshot;
use thiserror::Error;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A sphere the path should keep out of, derived from a hostile's avoidance range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DangerZone {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct PathRequest {
    pub agent: AgentId,
    pub from: Vec3,
    pub to: Vec3,
    pub avoid: Vec<DangerZone>,
    pub cancel: CancelToken,
}

impl PathRequest {
    /// Judge the straight segment `from → to` against the danger zones.
    ///
    /// Backends without a real path corridor can use this directly; backends that do have
    /// one should run the same test against each corridor segment.
    pub fn assess_segment(&self) -> PathVerdict {
        let dangerous = self.avoid.iter().any(|zone| {
            segment_point_distance_sq(self.from, self.to, zone.center) < zone.radius * zone.radius
        });
        if dangerous {
            PathVerdict::Dangerous
        } else {
            PathVerdict::Safe {
                length: self.from.distance(self.to),
            }
        }
    }
}

fn segment_point_distance_sq(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a.distance_squared(p);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t).distance_squared(p)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathVerdict {
    /// A path exists and stays clear of every danger zone.
    Safe { length: f32 },
    /// A path exists but passes through at least one danger zone.
    Dangerous,
    Unreachable,
}

impl PathVerdict {
    pub fn is_safe(self) -> bool {
        matches!(self, PathVerdict::Safe { .. })
    }

    pub fn is_reachable(self) -> bool {
        !matches!(self, PathVerdict::Unreachable)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PathFault {
    #[error("path worker dropped its job without answering")]
    WorkerLost,

    #[error("path job result was already consumed")]
    Consumed,

    #[error("path backend failed: {0}")]
    Backend(String),
}

pub type PathResult = Result<PathVerdict, PathFault>;

#[derive(Debug, Clone, PartialEq)]
pub enum PathPoll {
    Pending,
    Ready(PathResult),
    Canceled,
}

enum JobState {
    Waiting(oneshot::Receiver<PathResult>),
    Finished,
    Canceled,
}

/// Worker half of a [`PathJob`].
pub struct PathJobSender {
    tx: oneshot::Sender<PathResult>,
    cancel: CancelToken,
}

impl PathJobSender {
    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Deliver the outcome. Dropped silently if the job was cancelled or discarded.
    pub fn send(self, result: PathResult) {
        if self.cancel.is_canceled() {
            return;
        }
        let _ = self.tx.send(result);
    }
}

/// Cooperative-thread half of an asynchronous path query.
pub struct PathJob {
    cancel: CancelToken,
    state: JobState,
}

impl PathJob {
    pub fn channel(cancel: CancelToken) -> (PathJobSender, PathJob) {
        let (tx, rx) = oneshot::channel();
        let sender = PathJobSender {
            tx,
            cancel: cancel.clone(),
        };
        let job = PathJob {
            cancel,
            state: JobState::Waiting(rx),
        };
        (sender, job)
    }

    /// A job that has already resolved, for synchronous backends.
    pub fn ready(cancel: CancelToken, result: PathResult) -> Self {
        let (sender, job) = Self::channel(cancel);
        sender.send(result);
        job
    }

    /// Run `compute` on tokio's blocking pool. The closure receives the job's token and should
    /// check it between expensive steps.
    pub fn spawn_blocking<F>(
        handle: &tokio::runtime::Handle,
        cancel: CancelToken,
        compute: F,
    ) -> Self
    where
        F: FnOnce(&CancelToken) -> PathResult + Send + 'static,
    {
        let (sender, job) = Self::channel(cancel);
        handle.spawn_blocking(move || {
            if sender.is_canceled() {
                return;
            }
            let result = compute(sender.cancel_token());
            sender.send(result);
        });
        job
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self.state, JobState::Canceled) || self.cancel.is_canceled()
    }

    pub fn poll(&mut self) -> PathPoll {
        if self.cancel.is_canceled() {
            self.state = JobState::Canceled;
        }

        match &mut self.state {
            JobState::Canceled => PathPoll::Canceled,
            JobState::Finished => PathPoll::Ready(Err(PathFault::Consumed)),
            JobState::Waiting(rx) => match rx.try_recv() {
                Ok(None) => PathPoll::Pending,
                Ok(Some(result)) => {
                    self.state = JobState::Finished;
                    PathPoll::Ready(result)
                }
                Err(oneshot::Canceled) => {
                    self.state = JobState::Finished;
                    PathPoll::Ready(Err(PathFault::WorkerLost))
                }
            },
        }
    }

    /// Request the worker to stop. Safe to call any number of times.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        if matches!(self.state, JobState::Waiting(_)) {
            self.state = JobState::Canceled;
        }
    }
}

impl Drop for PathJob {
    fn drop(&mut self) {
        // Backstop only: owners cancel explicitly through `PathSlot`.
        self.cancel.cancel();
    }
}

/// Holds at most one in-flight [`PathJob`].
///
/// A job is acquired on [`PathSlot::issue`] and released when it resolves, when it is
/// cancelled, or on [`PathSlot::cancel`]. Issuing cancels the previous job before the new
/// request is built.
#[derive(Default)]
pub struct PathSlot {
    job: Option<PathJob>,
    issued: u64,
    canceled: u64,
}

impl fmt::Debug for PathSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathSlot")
            .field("pending", &self.is_pending())
            .field("issued", &self.issued)
            .field("canceled", &self.canceled)
            .finish()
    }
}

impl PathSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue<F>(&mut self, make: F)
    where
        F: FnOnce(CancelToken) -> PathJob,
    {
        self.cancel();
        self.job = Some(make(CancelToken::new()));
        self.issued += 1;
    }

    /// `None` when nothing is in flight. A resolved or cancelled job is released.
    pub fn poll(&mut self) -> Option<PathPoll> {
        let job = self.job.as_mut()?;
        let poll = job.poll();
        if !matches!(poll, PathPoll::Pending) {
            self.job = None;
        }
        Some(poll)
    }

    /// Cancel and release the in-flight job. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        match self.job.take() {
            Some(mut job) => {
                job.cancel();
                self.canceled += 1;
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.job.is_some()
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn canceled(&self) -> u64 {
        self.canceled
    }
}
