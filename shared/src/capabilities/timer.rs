//! One-shot delays for press-and-hold repeat.
//!
//! Each armed delay carries the [`RepeatHandle`] of the hold that scheduled
//! it. The core re-arms after every elapsed delay and cancels by handle, so a
//! delay that fires after release is recognised as stale and ignored.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepeatHandle(pub u64);

/// Hands out handles for the lifetime of the core. Drafts come and go, so
/// they never number their own holds.
#[derive(Debug, Clone, Default)]
pub struct RepeatHandles {
    last: u64,
}

impl RepeatHandles {
    pub fn allocate(&mut self) -> RepeatHandle {
        self.last += 1;
        RepeatHandle(self.last)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum TimerOperation {
    Schedule { handle: RepeatHandle, delay_ms: u64 },
    Cancel { handle: RepeatHandle },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerOutput {
    Elapsed,
    Cancelled,
}

impl Operation for TimerOperation {
    type Output = TimerOutput;
}

pub struct HoldTimer<Ev> {
    context: CapabilityContext<TimerOperation, Ev>,
}

impl<Ev> Capability<Ev> for HoldTimer<Ev> {
    type Operation = TimerOperation;
    type MappedSelf<MappedEv> = HoldTimer<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        HoldTimer::new(self.context.map_event(f))
    }
}

impl<Ev> HoldTimer<Ev>
where
    Ev: Send + 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<TimerOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn schedule<F>(&self, handle: RepeatHandle, delay_ms: u64, make_event: F)
    where
        F: FnOnce(TimerOutput) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let output = context
                .request_from_shell(TimerOperation::Schedule { handle, delay_ms })
                .await;
            context.update_app(make_event(output));
        });
    }

    pub fn cancel(&self, handle: RepeatHandle) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(TimerOperation::Cancel { handle }).await;
        });
    }
}
