//! Per-frame engine event queue.
//!
//! The window layer appends events while polling; the frame loop reads
//! [`TaskSystem::get_pending_events`] once and then calls
//! [`TaskSystem::clear`]. Reading never drains, and nothing survives a tick.

use std::path::PathBuf;

use toy_core::{Subsystem, SubsystemSlot};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PendingEvent {
    #[default]
    None,
    Resize {
        width: u32,
        height: u32,
    },
    FileDrop(Vec<PathBuf>),
}

/// FIFO of [`PendingEvent`]s. Consumers see events in push order.
#[derive(Debug, Default)]
pub struct TaskSystem {
    events: Vec<PendingEvent>,
}

impl Subsystem for TaskSystem {
    const SLOT: SubsystemSlot = SubsystemSlot::Task;
}

impl TaskSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: PendingEvent) {
        log::trace!("Queued {event:?}");
        self.events.push(event);
    }

    /// Appends a batch, keeping its order.
    pub fn assign<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = PendingEvent>,
    {
        self.events.extend(events);
    }

    #[inline]
    #[must_use]
    pub fn get_pending_events(&self) -> &[PendingEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }
}
