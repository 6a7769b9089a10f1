use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// The two progress channels surfaced to the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ProgressKind {
    Download,
    Extract,
}

/// Observer for progress ticks. Delivery is fire-and-forget: implementations
/// must not block, and a slow or absent observer never affects the operation
/// emitting the ticks.
pub trait ProgressSink: Send + Sync {
    fn report(&self, kind: ProgressKind, percent: f64);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Fan-out registry for progress observers.
///
/// Ticks reach every sink subscribed at emit time, at most once per tick;
/// ticks emitted while nothing is subscribed are lost, which is fine because
/// final state never depends on observing every tick.
#[derive(Clone, Default)]
pub struct ProgressBus {
    inner: Arc<Mutex<BusState>>,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    sinks: HashMap<u64, Arc<dyn ProgressSink>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, sink: Arc<dyn ProgressSink>) -> SubscriptionId {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.sinks.insert(id, sink);
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = self.lock();
        state.sinks.remove(&id.0);
    }

    pub fn emit(&self, kind: ProgressKind, percent: f64) {
        let sinks: Vec<Arc<dyn ProgressSink>> = {
            let state = self.lock();
            state.sinks.values().cloned().collect()
        };
        for sink in sinks {
            sink.report(kind, percent);
        }
    }

    /// A handle bound to one channel, handed to the component doing the work.
    pub fn reporter(&self, kind: ProgressKind) -> Reporter {
        Reporter {
            bus: self.clone(),
            kind,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BusState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[derive(Clone)]
pub struct Reporter {
    bus: ProgressBus,
    kind: ProgressKind,
}

impl Reporter {
    pub fn report(&self, percent: f64) {
        self.bus.emit(self.kind, percent);
    }

    pub fn kind(&self) -> ProgressKind {
        self.kind
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::{ProgressKind, ProgressSink};

    /// Test sink recording every tick it observes.
    #[derive(Default)]
    pub struct RecordingSink {
        ticks: Mutex<Vec<(ProgressKind, f64)>>,
    }

    impl RecordingSink {
        pub fn percents(&self, kind: ProgressKind) -> Vec<f64> {
            self.ticks
                .lock()
                .unwrap()
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, p)| *p)
                .collect()
        }
    }

    impl ProgressSink for RecordingSink {
        fn report(&self, kind: ProgressKind, percent: f64) {
            self.ticks.lock().unwrap().push((kind, percent));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::testing::RecordingSink;
    use super::*;

    #[test]
    fn subscribed_sink_receives_ticks_in_order() {
        let bus = ProgressBus::new();
        let sink = Arc::new(RecordingSink::default());
        bus.subscribe(sink.clone());

        let reporter = bus.reporter(ProgressKind::Download);
        reporter.report(10.0);
        reporter.report(55.5);
        reporter.report(100.0);

        assert_eq!(sink.percents(ProgressKind::Download), vec![10.0, 55.5, 100.0]);
        assert!(sink.percents(ProgressKind::Extract).is_empty());
    }

    #[test]
    fn unsubscribed_sink_stops_receiving() {
        let bus = ProgressBus::new();
        let sink = Arc::new(RecordingSink::default());
        let id = bus.subscribe(sink.clone());

        bus.emit(ProgressKind::Extract, 50.0);
        bus.unsubscribe(id);
        bus.emit(ProgressKind::Extract, 75.0);

        assert_eq!(sink.percents(ProgressKind::Extract), vec![50.0]);
    }

    #[test]
    fn emit_without_observers_is_a_no_op() {
        let bus = ProgressBus::new();
        bus.emit(ProgressKind::Download, 42.0);
    }

    #[test]
    fn every_subscriber_sees_each_tick_once() {
        let bus = ProgressBus::new();
        let first = Arc::new(RecordingSink::default());
        let second = Arc::new(RecordingSink::default());
        bus.subscribe(first.clone());
        bus.subscribe(second.clone());

        bus.emit(ProgressKind::Download, 33.0);

        assert_eq!(first.percents(ProgressKind::Download), vec![33.0]);
        assert_eq!(second.percents(ProgressKind::Download), vec![33.0]);
    }
}
