use odb_core::{Listener, UpgradeOperationType};
use parking_lot::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    Starting,
    InstancesToUpgrade(Vec<String>),
    InstanceUpgradeStarting {
        instance: String,
        index: usize,
        total: usize,
    },
    InstanceUpgradeStartResult(UpgradeOperationType),
    WaitingFor {
        instance: String,
        task_id: u64,
    },
    InstanceUpgraded {
        instance: String,
        result: String,
    },
    Progress {
        attempt_interval: Duration,
        orphaned: usize,
        upgraded: usize,
        to_retry: usize,
        deleted: usize,
    },
    Finished {
        orphaned: usize,
        upgraded: usize,
        deleted: usize,
    },
}

/// `Listener` recording every event in order
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().clone()
    }

    pub fn progress_events(&self) -> Vec<ListenerEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, ListenerEvent::Progress { .. }))
            .collect()
    }

    pub fn finished_events(&self) -> Vec<ListenerEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, ListenerEvent::Finished { .. }))
            .collect()
    }

    fn record(&self, event: ListenerEvent) {
        self.events.lock().push(event);
    }
}

impl Listener for RecordingListener {
    fn starting(&self) {
        self.record(ListenerEvent::Starting);
    }

    fn instances_to_upgrade(&self, instances: &[String]) {
        self.record(ListenerEvent::InstancesToUpgrade(instances.to_vec()));
    }

    fn instance_upgrade_starting(&self, instance: &str, index: usize, total: usize) {
        self.record(ListenerEvent::InstanceUpgradeStarting {
            instance: instance.to_string(),
            index,
            total,
        });
    }

    fn instance_upgrade_start_result(&self, result: UpgradeOperationType) {
        self.record(ListenerEvent::InstanceUpgradeStartResult(result));
    }

    fn waiting_for(&self, instance: &str, task_id: u64) {
        self.record(ListenerEvent::WaitingFor {
            instance: instance.to_string(),
            task_id,
        });
    }

    fn instance_upgraded(&self, instance: &str, result: &str) {
        self.record(ListenerEvent::InstanceUpgraded {
            instance: instance.to_string(),
            result: result.to_string(),
        });
    }

    fn progress(
        &self,
        attempt_interval: Duration,
        orphaned: usize,
        upgraded: usize,
        to_retry: usize,
        deleted: usize,
    ) {
        self.record(ListenerEvent::Progress {
            attempt_interval,
            orphaned,
            upgraded,
            to_retry,
            deleted,
        });
    }

    fn finished(&self, orphaned: usize, upgraded: usize, deleted: usize) {
        self.record(ListenerEvent::Finished {
            orphaned,
            upgraded,
            deleted,
        });
    }
}
