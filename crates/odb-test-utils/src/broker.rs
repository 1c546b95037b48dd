use odb_core::{
    BrokerError, BrokerServices, InstanceLister, LastOperation, OperationData, OperationState,
    UpgradeOperation,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Scripted `BrokerServices`
///
/// Responses are scripted per instance and consumed in order; the last one
/// repeats. Unscripted upgrades fail, unscripted polls succeed.
#[derive(Debug, Default)]
pub struct FakeBrokerServices {
    upgrades: Mutex<HashMap<String, VecDeque<Result<UpgradeOperation, BrokerError>>>>,
    last_operations: Mutex<HashMap<String, VecDeque<Result<LastOperation, BrokerError>>>>,
    upgrade_calls: Mutex<Vec<String>>,
    last_operation_calls: Mutex<Vec<(String, u64)>>,
}

impl FakeBrokerServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer successive upgrade requests for `instance` with `responses`
    pub fn script_upgrade(
        &self,
        instance: &str,
        responses: impl IntoIterator<Item = UpgradeOperation>,
    ) {
        self.upgrades
            .lock()
            .insert(instance.to_string(), responses.into_iter().map(Ok).collect());
    }

    pub fn upgrade_fails(&self, instance: &str, error: BrokerError) {
        self.upgrades
            .lock()
            .insert(instance.to_string(), VecDeque::from([Err(error)]));
    }

    /// Answer successive polls for `instance` with `states`
    pub fn script_last_operation(
        &self,
        instance: &str,
        states: impl IntoIterator<Item = OperationState>,
    ) {
        let responses = states
            .into_iter()
            .map(|state| {
                Ok(LastOperation {
                    state,
                    description: String::new(),
                })
            })
            .collect();
        self.last_operations
            .lock()
            .insert(instance.to_string(), responses);
    }

    pub fn last_operation_fails(&self, instance: &str, error: BrokerError) {
        self.last_operations
            .lock()
            .insert(instance.to_string(), VecDeque::from([Err(error)]));
    }

    pub fn upgrade_calls(&self) -> Vec<String> {
        self.upgrade_calls.lock().clone()
    }

    pub fn last_operation_calls(&self) -> Vec<(String, u64)> {
        self.last_operation_calls.lock().clone()
    }
}

fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait::async_trait]
impl BrokerServices for FakeBrokerServices {
    async fn upgrade_instance(&self, instance_id: &str) -> Result<UpgradeOperation, BrokerError> {
        self.upgrade_calls.lock().push(instance_id.to_string());
        self.upgrades
            .lock()
            .get_mut(instance_id)
            .and_then(next)
            .unwrap_or_else(|| {
                Err(BrokerError::Other(format!(
                    "FakeBrokerServices: no upgrade response for {instance_id}"
                )))
            })
    }

    async fn last_operation(
        &self,
        instance_id: &str,
        operation_data: &OperationData,
    ) -> Result<LastOperation, BrokerError> {
        self.last_operation_calls
            .lock()
            .push((instance_id.to_string(), operation_data.bosh_task_id));
        self.last_operations
            .lock()
            .get_mut(instance_id)
            .and_then(next)
            .unwrap_or_else(|| {
                Ok(LastOperation {
                    state: OperationState::Succeeded,
                    description: String::new(),
                })
            })
    }
}

/// `InstanceLister` returning a fixed fleet
#[derive(Debug)]
pub struct FakeInstanceLister {
    result: Result<Vec<String>, BrokerError>,
}

impl FakeInstanceLister {
    pub fn new<S: Into<String>>(instances: impl IntoIterator<Item = S>) -> Self {
        Self {
            result: Ok(instances.into_iter().map(Into::into).collect()),
        }
    }

    pub fn failing(error: BrokerError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait::async_trait]
impl InstanceLister for FakeInstanceLister {
    async fn instances(&self) -> Result<Vec<String>, BrokerError> {
        self.result.clone()
    }
}
