use odb_director::{Director, DirectorError, Task};
use parking_lot::Mutex;

/// Scriptable `Director` recording every call
///
/// Results are returned as configured, errors as `DirectorError::Other` so
/// their message is the configured text. Deployments are never submitted by
/// the code under test, so `deploy` always fails. Task lists are returned in the
/// order given, as a director client returns them after normalising.
#[derive(Debug)]
pub struct FakeDirector {
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    get_task: Result<Task, String>,
    tasks_by_context: Result<Vec<Task>, String>,
    delete_deployment: Result<u64, String>,
    run_errand: Result<u64, String>,

    get_task_calls: Vec<u64>,
    tasks_by_context_calls: Vec<(String, String)>,
    delete_deployment_calls: Vec<(String, String)>,
    run_errand_calls: Vec<(String, String, String)>,
}

impl Default for FakeDirector {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                get_task: Err("FakeDirector: no task configured".to_string()),
                tasks_by_context: Ok(Vec::new()),
                delete_deployment: Ok(0),
                run_errand: Ok(0),
                get_task_calls: Vec::new(),
                tasks_by_context_calls: Vec::new(),
                delete_deployment_calls: Vec::new(),
                run_errand_calls: Vec::new(),
            }),
        }
    }
}

impl FakeDirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_task_returns(&self, task: Task) {
        self.state.lock().get_task = Ok(task);
    }

    pub fn get_task_errors(&self, message: &str) {
        self.state.lock().get_task = Err(message.to_string());
    }

    pub fn tasks_by_context_returns(&self, tasks: Vec<Task>) {
        self.state.lock().tasks_by_context = Ok(tasks);
    }

    pub fn tasks_by_context_errors(&self, message: &str) {
        self.state.lock().tasks_by_context = Err(message.to_string());
    }

    pub fn delete_deployment_returns(&self, task_id: u64) {
        self.state.lock().delete_deployment = Ok(task_id);
    }

    pub fn delete_deployment_errors(&self, message: &str) {
        self.state.lock().delete_deployment = Err(message.to_string());
    }

    pub fn run_errand_returns(&self, task_id: u64) {
        self.state.lock().run_errand = Ok(task_id);
    }

    pub fn run_errand_errors(&self, message: &str) {
        self.state.lock().run_errand = Err(message.to_string());
    }

    pub fn get_task_calls(&self) -> Vec<u64> {
        self.state.lock().get_task_calls.clone()
    }

    pub fn tasks_by_context_calls(&self) -> Vec<(String, String)> {
        self.state.lock().tasks_by_context_calls.clone()
    }

    pub fn delete_deployment_calls(&self) -> Vec<(String, String)> {
        self.state.lock().delete_deployment_calls.clone()
    }

    pub fn run_errand_calls(&self) -> Vec<(String, String, String)> {
        self.state.lock().run_errand_calls.clone()
    }
}

fn director_result<T>(result: &Result<T, String>) -> Result<T, DirectorError>
where
    T: Clone,
{
    result.clone().map_err(DirectorError::Other)
}

#[async_trait::async_trait]
impl Director for FakeDirector {
    async fn get_task(&self, task_id: u64) -> Result<Task, DirectorError> {
        let mut state = self.state.lock();
        state.get_task_calls.push(task_id);
        director_result(&state.get_task)
    }

    async fn get_normalised_tasks_by_context(
        &self,
        deployment_name: &str,
        context_id: &str,
    ) -> Result<Vec<Task>, DirectorError> {
        let mut state = self.state.lock();
        state
            .tasks_by_context_calls
            .push((deployment_name.to_string(), context_id.to_string()));
        director_result(&state.tasks_by_context)
    }

    async fn deploy(&self, _manifest: &[u8], _context_id: Option<&str>) -> Result<u64, DirectorError> {
        Err(DirectorError::Other("FakeDirector: deploy is not supported".to_string()))
    }

    async fn delete_deployment(
        &self,
        deployment_name: &str,
        context_id: &str,
    ) -> Result<u64, DirectorError> {
        let mut state = self.state.lock();
        state
            .delete_deployment_calls
            .push((deployment_name.to_string(), context_id.to_string()));
        director_result(&state.delete_deployment)
    }

    async fn run_errand(
        &self,
        deployment_name: &str,
        errand_name: &str,
        context_id: &str,
    ) -> Result<u64, DirectorError> {
        let mut state = self.state.lock();
        state.run_errand_calls.push((
            deployment_name.to_string(),
            errand_name.to_string(),
            context_id.to_string(),
        ));
        director_result(&state.run_errand)
    }
}
