//! LifeCycleRunner behaviour against a scripted director.

use odb_core::{LifeCycleRunner, LifecycleError, OperationData, OperationState, OperationType};
use odb_director::TaskState;
use odb_test_utils::{
    context_task, test_plans, FakeDirector, CONTEXT_ID, DEPLOYMENT_NAME, ERRAND, PLAN_ID,
    PLAN_ID_WITHOUT_ERRANDS,
};
use std::sync::Arc;

fn setup() -> (Arc<FakeDirector>, LifeCycleRunner) {
    let director = Arc::new(FakeDirector::new());
    let runner = LifeCycleRunner::new(director.clone(), test_plans());
    (director, runner)
}

fn correlated(operation_type: OperationType, plan_id: &str) -> OperationData {
    OperationData::correlated(operation_type, 0, CONTEXT_ID, plan_id)
}

mod post_deploy_errand {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn first_task_incomplete_is_returned() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![context_task(1, TaskState::Processing)]);

        let task = runner
            .get_task(DEPLOYMENT_NAME, &correlated(OperationType::Create, PLAN_ID))
            .await
            .unwrap();

        assert_eq!(task.state, TaskState::Processing);
        assert!(director.run_errand_calls().is_empty());
        assert_eq!(
            director.tasks_by_context_calls(),
            vec![(DEPLOYMENT_NAME.to_string(), CONTEXT_ID.to_string())]
        );
    }

    #[tokio::test]
    async fn first_task_errored_is_returned() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![context_task(2, TaskState::Error)]);

        let task = runner
            .get_task(DEPLOYMENT_NAME, &correlated(OperationType::Create, PLAN_ID))
            .await
            .unwrap();

        assert_eq!(task.state, TaskState::Error);
        assert!(director.run_errand_calls().is_empty());
    }

    #[tokio::test]
    async fn no_tasks_for_context_is_an_error() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(Vec::new());

        let err = runner
            .get_task(DEPLOYMENT_NAME, &correlated(OperationType::Create, PLAN_ID))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "no tasks found for context id: some-uuid");
    }

    #[tokio::test]
    async fn completed_task_without_errand_is_returned() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![context_task(3, TaskState::Done)]);

        let task = runner
            .get_task(
                DEPLOYMENT_NAME,
                &correlated(OperationType::Create, PLAN_ID_WITHOUT_ERRANDS),
            )
            .await
            .unwrap();

        assert_eq!(task.state, TaskState::Done);
        assert!(director.run_errand_calls().is_empty());
    }

    #[tokio::test]
    async fn completed_task_runs_configured_errand_with_context() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![context_task(3, TaskState::Done)]);
        director.run_errand_returns(1);
        director.get_task_returns(context_task(1, TaskState::Processing));

        let task = runner
            .get_task(DEPLOYMENT_NAME, &correlated(OperationType::Create, PLAN_ID))
            .await
            .unwrap();

        assert_eq!(
            director.run_errand_calls(),
            vec![(
                DEPLOYMENT_NAME.to_string(),
                ERRAND.to_string(),
                CONTEXT_ID.to_string()
            )]
        );
        assert_eq!(director.get_task_calls(), vec![1]);
        assert_eq!(task.id, 1);
        assert_eq!(task.state, TaskState::Processing);
    }

    #[tokio::test]
    async fn later_polls_never_rerun_the_errand() {
        let (director, runner) = setup();
        let data = correlated(OperationType::Create, PLAN_ID);
        director.tasks_by_context_returns(vec![context_task(3, TaskState::Done)]);
        director.run_errand_returns(1);
        director.get_task_returns(context_task(1, TaskState::Processing));
        runner.get_task(DEPLOYMENT_NAME, &data).await.unwrap();

        for errand_state in [TaskState::Processing, TaskState::Done, TaskState::Error] {
            director.tasks_by_context_returns(vec![
                context_task(4, errand_state),
                context_task(3, TaskState::Done),
            ]);

            let task = runner.get_task(DEPLOYMENT_NAME, &data).await.unwrap();

            assert_eq!(task.state, errand_state);
            assert_eq!(director.run_errand_calls().len(), 1);
        }
    }

    #[tokio::test]
    async fn errand_submission_error_is_returned_verbatim() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![context_task(3, TaskState::Done)]);
        director.run_errand_errors("some errand err");

        let err = runner
            .get_task(DEPLOYMENT_NAME, &correlated(OperationType::Create, PLAN_ID))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "some errand err");
        assert!(matches!(err, LifecycleError::Director(_)));
    }

    #[tokio::test]
    async fn errand_task_lookup_error_is_returned_verbatim() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![context_task(3, TaskState::Done)]);
        director.run_errand_returns(1);
        director.get_task_errors("some err");

        let err = runner
            .get_task(DEPLOYMENT_NAME, &correlated(OperationType::Create, PLAN_ID))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "some err");
    }

    #[tokio::test]
    async fn unknown_plan_runs_no_errand() {
        let (director, runner) = setup();
        let done = context_task(3, TaskState::Done);
        director.tasks_by_context_returns(vec![done.clone()]);

        let task = runner
            .get_task(
                DEPLOYMENT_NAME,
                &correlated(OperationType::Create, "non-existent-plan"),
            )
            .await
            .unwrap();

        assert_eq!(task, done);
        assert!(director.run_errand_calls().is_empty());
    }

    #[tokio::test]
    async fn task_list_error_is_returned_verbatim() {
        let (director, runner) = setup();
        director.tasks_by_context_errors("some err");

        let err = runner
            .get_task(DEPLOYMENT_NAME, &correlated(OperationType::Create, PLAN_ID))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "some err");
    }

    #[tokio::test]
    async fn errand_runs_for_deploying_operations_only() {
        let cases = [
            (OperationType::Create, 1),
            (OperationType::Update, 1),
            (OperationType::Upgrade, 1),
            (OperationType::Delete, 0),
        ];

        for (operation_type, errand_runs) in cases {
            let (director, runner) = setup();
            director.tasks_by_context_returns(vec![context_task(3, TaskState::Done)]);
            director.get_task_returns(context_task(4, TaskState::Queued));

            let _ = runner
                .get_task(DEPLOYMENT_NAME, &correlated(operation_type, PLAN_ID))
                .await;

            assert_eq!(
                director.run_errand_calls().len(),
                errand_runs,
                "{operation_type}"
            );
        }
    }
}

mod task_id_mode {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn task_is_fetched_by_id() {
        let (director, runner) = setup();
        let processing = context_task(1, TaskState::Processing);
        director.get_task_returns(processing.clone());

        let task = runner
            .get_task(DEPLOYMENT_NAME, &OperationData::new(OperationType::Create, 1))
            .await
            .unwrap();

        assert_eq!(task, processing);
        assert_eq!(director.get_task_calls(), vec![1]);
        assert!(director.tasks_by_context_calls().is_empty());
    }

    #[tokio::test]
    async fn director_error_is_returned_verbatim() {
        let (director, runner) = setup();
        director.get_task_errors("error getting tasks");

        let err = runner
            .get_task(DEPLOYMENT_NAME, &OperationData::new(OperationType::Create, 1))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "error getting tasks");
    }

    #[tokio::test]
    async fn empty_context_id_uses_task_id() {
        let (director, runner) = setup();
        director.get_task_returns(context_task(5, TaskState::Done));

        let data = OperationData::correlated(OperationType::Create, 5, "", PLAN_ID);
        runner.get_task(DEPLOYMENT_NAME, &data).await.unwrap();

        assert_eq!(director.get_task_calls(), vec![5]);
        assert!(director.run_errand_calls().is_empty());
    }
}

mod pre_delete_errand {
    use super::*;
    use pretty_assertions::assert_eq;

    fn delete_data() -> OperationData {
        correlated(OperationType::Delete, PLAN_ID)
    }

    #[tokio::test]
    async fn first_task_incomplete_is_returned() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![context_task(1, TaskState::Processing)]);

        let task = runner.get_task(DEPLOYMENT_NAME, &delete_data()).await.unwrap();

        assert_eq!(task.state, TaskState::Processing);
        assert!(director.delete_deployment_calls().is_empty());
    }

    #[tokio::test]
    async fn first_task_errored_is_returned() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![context_task(2, TaskState::Error)]);

        let task = runner.get_task(DEPLOYMENT_NAME, &delete_data()).await.unwrap();

        assert_eq!(task.state, TaskState::Error);
        assert!(director.delete_deployment_calls().is_empty());
    }

    #[tokio::test]
    async fn no_tasks_for_context_is_an_error() {
        let (director, runner) = setup();

        let err = runner
            .get_task(DEPLOYMENT_NAME, &delete_data())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "no tasks found for context id: some-uuid");
    }

    #[tokio::test]
    async fn completed_errand_deletes_deployment_with_context() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![context_task(3, TaskState::Done)]);
        director.delete_deployment_returns(1);
        director.get_task_returns(context_task(1, TaskState::Processing));

        let task = runner.get_task(DEPLOYMENT_NAME, &delete_data()).await.unwrap();

        assert_eq!(
            director.delete_deployment_calls(),
            vec![(DEPLOYMENT_NAME.to_string(), CONTEXT_ID.to_string())]
        );
        assert!(director.run_errand_calls().is_empty());
        assert_eq!(task.id, 1);
        assert_eq!(task.state, TaskState::Processing);
    }

    #[tokio::test]
    async fn delete_submission_error_is_returned_verbatim() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![context_task(3, TaskState::Done)]);
        director.delete_deployment_errors("some err");

        let err = runner
            .get_task(DEPLOYMENT_NAME, &delete_data())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "some err");
    }

    #[tokio::test]
    async fn two_tasks_return_the_latest() {
        let (director, runner) = setup();
        let latest = context_task(1, TaskState::Processing);
        director.tasks_by_context_returns(vec![latest.clone(), context_task(3, TaskState::Done)]);

        let task = runner.get_task(DEPLOYMENT_NAME, &delete_data()).await.unwrap();

        assert_eq!(task, latest);
        assert!(director.delete_deployment_calls().is_empty());
    }

    #[tokio::test]
    async fn more_than_two_tasks_is_an_error() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![
            context_task(1, TaskState::Processing),
            context_task(3, TaskState::Done),
            context_task(3, TaskState::Done),
        ]);

        let err = runner
            .get_task(DEPLOYMENT_NAME, &delete_data())
            .await
            .unwrap_err();

        assert!(
            matches!(err, LifecycleError::TooManyTasksForContext { count: 3, .. }),
            "got {err:?}"
        );
        assert!(err.is_invariant_violation());
    }

    #[tokio::test]
    async fn task_list_error_is_returned_verbatim() {
        let (director, runner) = setup();
        director.tasks_by_context_errors("some err");

        let err = runner
            .get_task(DEPLOYMENT_NAME, &delete_data())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "some err");
    }
}

mod last_operation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn running_errand_is_in_progress() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![context_task(3, TaskState::Done)]);
        director.run_errand_returns(4);
        director.get_task_returns(context_task(4, TaskState::Queued));

        let op = runner
            .last_operation(DEPLOYMENT_NAME, &correlated(OperationType::Update, PLAN_ID))
            .await
            .unwrap();

        assert_eq!(op.state, OperationState::InProgress);
    }

    #[tokio::test]
    async fn failed_errand_fails_the_operation() {
        let (director, runner) = setup();
        director.tasks_by_context_returns(vec![
            context_task(4, TaskState::Error),
            context_task(3, TaskState::Done),
        ]);

        let op = runner
            .last_operation(DEPLOYMENT_NAME, &correlated(OperationType::Create, PLAN_ID))
            .await
            .unwrap();

        assert_eq!(op.state, OperationState::Failed);
        assert_eq!(op.description, "Instance provisioning failed: bosh task id 4");
    }
}
