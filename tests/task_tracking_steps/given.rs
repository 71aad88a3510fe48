//! Given steps for task tracking BDD scenarios.

use super::world::{JpegFile, TaskTrackingWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskmeta::tracking::{
    domain::TaskId,
    ports::TaskSpec,
    services::SubmitTaskRequest,
};

#[given(r#"JPEG file {id:u64} tracks task "{task}""#)]
fn file_tracks_task(world: &mut TaskTrackingWorld, id: u64, task: String) -> Result<(), eyre::Report> {
    let file = JpegFile(id);
    let request = SubmitTaskRequest::new(TaskSpec::new("media.generate_thumbnail"))
        .with_task_id(TaskId::new(task)?);
    run_async(world.service.submit(&file, request)).wrap_err("submit tracked task")?;
    world.remember(file);
    Ok(())
}

#[given("JPEG file {id:u64} has never submitted a task")]
fn file_without_tasks(world: &mut TaskTrackingWorld, id: u64) {
    world.remember(JpegFile(id));
}

#[given(r#"task "{task}" has finished with outcome "{outcome}""#)]
fn task_has_finished(
    world: &mut TaskTrackingWorld,
    task: String,
    outcome: String,
) -> Result<(), eyre::Report> {
    let task_id = TaskId::new(task)?;
    run_async(world.broker.report(&task_id, &outcome)).wrap_err("report task outcome")?;
    Ok(())
}
