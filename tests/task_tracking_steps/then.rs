//! Then steps for task tracking BDD scenarios.

use super::world::{JpegFile, TaskTrackingWorld, run_async};
use rstest_bdd_macros::then;
use taskmeta::tracking::domain::TaskId;

#[then("JPEG file {id:u64} has a finished task")]
fn file_has_finished_task(world: &TaskTrackingWorld, id: u64) -> Result<(), eyre::Report> {
    if !run_async(world.service.has_ready_task(&JpegFile(id)))? {
        return Err(eyre::eyre!("expected JPEG file {id} to have a finished task"));
    }
    Ok(())
}

#[then("JPEG file {id:u64} has a running task")]
fn file_has_running_task(world: &TaskTrackingWorld, id: u64) -> Result<(), eyre::Report> {
    if !run_async(world.service.has_running_task(&JpegFile(id)))? {
        return Err(eyre::eyre!("expected JPEG file {id} to have a running task"));
    }
    Ok(())
}

#[then("JPEG file {id:u64} tracks no tasks")]
fn file_tracks_nothing(world: &TaskTrackingWorld, id: u64) -> Result<(), eyre::Report> {
    let records = run_async(world.service.task_records(&JpegFile(id)))?;
    if !records.is_empty() {
        return Err(eyre::eyre!(
            "expected no tracked tasks, found {} for JPEG file {id}",
            records.len()
        ));
    }
    Ok(())
}

#[then("only JPEG file {id:u64} is listed with running tasks")]
fn only_file_running(world: &TaskTrackingWorld, id: u64) -> Result<(), eyre::Report> {
    let query = world.service.owner_query();
    let running = run_async(query.with_running_tasks(world.files.clone()))?;
    if running != vec![JpegFile(id)] {
        return Err(eyre::eyre!("expected only JPEG file {id}, got {running:?}"));
    }
    Ok(())
}

#[then(r#"task "{task}" is successful"#)]
fn task_successful(world: &TaskTrackingWorld, task: String) -> Result<(), eyre::Report> {
    let result = world.service.result(TaskId::new(task)?);
    if !run_async(result.is_successful())? {
        return Err(eyre::eyre!("expected task {} to be successful", result.task_id()));
    }
    Ok(())
}

#[then(r#"task "{task}" is not successful"#)]
fn task_not_successful(world: &TaskTrackingWorld, task: String) -> Result<(), eyre::Report> {
    let result = world.service.result(TaskId::new(task)?);
    if run_async(result.is_successful())? {
        return Err(eyre::eyre!("expected task {} not to be successful", result.task_id()));
    }
    Ok(())
}
