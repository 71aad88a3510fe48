//! When steps for task tracking BDD scenarios.

use super::world::{TaskTrackingWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use taskmeta::tracking::domain::TaskId;

#[when(r#"the worker starts task "{task}""#)]
fn worker_starts(world: &mut TaskTrackingWorld, task: String) -> Result<(), eyre::Report> {
    let task_id = TaskId::new(task)?;
    run_async(world.broker.start(&task_id)).wrap_err("start task")?;
    Ok(())
}

#[when(r#"the worker reports outcome "{outcome}" for task "{task}""#)]
fn worker_reports(
    world: &mut TaskTrackingWorld,
    outcome: String,
    task: String,
) -> Result<(), eyre::Report> {
    let task_id = TaskId::new(task)?;
    run_async(world.broker.report(&task_id, &outcome)).wrap_err("report task outcome")?;
    Ok(())
}

#[when(r#"the result of task "{task}" is forgotten"#)]
fn result_forgotten(world: &mut TaskTrackingWorld, task: String) -> Result<(), eyre::Report> {
    let task_id = TaskId::new(task)?;
    run_async(world.service.result(task_id).forget()).wrap_err("forget task result")?;
    Ok(())
}

#[when(r#"task "{task}" is revoked"#)]
fn task_revoked(world: &mut TaskTrackingWorld, task: String) -> Result<(), eyre::Report> {
    let task_id = TaskId::new(task)?;
    run_async(world.service.revoke(&task_id)).wrap_err("revoke task")?;
    Ok(())
}
