use crate::calc::{self, GradeRow};
use crate::error::{CoreError, CoreResult};
use crate::ipc::error::{core_err, no_workspace, ok};
use crate::ipc::params::str_param;
use crate::ipc::types::{AppState, Request};
use crate::repo::Repository;
use crate::resolve;
use crate::store::CollectionStore;
use serde_json::json;

/// The transcript view: the student, their resolvable grade rows and the
/// derived statistics. Rows pointing at deleted assignments or subjects are
/// not part of either.
fn student_report<S: CollectionStore>(
    repo: &Repository<S>,
    student_id: &str,
) -> CoreResult<serde_json::Value> {
    let snap = repo.snapshot()?;
    let Some(student) = snap.students.iter().find(|s| s.id == student_id) else {
        return Err(CoreError::not_found("student", student_id));
    };
    let records = snap.grades_for_student(student_id);
    let resolved = resolve::student_grades(&snap, &records);
    let rows: Vec<GradeRow> = resolved.iter().map(GradeRow::from).collect();
    let stats = calc::student_stats(&rows);
    let grades: Vec<serde_json::Value> = resolved.iter().map(|r| r.to_json()).collect();
    Ok(json!({
        "student": student,
        "className": snap.class(&student.class_id).map(|c| c.name.as_str()),
        "grades": grades,
        "stats": stats,
    }))
}

fn handle_stats_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(repo) = state.repo.as_ref() else {
        return no_workspace(&req.id);
    };
    let student_id = match str_param(req, "studentId") {
        Ok(v) => v.trim(),
        Err(resp) => return resp,
    };
    match student_report(repo, student_id) {
        Ok(v) => ok(&req.id, v),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.student" => Some(handle_stats_student(state, req)),
        _ => None,
    }
}
