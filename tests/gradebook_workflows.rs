use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .env_remove("GRADEBOOKD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

fn error_code(v: &serde_json::Value) -> Option<&str> {
    v.get("error")
        .and_then(|e| e.get("code"))
        .and_then(|c| c.as_str())
}

fn ok_result(v: serde_json::Value) -> serde_json::Value {
    assert_eq!(v["ok"], true, "request failed: {}", v);
    v["result"].clone()
}

struct Sidecar {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    next_id: u32,
}

impl Sidecar {
    fn open(workspace: &std::path::Path) -> Self {
        let (child, stdin, reader) = spawn_sidecar();
        let mut s = Self {
            child,
            stdin,
            reader,
            next_id: 0,
        };
        ok_result(s.call(
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        ));
        s
    }

    fn call(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        request(&mut self.stdin, &mut self.reader, &id, method, params)
    }

    fn id_of(&mut self, method: &str, params: serde_json::Value, key: &str) -> String {
        let result = ok_result(self.call(method, params));
        result[key]["id"].as_str().expect("id").to_string()
    }
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn bulk_import_appends_valid_lines_and_rejects_empty_batches() {
    let workspace = temp_dir("gradebook-import");
    let mut s = Sidecar::open(&workspace);
    let class_id = s.id_of("classes.create", json!({ "name": "M.1/1" }), "class");

    let out = ok_result(s.call(
        "students.importBulk",
        json!({ "classId": class_id, "text": "10001, John Doe\n10002, Jane Smith\nbadline" }),
    ));
    assert_eq!(out["added"], 2);
    assert_eq!(out["skipped"], 1);
    assert_eq!(out["skippedLines"], json!([3]));

    let empty = s.call(
        "students.importBulk",
        json!({ "classId": class_id, "text": "onlyonefield" }),
    );
    assert_eq!(error_code(&empty), Some("empty_batch"));
    assert_eq!(empty["error"]["details"]["skipped"], 1);

    let no_class = s.call(
        "students.importBulk",
        json!({ "classId": "", "text": "10003, Ann" }),
    );
    assert_eq!(error_code(&no_class), Some("selection_required"));

    let roster = ok_result(s.call("students.list", json!({ "classId": class_id })));
    let seats: Vec<(String, u64)> = roster["students"]
        .as_array()
        .expect("students")
        .iter()
        .map(|st| {
            (
                st["studentId"].as_str().expect("code").to_string(),
                st["seatNumber"].as_u64().expect("seat"),
            )
        })
        .collect();
    assert_eq!(
        seats,
        vec![("10001".to_string(), 1), ("10002".to_string(), 2)]
    );

    drop(s);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn cart_commit_skips_subjects_already_assigned_to_the_class() {
    let workspace = temp_dir("gradebook-cart");
    let mut s = Sidecar::open(&workspace);
    let class_id = s.id_of("classes.create", json!({ "name": "M.2/1" }), "class");
    let math = s.id_of(
        "subjects.create",
        json!({ "code": "MA201", "name": "Math", "credits": 1, "type": "Basic" }),
        "subject",
    );
    let art = s.id_of(
        "subjects.create",
        json!({ "code": "AR201", "name": "Art", "credits": 0.5, "type": "Additional" }),
        "subject",
    );
    let teacher_a = s.id_of(
        "users.create",
        json!({ "username": "somchai", "password": "pw", "name": "Somchai", "role": "TEACHER" }),
        "user",
    );
    let teacher_b = s.id_of(
        "users.create",
        json!({ "username": "suda", "password": "pw", "name": "Suda", "role": "TEACHER" }),
        "user",
    );

    ok_result(s.call("cart.add", json!({ "subjectId": math })));
    ok_result(s.call(
        "cart.select",
        json!({ "teacherId": "admin-01", "classId": class_id }),
    ));
    let admin = s.call("cart.commit", json!({}));
    assert_eq!(error_code(&admin), Some("bad_params"));
    ok_result(s.call(
        "cart.select",
        json!({ "teacherId": teacher_a, "classId": "class-gone" }),
    ));
    let ghost = s.call("cart.commit", json!({}));
    assert_eq!(error_code(&ghost), Some("not_found"));
    assert_eq!(
        ok_result(s.call("assignments.list", json!({})))["assignments"],
        json!([])
    );

    ok_result(s.call(
        "cart.select",
        json!({ "teacherId": teacher_a, "classId": class_id }),
    ));
    let first = ok_result(s.call("cart.commit", json!({})));
    assert_eq!(first["created"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(first["cart"]["subjectIds"], json!([]));

    let empty = s.call("cart.commit", json!({}));
    assert_eq!(error_code(&empty), Some("selection_required"));

    ok_result(s.call(
        "cart.select",
        json!({ "teacherId": teacher_b, "classId": class_id }),
    ));
    ok_result(s.call("cart.add", json!({ "subjectId": math })));
    let again = ok_result(s.call("cart.add", json!({ "subjectId": math })));
    assert_eq!(again["duplicate"], true);
    assert_eq!(again["cart"]["subjectIds"].as_array().map(|a| a.len()), Some(1));
    ok_result(s.call("cart.add", json!({ "subjectId": art })));

    let second = ok_result(s.call("cart.commit", json!({})));
    assert_eq!(second["duplicatesSkipped"], 1);
    assert_eq!(second["created"][0]["subjectId"], art.as_str());

    let all = ok_result(s.call("assignments.list", json!({})));
    let rows = all["assignments"].as_array().expect("assignments");
    assert_eq!(rows.len(), 2);
    let math_row = rows
        .iter()
        .find(|a| a["subjectId"] == math.as_str())
        .expect("math assignment");
    assert_eq!(math_row["teacherId"], teacher_a.as_str());
    assert_eq!(math_row["teacherName"], "Somchai");

    ok_result(s.call("users.delete", json!({ "userId": teacher_a })));
    let all = ok_result(s.call("assignments.list", json!({})));
    let math_row = all["assignments"]
        .as_array()
        .expect("assignments")
        .iter()
        .find(|a| a["subjectId"] == math.as_str())
        .cloned()
        .expect("math assignment kept");
    assert!(math_row["teacherName"].is_null());

    drop(s);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn stats_ignore_grades_whose_subject_was_deleted() {
    let workspace = temp_dir("gradebook-stats");
    let mut s = Sidecar::open(&workspace);
    let class_id = s.id_of("classes.create", json!({ "name": "M.3/1" }), "class");
    let student_id = s.id_of(
        "students.create",
        json!({ "classId": class_id, "studentId": "30001", "name": "Mali" }),
        "student",
    );
    let teacher_id = s.id_of(
        "users.create",
        json!({ "username": "mana", "password": "pw", "name": "Mana", "role": "TEACHER" }),
        "user",
    );
    let mut assignment_ids = Vec::new();
    let mut subject_ids = Vec::new();
    for (code, credits) in [("SC301", 2.0), ("EN301", 2.0), ("PE301", 1.0)] {
        let subject_id = s.id_of(
            "subjects.create",
            json!({ "code": code, "name": code, "credits": credits, "type": "Basic" }),
            "subject",
        );
        ok_result(s.call(
            "cart.select",
            json!({ "teacherId": teacher_id, "classId": class_id }),
        ));
        ok_result(s.call("cart.add", json!({ "subjectId": subject_id })));
        let commit = ok_result(s.call("cart.commit", json!({})));
        assignment_ids.push(
            commit["created"][0]["id"]
                .as_str()
                .expect("assignment id")
                .to_string(),
        );
        subject_ids.push(subject_id);
    }

    for (assignment_id, grade) in assignment_ids.iter().zip([json!(4), json!(3), json!(null)]) {
        ok_result(s.call(
            "grades.save",
            json!({ "assignmentId": assignment_id, "grades": [{ "studentId": student_id, "grade": grade }] }),
        ));
    }

    let off_scale = s.call(
        "grades.save",
        json!({ "assignmentId": assignment_ids[0], "grades": [{ "studentId": student_id, "grade": 3.75 }] }),
    );
    assert_eq!(error_code(&off_scale), Some("bad_params"));

    let before = ok_result(s.call("stats.student", json!({ "studentId": student_id })));
    assert_eq!(before["stats"]["gpa"], "3.50");
    assert_eq!(before["stats"]["resolvedCount"], 3);
    assert_eq!(before["stats"]["evaluatedCount"], 2);
    assert_eq!(before["stats"]["bar"].as_array().map(|b| b.len()), Some(8));
    assert_eq!(before["grades"][0]["teacherName"], "Mana");

    ok_result(s.call("subjects.delete", json!({ "subjectId": subject_ids[0] })));
    let after = ok_result(s.call("stats.student", json!({ "studentId": student_id })));
    assert_eq!(after["stats"]["gpa"], "3.00");
    assert_eq!(after["stats"]["resolvedCount"], 2);
    assert_eq!(after["grades"].as_array().map(|g| g.len()), Some(2));

    let sheet = ok_result(s.call(
        "grades.sheet",
        json!({ "assignmentId": assignment_ids[1] }),
    ));
    assert_eq!(sheet["sheet"]["rows"][0]["grade"], 3.0);

    drop(s);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn seeded_admin_survives_delete_requests() {
    let workspace = temp_dir("gradebook-admin");
    let mut s = Sidecar::open(&workspace);

    let resp = s.call("users.delete", json!({ "userId": "admin-01" }));
    assert_eq!(error_code(&resp), Some("protected_record"));

    let bad_login = s.call(
        "auth.staffLogin",
        json!({ "username": "admin", "password": "nope" }),
    );
    assert_eq!(error_code(&bad_login), Some("invalid_credentials"));

    let users = ok_result(s.call("users.list", json!({})));
    assert!(users["users"]
        .as_array()
        .expect("users")
        .iter()
        .any(|u| u["id"] == "admin-01"));

    drop(s);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn backup_bundle_restores_into_another_workspace() {
    let source = temp_dir("gradebook-backup-src");
    let target = temp_dir("gradebook-backup-dst");
    let bundle = temp_dir("gradebook-backup-out").join("school.zip");

    let mut s = Sidecar::open(&source);
    let class_id = s.id_of("classes.create", json!({ "name": "M.4/1" }), "class");
    ok_result(s.call(
        "students.importBulk",
        json!({ "classId": class_id, "text": "40001, Niran\n40002, Ploy" }),
    ));
    let export = ok_result(s.call(
        "backup.exportWorkspaceBundle",
        json!({ "outPath": bundle.to_string_lossy() }),
    ));
    assert_eq!(export["bundleFormat"], "gradebook-collections-v1");
    drop(s);

    let mut t = Sidecar::open(&target);
    let imported = ok_result(t.call(
        "backup.importWorkspaceBundle",
        json!({ "inPath": bundle.to_string_lossy() }),
    ));
    assert!(imported["collections"]
        .as_array()
        .expect("collections")
        .iter()
        .any(|c| c == "grade_app_students"));
    let classes = ok_result(t.call("classes.list", json!({})));
    assert_eq!(classes["classes"][0]["name"], "M.4/1");
    assert_eq!(classes["classes"][0]["studentCount"], 2);

    let missing = t.call(
        "backup.importWorkspaceBundle",
        json!({ "inPath": target.join("nope.zip").to_string_lossy() }),
    );
    assert_eq!(error_code(&missing), Some("not_found"));

    drop(t);
    let _ = std::fs::remove_dir_all(source);
    let _ = std::fs::remove_dir_all(target);
    if let Some(dir) = bundle.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}
