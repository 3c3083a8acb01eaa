//! Read-side joins over string ids. Nothing here fails on a dangling id: a
//! grade whose assignment or subject is gone is dropped, and an assignment
//! whose teacher, class or subject is gone renders that part as absent.

use crate::model::{
    Assignment, Grade, GradeRecord, SchoolClass, Student, Subject, User,
};
use serde::Serialize;
use std::collections::HashMap;

/// All six collections as loaded at one moment.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub classes: Vec<SchoolClass>,
    pub students: Vec<Student>,
    pub subjects: Vec<Subject>,
    pub assignments: Vec<Assignment>,
    pub grades: Vec<GradeRecord>,
}

impl Snapshot {
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn class(&self, id: &str) -> Option<&SchoolClass> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    pub fn assignment(&self, id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.id == id)
    }

    /// Raw rows of one student, orphans included.
    pub fn grades_for_student(&self, student_id: &str) -> Vec<GradeRecord> {
        self.grades
            .iter()
            .filter(|g| g.student_id == student_id)
            .cloned()
            .collect()
    }
}

/// A grade row joined to its assignment, subject and (if still present) teacher.
#[derive(Debug, Clone)]
pub struct ResolvedGrade<'a> {
    pub record: &'a GradeRecord,
    pub assignment: &'a Assignment,
    pub subject: &'a Subject,
    pub teacher: Option<&'a User>,
}

impl ResolvedGrade<'_> {
    pub fn grade(&self) -> Option<Grade> {
        self.record.grade
    }

    pub fn credits(&self) -> f64 {
        self.subject.credits
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "assignmentId": self.assignment.id,
            "grade": self.record.grade,
            "subject": {
                "id": self.subject.id,
                "code": self.subject.code,
                "name": self.subject.name,
                "credits": self.subject.credits,
                "type": self.subject.kind,
            },
            "teacherName": self.teacher.map(|t| t.name.as_str()),
        })
    }
}

pub fn resolve_grade<'a>(snap: &'a Snapshot, record: &'a GradeRecord) -> Option<ResolvedGrade<'a>> {
    let assignment = snap.assignment(&record.assignment_id)?;
    let subject = snap.subject(&assignment.subject_id)?;
    Some(ResolvedGrade {
        record,
        assignment,
        subject,
        teacher: snap.user(&assignment.teacher_id),
    })
}

/// The rows of `records` that still resolve, in the order given.
pub fn student_grades<'a>(snap: &'a Snapshot, records: &'a [GradeRecord]) -> Vec<ResolvedGrade<'a>> {
    records
        .iter()
        .filter_map(|g| resolve_grade(snap, g))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    pub id: String,
    pub teacher_id: String,
    pub class_id: String,
    pub subject_id: String,
    pub teacher_name: Option<String>,
    pub class_name: Option<String>,
    pub subject_code: Option<String>,
    pub subject_name: Option<String>,
    pub credits: Option<f64>,
}

pub fn assignment_view(snap: &Snapshot, a: &Assignment) -> AssignmentView {
    let teacher = snap.user(&a.teacher_id);
    let class = snap.class(&a.class_id);
    let subject = snap.subject(&a.subject_id);
    AssignmentView {
        id: a.id.clone(),
        teacher_id: a.teacher_id.clone(),
        class_id: a.class_id.clone(),
        subject_id: a.subject_id.clone(),
        teacher_name: teacher.map(|t| t.name.clone()),
        class_name: class.map(|c| c.name.clone()),
        subject_code: subject.map(|s| s.code.clone()),
        subject_name: subject.map(|s| s.name.clone()),
        credits: subject.map(|s| s.credits),
    }
}

pub fn assignment_views(snap: &Snapshot, assignments: &[Assignment]) -> Vec<AssignmentView> {
    assignments.iter().map(|a| assignment_view(snap, a)).collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAssignments {
    pub class_id: String,
    pub class_name: Option<String>,
    pub assignments: Vec<AssignmentView>,
}

/// Assignments grouped by class, groups in first-seen order.
pub fn assignments_by_class(snap: &Snapshot) -> Vec<ClassAssignments> {
    let mut groups: Vec<ClassAssignments> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for a in &snap.assignments {
        let i = *index.entry(a.class_id.as_str()).or_insert_with(|| {
            groups.push(ClassAssignments {
                class_id: a.class_id.clone(),
                class_name: snap.class(&a.class_id).map(|c| c.name.clone()),
                assignments: Vec::new(),
            });
            groups.len() - 1
        });
        groups[i].assignments.push(assignment_view(snap, a));
    }
    groups
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRow {
    pub student_id: String,
    pub student_code: String,
    pub name: String,
    pub seat_number: u32,
    pub grade: Option<Grade>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSheet {
    pub assignment: AssignmentView,
    pub rows: Vec<SheetRow>,
}

/// The roster of the assignment's class in seat order, each student carrying
/// the grade stored for this assignment (or none yet).
pub fn grade_sheet(snap: &Snapshot, assignment_id: &str) -> Option<GradeSheet> {
    let assignment = snap.assignment(assignment_id)?;
    let stored: HashMap<&str, Option<Grade>> = snap
        .grades
        .iter()
        .filter(|g| g.assignment_id == assignment_id)
        .map(|g| (g.student_id.as_str(), g.grade))
        .collect();

    let mut roster: Vec<&Student> = snap
        .students
        .iter()
        .filter(|s| s.class_id == assignment.class_id)
        .collect();
    roster.sort_by_key(|s| s.seat_number);

    let rows = roster
        .into_iter()
        .map(|s| SheetRow {
            student_id: s.id.clone(),
            student_code: s.student_id.clone(),
            name: s.name.clone(),
            seat_number: s.seat_number,
            grade: stored.get(s.id.as_str()).copied().flatten(),
        })
        .collect();

    Some(GradeSheet {
        assignment: assignment_view(snap, assignment),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, SubjectType};

    fn fixture() -> Snapshot {
        Snapshot {
            users: vec![User {
                id: "t1".into(),
                username: "somchai".into(),
                password: "pw".into(),
                name: "Somchai".into(),
                role: Role::Teacher,
            }],
            classes: vec![SchoolClass {
                id: "c1".into(),
                name: "M.1/1".into(),
            }],
            students: vec![
                Student {
                    id: "s2".into(),
                    student_id: "10002".into(),
                    name: "Jane Smith".into(),
                    class_id: "c1".into(),
                    seat_number: 2,
                },
                Student {
                    id: "s1".into(),
                    student_id: "10001".into(),
                    name: "John Doe".into(),
                    class_id: "c1".into(),
                    seat_number: 1,
                },
            ],
            subjects: vec![Subject {
                id: "sub1".into(),
                code: "MATH101".into(),
                name: "Mathematics".into(),
                credits: 1.5,
                kind: SubjectType::Basic,
            }],
            assignments: vec![
                Assignment {
                    id: "a1".into(),
                    teacher_id: "t1".into(),
                    class_id: "c1".into(),
                    subject_id: "sub1".into(),
                },
                Assignment {
                    id: "a-ghost-subject".into(),
                    teacher_id: "gone".into(),
                    class_id: "c-gone".into(),
                    subject_id: "sub-gone".into(),
                },
            ],
            grades: vec![
                GradeRecord {
                    student_id: "s1".into(),
                    assignment_id: "a1".into(),
                    grade: Grade::new(3.5),
                },
                GradeRecord {
                    student_id: "s1".into(),
                    assignment_id: "a-missing".into(),
                    grade: Grade::new(0.0),
                },
                GradeRecord {
                    student_id: "s1".into(),
                    assignment_id: "a-ghost-subject".into(),
                    grade: Grade::new(1.0),
                },
            ],
        }
    }

    #[test]
    fn orphan_grades_are_dropped() {
        let snap = fixture();
        let rows = student_grades(&snap, &snap.grades);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].assignment.id, "a1");
        assert_eq!(rows[0].teacher.map(|t| t.name.as_str()), Some("Somchai"));
        assert!(student_grades(&snap, &[]).is_empty());

        let s1 = snap.grades_for_student("s1");
        assert_eq!(s1.len(), 3);
        assert_eq!(student_grades(&snap, &s1).len(), 1);
        assert!(snap.grades_for_student("s2").is_empty());
    }

    #[test]
    fn assignment_view_tolerates_missing_references() {
        let snap = fixture();
        let views = assignment_views(&snap, &snap.assignments);
        assert_eq!(views.len(), 2);
        let ghost = &views[1];
        assert_eq!(ghost.teacher_name, None);
        assert_eq!(ghost.class_name, None);
        assert_eq!(ghost.subject_code, None);

        let mine = assignment_views(&snap, &snap.assignments[..1]);
        assert_eq!(mine[0].class_name.as_deref(), Some("M.1/1"));
        assert_eq!(mine[0].credits, Some(1.5));
    }

    #[test]
    fn grouping_keeps_first_seen_class_order() {
        let snap = fixture();
        let groups = assignments_by_class(&snap);
        let ids: Vec<&str> = groups.iter().map(|g| g.class_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c-gone"]);
        assert_eq!(groups[1].class_name, None);
    }

    #[test]
    fn grade_sheet_merges_roster_with_stored_grades() {
        let snap = fixture();
        let sheet = grade_sheet(&snap, "a1").expect("sheet");
        let seats: Vec<u32> = sheet.rows.iter().map(|r| r.seat_number).collect();
        assert_eq!(seats, vec![1, 2]);
        assert_eq!(sheet.rows[0].grade, Grade::new(3.5));
        assert_eq!(sheet.rows[1].grade, None);
        assert!(grade_sheet(&snap, "nope").is_none());
    }
}
