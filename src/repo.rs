//! Typed access to the six collections.
//!
//! Every mutation here reads a whole collection, derives a new one by
//! map/filter/append, and writes the whole thing back. Deletes never cascade:
//! removing a class, subject, user or student leaves any records that point at
//! it in place, and readers go through `resolve` to filter them.

use crate::error::{CoreError, CoreResult};
use crate::model::{
    Assignment, Grade, GradeRecord, Role, SchoolClass, Student, Subject, SubjectType, User,
    ADMIN_ID,
};
use crate::resolve::Snapshot;
use crate::store::{Collection, CollectionStore};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

fn required(field: &'static str, value: &str) -> CoreResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(CoreError::validation(field, "must not be empty"));
    }
    Ok(v.to_string())
}

fn required_secret(value: &str) -> CoreResult<String> {
    if value.trim().is_empty() {
        return Err(CoreError::validation("password", "must not be empty"));
    }
    Ok(value.to_string())
}

fn check_credits(credits: f64) -> CoreResult<f64> {
    if !credits.is_finite() || credits <= 0.0 {
        return Err(CoreError::validation("credits", "must be greater than 0"));
    }
    if (credits * 2.0).fract() != 0.0 {
        return Err(CoreError::validation(
            "credits",
            "must be a multiple of 0.5",
        ));
    }
    Ok(credits)
}

fn check_seat(seat: u32) -> CoreResult<u32> {
    if seat == 0 {
        return Err(CoreError::validation("seatNumber", "must be at least 1"));
    }
    Ok(seat)
}

fn matches_search(haystacks: &[&str], needle: Option<&str>) -> bool {
    let Some(n) = needle.map(|s| s.trim().to_lowercase()) else {
        return true;
    };
    n.is_empty() || haystacks.iter().any(|h| h.to_lowercase().contains(&n))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Teacher
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    #[serde(default)]
    pub class_id: String,
    pub student_id: String,
    pub name: String,
    pub seat_number: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub student_id: Option<String>,
    pub name: Option<String>,
    pub class_id: Option<String>,
    pub seat_number: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    pub code: String,
    pub name: String,
    pub credits: f64,
    #[serde(rename = "type")]
    pub kind: SubjectType,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub credits: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<SubjectType>,
}

/// One row of a grade sheet submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeEntry {
    pub student_id: String,
    #[serde(default)]
    pub grade: Option<Grade>,
}

pub struct Repository<S: CollectionStore> {
    store: S,
}

impl<S: CollectionStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load<T: DeserializeOwned>(&self, collection: Collection) -> CoreResult<Vec<T>> {
        match self.store.read(collection)? {
            Some(records) => decode(collection, records),
            None => Ok(Vec::new()),
        }
    }

    fn save<T: Serialize>(&self, collection: Collection, items: &[T]) -> CoreResult<()> {
        let records = items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.store.write(collection, &records)?;
        log::debug!("stored {} ({} records)", collection.key(), records.len());
        Ok(())
    }

    // ---- whole-collection list/save ----

    /// Seeds the admin account the first time the collection is read.
    pub fn users(&self) -> CoreResult<Vec<User>> {
        let Some(records) = self.store.read(Collection::Users)? else {
            let initial = vec![User::seeded_admin()];
            self.save(Collection::Users, &initial)?;
            log::info!("seeded initial admin account");
            return Ok(initial);
        };
        decode(Collection::Users, records)
    }

    pub fn save_users(&self, users: &[User]) -> CoreResult<()> {
        self.save(Collection::Users, users)
    }

    pub fn classes(&self) -> CoreResult<Vec<SchoolClass>> {
        self.load(Collection::Classes)
    }

    pub fn save_classes(&self, classes: &[SchoolClass]) -> CoreResult<()> {
        self.save(Collection::Classes, classes)
    }

    pub fn students(&self) -> CoreResult<Vec<Student>> {
        self.load(Collection::Students)
    }

    pub fn save_students(&self, students: &[Student]) -> CoreResult<()> {
        self.save(Collection::Students, students)
    }

    pub fn subjects(&self) -> CoreResult<Vec<Subject>> {
        self.load(Collection::Subjects)
    }

    pub fn save_subjects(&self, subjects: &[Subject]) -> CoreResult<()> {
        self.save(Collection::Subjects, subjects)
    }

    pub fn assignments(&self) -> CoreResult<Vec<Assignment>> {
        self.load(Collection::Assignments)
    }

    pub fn save_assignments(&self, assignments: &[Assignment]) -> CoreResult<()> {
        self.save(Collection::Assignments, assignments)
    }

    pub fn grades(&self) -> CoreResult<Vec<GradeRecord>> {
        self.load(Collection::Grades)
    }

    pub fn save_grades(&self, grades: &[GradeRecord]) -> CoreResult<()> {
        self.save(Collection::Grades, grades)
    }

    pub fn snapshot(&self) -> CoreResult<Snapshot> {
        Ok(Snapshot {
            users: self.users()?,
            classes: self.classes()?,
            students: self.students()?,
            subjects: self.subjects()?,
            assignments: self.assignments()?,
            grades: self.grades()?,
        })
    }

    // ---- users ----

    pub fn search_users(&self, search: Option<&str>) -> CoreResult<Vec<User>> {
        Ok(self
            .users()?
            .into_iter()
            .filter(|u| matches_search(&[&u.name, &u.username], search))
            .collect())
    }

    pub fn create_user(&self, input: NewUser) -> CoreResult<User> {
        let user = User {
            id: new_id("user"),
            username: required("username", &input.username)?,
            password: required_secret(&input.password)?,
            name: required("name", &input.name)?,
            role: input.role,
        };
        let mut users = self.users()?;
        if users.iter().any(|u| u.username == user.username) {
            return Err(CoreError::validation("username", "already taken"));
        }
        users.push(user.clone());
        self.save_users(&users)?;
        log::info!("created user {} ({:?})", user.id, user.role);
        Ok(user)
    }

    pub fn update_user(&self, user_id: &str, patch: UserPatch) -> CoreResult<User> {
        let users = self.users()?;
        let Some(current) = users.iter().find(|u| u.id == user_id) else {
            return Err(CoreError::not_found("user", user_id));
        };

        let mut merged = current.clone();
        if let Some(v) = patch.username {
            merged.username = required("username", &v)?;
        }
        if let Some(v) = patch.password {
            merged.password = required_secret(&v)?;
        }
        if let Some(v) = patch.name {
            merged.name = required("name", &v)?;
        }
        if let Some(v) = patch.role {
            merged.role = v;
        }
        if users
            .iter()
            .any(|u| u.id != user_id && u.username == merged.username)
        {
            return Err(CoreError::validation("username", "already taken"));
        }

        let users: Vec<User> = users
            .into_iter()
            .map(|u| if u.id == user_id { merged.clone() } else { u })
            .collect();
        self.save_users(&users)?;
        Ok(merged)
    }

    /// Assignments naming this user as teacher are left in place.
    pub fn delete_user(&self, user_id: &str) -> CoreResult<()> {
        if user_id == ADMIN_ID {
            return Err(CoreError::Protected {
                id: user_id.to_string(),
            });
        }
        let users = self.users()?;
        let before = users.len();
        let users: Vec<User> = users.into_iter().filter(|u| u.id != user_id).collect();
        if users.len() == before {
            return Err(CoreError::not_found("user", user_id));
        }
        self.save_users(&users)?;
        log::info!("deleted user {user_id}");
        Ok(())
    }

    /// Plaintext comparison; this is a credential check, not a security boundary.
    pub fn find_staff_login(&self, username: &str, password: &str) -> CoreResult<User> {
        self.users()?
            .into_iter()
            .find(|u| u.username == username && u.password == password)
            .ok_or(CoreError::InvalidCredentials)
    }

    pub fn find_student_by_code(&self, code: &str) -> CoreResult<Student> {
        let code = required("studentId", code)?;
        self.students()?
            .into_iter()
            .find(|s| s.student_id == code)
            .ok_or_else(|| CoreError::not_found("student", code))
    }

    // ---- classes ----

    pub fn create_class(&self, name: &str) -> CoreResult<SchoolClass> {
        let class = SchoolClass {
            id: new_id("class"),
            name: required("name", name)?,
        };
        let mut classes = self.classes()?;
        classes.push(class.clone());
        self.save_classes(&classes)?;
        log::info!("created class {}", class.id);
        Ok(class)
    }

    pub fn rename_class(&self, class_id: &str, name: &str) -> CoreResult<SchoolClass> {
        let name = required("name", name)?;
        let mut found: Option<SchoolClass> = None;
        let classes: Vec<SchoolClass> = self
            .classes()?
            .into_iter()
            .map(|c| {
                if c.id == class_id {
                    let renamed = SchoolClass {
                        name: name.clone(),
                        ..c
                    };
                    found = Some(renamed.clone());
                    renamed
                } else {
                    c
                }
            })
            .collect();
        let Some(renamed) = found else {
            return Err(CoreError::not_found("class", class_id));
        };
        self.save_classes(&classes)?;
        Ok(renamed)
    }

    /// Students keep their now-dangling classId.
    pub fn delete_class(&self, class_id: &str) -> CoreResult<()> {
        let classes = self.classes()?;
        let before = classes.len();
        let classes: Vec<SchoolClass> = classes.into_iter().filter(|c| c.id != class_id).collect();
        if classes.len() == before {
            return Err(CoreError::not_found("class", class_id));
        }
        self.save_classes(&classes)?;
        log::info!("deleted class {class_id}");
        Ok(())
    }

    // ---- students ----

    /// Students of one class ordered by seat number.
    pub fn class_roster(&self, class_id: &str) -> CoreResult<Vec<Student>> {
        let mut roster: Vec<Student> = self
            .students()?
            .into_iter()
            .filter(|s| s.class_id == class_id)
            .collect();
        roster.sort_by_key(|s| s.seat_number);
        Ok(roster)
    }

    pub fn create_student(&self, input: NewStudent) -> CoreResult<Student> {
        let class_id = input.class_id.trim().to_string();
        if class_id.is_empty() {
            return Err(CoreError::SelectionRequired("class"));
        }
        let student_id = required("studentId", &input.student_id)?;
        let name = required("name", &input.name)?;

        let mut students = self.students()?;
        let seat_number = match input.seat_number {
            Some(seat) => check_seat(seat)?,
            None => max_seat(&students, &class_id) + 1,
        };
        let student = Student {
            id: new_id("stu"),
            student_id,
            name,
            class_id,
            seat_number,
        };
        students.push(student.clone());
        self.save_students(&students)?;
        Ok(student)
    }

    pub fn update_student(&self, id: &str, patch: StudentPatch) -> CoreResult<Student> {
        let students = self.students()?;
        let Some(current) = students.iter().find(|s| s.id == id) else {
            return Err(CoreError::not_found("student", id));
        };

        let mut merged = current.clone();
        if let Some(v) = patch.student_id {
            merged.student_id = required("studentId", &v)?;
        }
        if let Some(v) = patch.name {
            merged.name = required("name", &v)?;
        }
        if let Some(v) = patch.class_id {
            merged.class_id = required("classId", &v)?;
        }
        if let Some(v) = patch.seat_number {
            merged.seat_number = check_seat(v)?;
        }

        let students: Vec<Student> = students
            .into_iter()
            .map(|s| if s.id == id { merged.clone() } else { s })
            .collect();
        self.save_students(&students)?;
        Ok(merged)
    }

    /// Grade records for the student are left in place.
    pub fn delete_student(&self, id: &str) -> CoreResult<()> {
        let students = self.students()?;
        let before = students.len();
        let students: Vec<Student> = students.into_iter().filter(|s| s.id != id).collect();
        if students.len() == before {
            return Err(CoreError::not_found("student", id));
        }
        self.save_students(&students)?;
        Ok(())
    }

    // ---- subjects ----

    pub fn search_subjects(&self, search: Option<&str>) -> CoreResult<Vec<Subject>> {
        Ok(self
            .subjects()?
            .into_iter()
            .filter(|s| matches_search(&[&s.name, &s.code], search))
            .collect())
    }

    pub fn create_subject(&self, input: NewSubject) -> CoreResult<Subject> {
        let subject = Subject {
            id: new_id("sub"),
            code: required("code", &input.code)?.to_uppercase(),
            name: required("name", &input.name)?,
            credits: check_credits(input.credits)?,
            kind: input.kind,
        };
        let mut subjects = self.subjects()?;
        subjects.push(subject.clone());
        self.save_subjects(&subjects)?;
        log::info!("created subject {} ({})", subject.id, subject.code);
        Ok(subject)
    }

    pub fn update_subject(&self, id: &str, patch: SubjectPatch) -> CoreResult<Subject> {
        let subjects = self.subjects()?;
        let Some(current) = subjects.iter().find(|s| s.id == id) else {
            return Err(CoreError::not_found("subject", id));
        };

        let mut merged = current.clone();
        if let Some(v) = patch.code {
            merged.code = required("code", &v)?.to_uppercase();
        }
        if let Some(v) = patch.name {
            merged.name = required("name", &v)?;
        }
        if let Some(v) = patch.credits {
            merged.credits = check_credits(v)?;
        }
        if let Some(v) = patch.kind {
            merged.kind = v;
        }

        let subjects: Vec<Subject> = subjects
            .into_iter()
            .map(|s| if s.id == id { merged.clone() } else { s })
            .collect();
        self.save_subjects(&subjects)?;
        Ok(merged)
    }

    /// Assignments and grades for the subject are left in place; the resolver
    /// drops them from every view once the subject is gone.
    pub fn delete_subject(&self, id: &str) -> CoreResult<()> {
        let subjects = self.subjects()?;
        let before = subjects.len();
        let subjects: Vec<Subject> = subjects.into_iter().filter(|s| s.id != id).collect();
        if subjects.len() == before {
            return Err(CoreError::not_found("subject", id));
        }
        self.save_subjects(&subjects)?;
        log::info!("deleted subject {id}");
        Ok(())
    }

    // ---- assignments ----

    pub fn assignments_for_teacher(&self, teacher_id: &str) -> CoreResult<Vec<Assignment>> {
        Ok(self
            .assignments()?
            .into_iter()
            .filter(|a| a.teacher_id == teacher_id)
            .collect())
    }

    pub fn delete_assignment(&self, id: &str) -> CoreResult<()> {
        let assignments = self.assignments()?;
        let before = assignments.len();
        let assignments: Vec<Assignment> =
            assignments.into_iter().filter(|a| a.id != id).collect();
        if assignments.len() == before {
            return Err(CoreError::not_found("assignment", id));
        }
        self.save_assignments(&assignments)?;
        Ok(())
    }

    // ---- grades ----


    /// Replaces every grade row of one assignment with `entries`; rows of other
    /// assignments are carried over untouched. Returns the number of rows stored.
    pub fn save_assignment_grades(
        &self,
        assignment_id: &str,
        entries: Vec<GradeEntry>,
    ) -> CoreResult<usize> {
        let assignment_id = assignment_id.trim();
        if assignment_id.is_empty() {
            return Err(CoreError::SelectionRequired("assignment"));
        }
        if !self.assignments()?.iter().any(|a| a.id == assignment_id) {
            return Err(CoreError::not_found("assignment", assignment_id));
        }

        let mut rows: Vec<GradeRecord> = Vec::with_capacity(entries.len());
        for e in entries {
            let student_id = required("studentId", &e.student_id)?;
            let record = GradeRecord {
                student_id,
                assignment_id: assignment_id.to_string(),
                grade: e.grade,
            };
            // A student listed twice keeps the later grade.
            match rows.iter_mut().find(|r| r.student_id == record.student_id) {
                Some(existing) => *existing = record,
                None => rows.push(record),
            }
        }

        let stored = rows.len();
        let mut grades: Vec<GradeRecord> = self
            .grades()?
            .into_iter()
            .filter(|g| g.assignment_id != assignment_id)
            .collect();
        grades.extend(rows);
        self.save_grades(&grades)?;
        log::info!("saved {stored} grade rows for assignment {assignment_id}");
        Ok(stored)
    }
}

fn decode<T: DeserializeOwned>(
    collection: Collection,
    records: Vec<serde_json::Value>,
) -> CoreResult<Vec<T>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            serde_json::from_value(v)
                .with_context(|| format!("bad record #{} in {}", i, collection.key()))
                .map_err(CoreError::from)
        })
        .collect()
}

pub fn max_seat(students: &[Student], class_id: &str) -> u32 {
    students
        .iter()
        .filter(|s| s.class_id == class_id)
        .map(|s| s.seat_number)
        .max()
        .unwrap_or(0)
}
