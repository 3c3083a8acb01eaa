use crate::error::{CoreError, CoreResult};
use crate::model::{Assignment, Role};
use crate::repo::{new_id, Repository};
use crate::store::CollectionStore;
use serde::Serialize;

/// Subjects staged for one (teacher, class) pair before they become
/// assignments. Lives in session state only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentCart {
    pub teacher_id: Option<String>,
    pub class_id: Option<String>,
    pub subject_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOutcome {
    pub added: bool,
    pub duplicate: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOutcome {
    pub created: Vec<Assignment>,
    pub duplicates_skipped: usize,
}

fn non_empty(v: &str) -> Option<String> {
    let v = v.trim();
    (!v.is_empty()).then(|| v.to_string())
}

impl AssignmentCart {
    /// Changing the pair keeps whatever is staged.
    pub fn select(&mut self, teacher_id: &str, class_id: &str) {
        self.teacher_id = non_empty(teacher_id);
        self.class_id = non_empty(class_id);
    }

    pub fn contains(&self, subject_id: &str) -> bool {
        self.subject_ids.iter().any(|s| s == subject_id)
    }

    /// The subject must exist; staging it twice is a no-op.
    pub fn add<S: CollectionStore>(
        &mut self,
        repo: &Repository<S>,
        subject_id: &str,
    ) -> CoreResult<AddOutcome> {
        let Some(subject_id) = non_empty(subject_id) else {
            return Err(CoreError::SelectionRequired("subject"));
        };
        if self.contains(&subject_id) {
            return Ok(AddOutcome {
                added: false,
                duplicate: true,
            });
        }
        if !repo.subjects()?.iter().any(|s| s.id == subject_id) {
            return Err(CoreError::not_found("subject", subject_id));
        }
        self.subject_ids.push(subject_id);
        Ok(AddOutcome {
            added: true,
            duplicate: false,
        })
    }

    pub fn remove(&mut self, subject_id: &str) -> bool {
        let before = self.subject_ids.len();
        self.subject_ids.retain(|s| s != subject_id);
        self.subject_ids.len() != before
    }

    pub fn discard(&mut self) {
        self.subject_ids.clear();
    }

    /// Turns the staged subjects into assignments. The teacher must be an
    /// existing TEACHER account and the class must exist. A subject already
    /// assigned to the class (by any teacher) is skipped and counted. The cart
    /// is emptied only once the write has gone through.
    pub fn commit<S: CollectionStore>(
        &mut self,
        repo: &Repository<S>,
    ) -> CoreResult<CommitOutcome> {
        let Some(teacher_id) = self.teacher_id.clone() else {
            return Err(CoreError::SelectionRequired("teacher"));
        };
        let Some(class_id) = self.class_id.clone() else {
            return Err(CoreError::SelectionRequired("class"));
        };
        if self.subject_ids.is_empty() {
            return Err(CoreError::SelectionRequired("subject"));
        }
        let users = repo.users()?;
        let Some(teacher) = users.iter().find(|u| u.id == teacher_id) else {
            return Err(CoreError::not_found("teacher", teacher_id));
        };
        if teacher.role != Role::Teacher {
            return Err(CoreError::validation(
                "teacherId",
                "assignments need a user with the TEACHER role",
            ));
        }
        if !repo.classes()?.iter().any(|c| c.id == class_id) {
            return Err(CoreError::not_found("class", class_id));
        }

        let mut assignments = repo.assignments()?;
        let mut created: Vec<Assignment> = Vec::new();
        let mut duplicates_skipped = 0;
        for subject_id in &self.subject_ids {
            let taken = assignments
                .iter()
                .any(|a| a.class_id == class_id && &a.subject_id == subject_id);
            if taken {
                duplicates_skipped += 1;
                continue;
            }
            let a = Assignment {
                id: new_id("assign"),
                teacher_id: teacher_id.clone(),
                class_id: class_id.clone(),
                subject_id: subject_id.clone(),
            };
            assignments.push(a.clone());
            created.push(a);
        }

        if !created.is_empty() {
            repo.save_assignments(&assignments)?;
        }
        self.discard();
        log::info!(
            "committed cart for {teacher_id}/{class_id}: {} created, {duplicates_skipped} duplicates skipped",
            created.len()
        );
        Ok(CommitOutcome {
            created,
            duplicates_skipped,
        })
    }
}
