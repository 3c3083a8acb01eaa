use crate::error::{CoreError, CoreResult};
use crate::model::Student;
use crate::repo::{max_seat, new_id, Repository};
use crate::store::CollectionStore;
use serde::Serialize;

/// A valid `studentId, fullName` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterLine {
    pub line_no: usize,
    pub student_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRoster {
    pub valid: Vec<RosterLine>,
    /// 1-based numbers of non-blank lines that did not yield both fields.
    pub skipped: Vec<usize>,
}

/// Splits pasted text into roster lines. Only the first two comma-separated
/// fields are read; anything after them is ignored. Blank lines are neither
/// valid nor skipped.
pub fn parse_roster(text: &str) -> ParsedRoster {
    let mut out = ParsedRoster::default();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split(',').map(str::trim);
        let student_id = parts.next().unwrap_or("");
        let name = parts.next().unwrap_or("");
        if student_id.is_empty() || name.is_empty() {
            out.skipped.push(i + 1);
            continue;
        }
        out.valid.push(RosterLine {
            line_no: i + 1,
            student_id: student_id.to_string(),
            name: name.to_string(),
        });
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Success,
    Partial,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub status: BatchStatus,
    pub added: usize,
    pub skipped: usize,
    pub skipped_lines: Vec<usize>,
    pub students: Vec<Student>,
}

/// Appends every valid line of `text` to the class roster, numbering seats
/// after the class's current highest seat in input order. Nothing is written
/// unless at least one line is valid.
pub fn import_roster<S: CollectionStore>(
    repo: &Repository<S>,
    class_id: &str,
    text: &str,
) -> CoreResult<ImportOutcome> {
    let class_id = class_id.trim();
    if class_id.is_empty() {
        return Err(CoreError::SelectionRequired("class"));
    }
    if text.trim().is_empty() {
        return Err(CoreError::validation("text", "roster text is empty"));
    }
    if !repo.classes()?.iter().any(|c| c.id == class_id) {
        return Err(CoreError::not_found("class", class_id));
    }

    let parsed = parse_roster(text);
    if parsed.valid.is_empty() {
        log::warn!(
            "roster import for {class_id}: no valid lines ({} skipped)",
            parsed.skipped.len()
        );
        return Err(CoreError::EmptyBatch {
            skipped: parsed.skipped.len(),
        });
    }

    let mut students = repo.students()?;
    let mut seat = max_seat(&students, class_id);
    let added: Vec<Student> = parsed
        .valid
        .into_iter()
        .map(|l| {
            seat += 1;
            log::debug!("line {}: {} -> seat {seat}", l.line_no, l.student_id);
            Student {
                id: new_id("stu"),
                student_id: l.student_id,
                name: l.name,
                class_id: class_id.to_string(),
                seat_number: seat,
            }
        })
        .collect();
    students.extend(added.iter().cloned());
    repo.save_students(&students)?;

    let skipped = parsed.skipped.len();
    log::info!(
        "roster import for {class_id}: {} added, {skipped} skipped",
        added.len()
    );
    Ok(ImportOutcome {
        status: if skipped > 0 {
            BatchStatus::Partial
        } else {
            BatchStatus::Success
        },
        added: added.len(),
        skipped,
        skipped_lines: parsed.skipped,
        students: added,
    })
}
