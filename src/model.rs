use serde::{Deserialize, Serialize};

pub const ADMIN_ID: &str = "admin-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Teacher,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub name: String,
    pub role: Role,
}

impl User {
    /// The account every fresh workspace starts with.
    pub fn seeded_admin() -> Self {
        Self {
            id: ADMIN_ID.to_string(),
            username: "admin".to_string(),
            password: "1234".to_string(),
            name: "System Administrator".to_string(),
            role: Role::Admin,
        }
    }

    /// Wire shape for anything leaving the daemon; the password stays inside.
    pub fn public_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "username": self.username,
            "name": self.name,
            "role": self.role,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolClass {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub student_id: String,
    pub name: String,
    pub class_id: String,
    pub seat_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectType {
    #[serde(alias = "พื้นฐาน")]
    Basic,
    #[serde(alias = "เพิ่มเติม")]
    Additional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub code: String,
    pub name: String,
    pub credits: f64,
    #[serde(rename = "type")]
    pub kind: SubjectType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub teacher_id: String,
    pub class_id: String,
    pub subject_id: String,
}

/// A value on the fixed grading scale. Construction is the only place the
/// scale is checked, so every `Grade` in memory is one of `SCALE`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Grade(f64);

impl Grade {
    pub const SCALE: [f64; 8] = [0.0, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0];

    pub fn new(v: f64) -> Option<Self> {
        Self::SCALE.contains(&v).then_some(Self(v))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Grade {
    type Error = String;

    fn try_from(v: f64) -> Result<Self, Self::Error> {
        Self::new(v).ok_or_else(|| format!("{v} is not on the grading scale"))
    }
}

impl From<Grade> for f64 {
    fn from(g: Grade) -> f64 {
        g.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    pub student_id: String,
    pub assignment_id: String,
    pub grade: Option<Grade>,
}
