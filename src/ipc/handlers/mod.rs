pub mod assignments;
pub mod auth;
pub mod backup;
pub mod cart;
pub mod classes;
pub mod core;
pub mod grades;
pub mod stats;
pub mod students;
pub mod subjects;
pub mod users;
