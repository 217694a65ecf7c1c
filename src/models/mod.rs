pub mod auth;
pub mod grade;
pub mod user;

pub use auth::{LoginInput, LoginResponse};
pub use grade::{Analysis, GradeForm, GradeRequest, GradeResponse};
pub use user::{CreateUserInput, UpdateUserInput, User};
