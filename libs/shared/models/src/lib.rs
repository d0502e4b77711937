pub mod entity;
pub mod error;

pub use entity::EntityKind;
pub use error::AppError;
