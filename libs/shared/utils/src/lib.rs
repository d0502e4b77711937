pub mod ids;
pub mod test_utils;

pub use ids::IdSequence;
