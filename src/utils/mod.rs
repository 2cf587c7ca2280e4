pub mod parallel;
pub mod reporting;
