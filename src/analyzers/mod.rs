pub mod accumulator;
pub mod classifier;
pub mod join;
pub mod planner;
