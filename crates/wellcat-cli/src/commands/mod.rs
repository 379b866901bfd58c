pub mod classify;
pub mod labs;
pub mod overlap;
pub mod rules;
