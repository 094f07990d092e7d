//! Column type inference and schema assembly.

mod assembler;
mod classifier;

pub use assembler::{
    Assembly, AssemblyReport, ColumnOutcome, ColumnStatus, DropReason, SchemaAssembler,
    UnmatchedPolicy,
};
pub use classifier::{Classification, Column, ColumnClassifier, NoMatchReason, Rejection};
