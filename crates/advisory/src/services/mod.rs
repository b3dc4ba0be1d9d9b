pub mod advisory_validator;

pub use advisory_validator::{AdvisoryValidator, FallbackReason, Verdict, VerdictSource};
