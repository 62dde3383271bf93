//! Field classification and the split/merge of records into security tiers.

mod classify;
mod level;
mod report;
mod split;

pub use classify::{
    Classification, Classified, FieldAssignment, FieldInfo, FieldSpec, classify,
    validate_classification,
};
pub use level::SecurityLevel;
pub use report::{SENSITIVE_KEYWORDS, SecurityReport, check_security_compliance, generate_security_report};
pub use split::{SplitData, assign_fields, combine_split_data, persistent_json, split_record};
