pub mod case_type;
pub mod error;
pub mod report;
pub mod section;
pub mod sync_config;
pub mod test_case;
pub mod test_result;
pub mod test_run;
