pub mod case_sync;
pub mod hierarchy_builder;
pub mod request_executor;
pub mod result_submitter;
pub mod section_sync;
pub mod sync_context;
pub mod sync_controller;
pub mod tag_resolution;
