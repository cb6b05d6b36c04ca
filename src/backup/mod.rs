pub mod backup_job;
pub mod cleanup;
pub mod clone;
pub mod compress;
pub mod file_ext;
pub mod finish;
pub mod inventory;
pub mod orchestrator;
pub mod parallel_copy;
pub mod result_error;
pub mod size;
pub mod validate;
