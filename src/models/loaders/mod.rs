pub mod job_loader;
pub mod storage_loader;
pub mod xml_loader;

pub use job_loader::{discover_trials, load_job, JobFile};
pub use storage_loader::read_time_range;
pub use xml_loader::{load_parameters, parse_parameters_str};
