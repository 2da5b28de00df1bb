pub mod analysis_builder;
pub mod external_loads;
pub mod output_cleaner;

pub use analysis_builder::build_analysis;
pub use external_loads::ExternalLoadsFile;
pub use output_cleaner::{remove_empty_files, subset_output};
