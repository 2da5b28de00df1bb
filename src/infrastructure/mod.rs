pub mod engine;
pub mod xml_writer;

pub use engine::{AnalyzeToolSetup, OpenSimCmd, SimulationEngine};
