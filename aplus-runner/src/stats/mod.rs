mod analysis;
mod issues;
mod report;
mod sections;

pub use analysis::{Analysis, SectionStats};
pub use report::print_analysis;
