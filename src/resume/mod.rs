pub mod parser;
pub mod updater;

pub use parser::ResumeParser;
pub use updater::ResumeUpdater;
