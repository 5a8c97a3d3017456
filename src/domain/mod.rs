pub mod email;
pub mod resume;
pub mod types;

pub use email::Email;
pub use resume::Resume;
pub use types::{ClassificationResult, JobContext, MailAction, MatchScore};
