pub mod cache;
pub mod card;
pub mod loader;
pub mod source;
pub mod topic;

pub use card::FlashcardRecord;
pub use topic::Topic;
