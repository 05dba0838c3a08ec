pub mod encouragement;
pub mod scoring;
