pub mod dashboard;
pub mod flashcard;
pub mod menu;
pub mod progress_bar;
