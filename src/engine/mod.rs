pub mod export;
pub mod flashcards;
pub mod generate;
pub mod quiz;
pub mod stats;
pub mod study;
pub mod timer;
pub mod words;
