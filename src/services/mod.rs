pub mod generation;
pub mod history;

pub use generation::GenerationService;
pub use history::HistoryService;
