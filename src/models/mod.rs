mod chore;
mod history;
mod instance;
mod tender;

pub use chore::Chore;
pub use history::HistoryEntry;
pub use instance::InstanceDocument;
pub use tender::Tender;
