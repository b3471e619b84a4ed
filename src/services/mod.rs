pub mod collector;
pub mod poller;
pub mod console;

pub use collector::{Collector, FetchFailure, ItemStream};
pub use poller::{run_cycle, CycleReport, Poller, StartOutcome};
pub use console::{render_item, render_item_lines, Command, Console, ItemStyle};
