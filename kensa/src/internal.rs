mod block_queue;
mod reporter_set;
mod spec_execution;
mod wait;

pub(crate) use block_queue::{Block, BlockQueue};
pub(crate) use reporter_set::ReporterSet;
pub(crate) use spec_execution::SpecExecution;
pub(crate) use wait::{panic_message, poll_until};
