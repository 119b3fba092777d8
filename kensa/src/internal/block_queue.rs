use std::{collections::VecDeque, fmt, time::Duration};

use crate::{Cx, Result};

/// A unit of deferred work queued by a body, hook or another block.
pub(crate) enum Block {
    Runs(Box<dyn FnOnce(&Cx) -> Result>),
    Waits(Duration),
    WaitsFor {
        predicate: Box<dyn FnMut() -> bool>,
        message: Option<String>,
        timeout: Option<Duration>,
    },
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Runs(_) => write!(f, "Runs"),
            Block::Waits(duration) => write!(f, "Waits({duration:?})"),
            Block::WaitsFor {
                message, timeout, ..
            } => f
                .debug_struct("WaitsFor")
                .field("message", message)
                .field("timeout", timeout)
                .finish_non_exhaustive(),
        }
    }
}

/// FIFO of pending blocks for one spec.
///
/// Nesting is handled by the drain loop: it takes the remaining blocks out
/// before running one, so anything the block queues lands first, then the
/// remainder is appended back.
#[derive(Debug, Default)]
pub(crate) struct BlockQueue {
    blocks: VecDeque<Block>,
}

impl BlockQueue {
    pub(crate) fn push(&mut self, block: Block) {
        self.blocks.push_back(block);
    }

    pub(crate) fn pop_front(&mut self) -> Option<Block> {
        self.blocks.pop_front()
    }

    pub(crate) fn take_rest(&mut self) -> VecDeque<Block> {
        std::mem::take(&mut self.blocks)
    }

    pub(crate) fn extend(&mut self, rest: VecDeque<Block>) {
        self.blocks.extend(rest);
    }

    /// Drop everything still pending, returns how many blocks were dropped.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.blocks.len();
        self.blocks.clear();
        dropped
    }
}
