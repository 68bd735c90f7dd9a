//! Background move search for native hosts.
//!
//! A search runs on its own thread and reports through a channel. The request
//! carries a [`SearchTicket`] naming the state it was started for, so the
//! session can discard an answer that arrives after the game moved on.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use tracing::{debug, warn};

use crate::ai::engine::Engine;
use crate::ai::search::SearchTicket;
use crate::types::Move;

/// An in-flight search.
pub struct PendingSearch {
    ticket: SearchTicket,
    receiver: Receiver<Option<Move>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Pending,
    Ready(Option<Move>),
    /// The worker went away without answering.
    Lost,
}

impl PendingSearch {
    pub fn ticket(&self) -> SearchTicket {
        self.ticket
    }

    pub fn try_take(&self) -> Poll {
        match self.receiver.try_recv() {
            Ok(result) => Poll::Ready(result),
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => Poll::Lost,
        }
    }

    /// Blocks until the worker answers.
    pub fn wait(self) -> Poll {
        match self.receiver.recv() {
            Ok(result) => Poll::Ready(result),
            Err(_) => Poll::Lost,
        }
    }
}

/// Starts `engine` on a worker thread.
pub fn spawn_search(
    engine: Arc<dyn Engine>,
    ticket: SearchTicket,
    legal: Vec<Move>,
) -> PendingSearch {
    let (sender, receiver) = bounded(1);
    let position = ticket.position;

    debug!(engine = engine.id(), ply = ticket.ply, "spawning search");
    let spawned = thread::Builder::new()
        .name(format!("search-{}", engine.id()))
        .spawn(move || {
            let result = engine.select_move(&position, &legal);
            // The receiver is gone if the session dropped the search.
            let _ = sender.send(result);
        });
    if let Err(err) = spawned {
        warn!(%err, "could not spawn search thread");
    }

    PendingSearch { ticket, receiver }
}
