//! Asynchronous path requests.
//!
//! A request hands back a [`PathTicket`] immediately; the answer arrives over a oneshot
//! channel whenever the pathfinder gets to it. Dropping the ticket cancels the request and a
//! pathfinder skips work nobody is waiting for.

use std::cell::RefCell;
use std::collections::VecDeque;

use futures::channel::oneshot;
use tracing::trace;

use crate::{NavPath, Navigator, PathRequest};

/// Result of polling a ticket.
#[derive(Debug, Clone, PartialEq)]
pub enum PathPoll {
    Pending,
    Found(NavPath),
    /// No route, or the pathfinder went away before answering.
    NotFound,
}

/// Receiving half of a path request.
#[derive(Debug)]
pub struct PathTicket {
    rx: oneshot::Receiver<Option<NavPath>>,
    resolved: bool,
}

impl PathTicket {
    /// Non-blocking. Once `Found` or `NotFound` has been returned, later polls return
    /// `NotFound`.
    pub fn poll(&mut self) -> PathPoll {
        if self.resolved {
            return PathPoll::NotFound;
        }
        match self.rx.try_recv() {
            Ok(None) => PathPoll::Pending,
            Ok(Some(answer)) => {
                self.resolved = true;
                answer.map_or(PathPoll::NotFound, PathPoll::Found)
            }
            Err(oneshot::Canceled) => {
                self.resolved = true;
                PathPoll::NotFound
            }
        }
    }

    /// Withdraw the request. Equivalent to dropping the ticket.
    pub fn cancel(mut self) {
        self.rx.close();
    }
}

/// Sending half of a path request, held by the pathfinder.
#[derive(Debug)]
pub struct PathResponder {
    tx: oneshot::Sender<Option<NavPath>>,
}

impl PathResponder {
    pub fn is_cancelled(&self) -> bool {
        self.tx.is_canceled()
    }

    /// Deliver the answer. Returns `false` when the ticket was already dropped.
    pub fn respond(self, path: Option<NavPath>) -> bool {
        self.tx.send(path).is_ok()
    }
}

pub fn path_channel() -> (PathResponder, PathTicket) {
    let (tx, rx) = oneshot::channel();
    (
        PathResponder { tx },
        PathTicket {
            rx,
            resolved: false,
        },
    )
}

/// Source of path tickets. Shared by every mover in a world, hence `&self`.
pub trait Pathfinder {
    fn request(&self, request: PathRequest) -> PathTicket;
}

/// Answers every request before returning the ticket.
#[derive(Debug, Clone)]
pub struct ImmediatePathfinder<N> {
    navigator: N,
}

impl<N: Navigator> ImmediatePathfinder<N> {
    pub fn new(navigator: N) -> Self {
        Self { navigator }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }
}

impl<N: Navigator> Pathfinder for ImmediatePathfinder<N> {
    fn request(&self, request: PathRequest) -> PathTicket {
        let (responder, ticket) = path_channel();
        responder.respond(self.navigator.find_path(&request));
        ticket
    }
}

/// Queues requests and resolves them in FIFO order when [`QueuedPathfinder::process`] runs,
/// typically once per simulation tick with a fixed budget.
#[derive(Debug)]
pub struct QueuedPathfinder<N> {
    navigator: N,
    queue: RefCell<VecDeque<(PathRequest, PathResponder)>>,
}

impl<N: Navigator> QueuedPathfinder<N> {
    pub fn new(navigator: N) -> Self {
        Self {
            navigator,
            queue: RefCell::new(VecDeque::new()),
        }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Requests still waiting, cancelled ones included.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Resolve up to `budget` live requests. Cancelled requests are discarded without
    /// searching and do not count against the budget. Returns the number resolved.
    pub fn process(&self, budget: usize) -> usize {
        let mut resolved = 0;
        while resolved < budget {
            let Some((request, responder)) = self.queue.borrow_mut().pop_front() else {
                break;
            };
            if responder.is_cancelled() {
                trace!(?request, "path request cancelled, skipped");
                continue;
            }
            let path = self.navigator.find_path(&request);
            trace!(?request, found = path.is_some(), "path request resolved");
            responder.respond(path);
            resolved += 1;
        }
        resolved
    }
}

impl<N: Navigator> Pathfinder for QueuedPathfinder<N> {
    fn request(&self, request: PathRequest) -> PathTicket {
        let (responder, ticket) = path_channel();
        self.queue.borrow_mut().push_back((request, responder));
        ticket
    }
}
