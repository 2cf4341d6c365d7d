//! Pathfinding interface for NPC agents.
//!
//! Movement operators never block on a route: they ask a [`Pathfinder`] for a [`PathTicket`]
//! and poll it once per tick. Dropping the ticket cancels the request.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod grid;
pub mod math;
pub mod navigator;
pub mod operator;
pub mod ticket;
pub mod world;

pub use grid::NavGrid;
pub use math::Vec2;
pub use navigator::{NavPath, Navigator, PathRequest, TraversalMask};
pub use operator::{MoveTarget, MoveToOperator};
pub use ticket::{
    path_channel, ImmediatePathfinder, PathPoll, PathResponder, PathTicket, Pathfinder,
    QueuedPathfinder,
};
pub use world::{NavWorldMut, NavWorldView};
