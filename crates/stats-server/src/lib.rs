//! Statistics aggregator for relayed vehicle events.
//!
//! [`Aggregator`] owns the running [`AggregateState`](stats_types::AggregateState)
//! behind a single lock, so each ingest lands as one unit and every snapshot
//! is a consistent point-in-time copy. [`router`] and [`serve`] expose it over
//! HTTP:
//!
//! | Method | Path       | Behavior                                         |
//! |--------|------------|--------------------------------------------------|
//! | POST   | `/stats`   | ingest one relay payload; 200 empty body or 400  |
//! | GET    | `/`        | current snapshot as JSON                         |
//! | GET    | `/healthz` | liveness probe                                   |

pub mod aggregator;
pub mod error;
pub mod server;

pub use aggregator::Aggregator;
pub use error::{AggregatorError, ServerError};
pub use server::{router, serve};
