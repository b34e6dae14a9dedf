//! Scanner contract.
//!
//! A scanner locates files matching configured terms and invokes the
//! collector's callback with fully opened [`Match`](crate::models::Match)
//! records, one at a time, synchronously. The callback receives a `stop`
//! flag it may set to request termination; a scanner checks the flag
//! between matches and the collector ignores matches delivered after it
//! was raised.

use crate::error::CollectionError;
use crate::models::Match;

mod walker;

pub use walker::FsScanner;

/// Callback invoked once per match, in the scanner's calling context.
pub type MatchCallback<'a> = dyn FnMut(Match, &mut bool) + 'a;

/// A source of matches.
pub trait Scanner {
    /// Produce matches until exhausted or until the callback raises the
    /// stop flag.
    fn find(&mut self, on_match: &mut MatchCallback) -> Result<(), CollectionError>;
}
