// Copyright groupdag contributors.
//
// This software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, this software is distributed
// under the GPL Licence on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licence for the specific language
// governing permissions and limitations relating to use of this software.

//! A decentralised group access-control engine.
//!
//! Participants are identified by Ed25519 public keys and communicate by
//! producing signed *operations* that form an append-only hash DAG. Given an
//! arbitrary set of such operations — possibly received out of order and
//! containing concurrent branches — [`interpreter::interpret`] deterministically
//! computes the set of currently authorised group members and the set of
//! valid application messages ("posts").
//!
//! The crate performs no network I/O, no persistence, and does not mutate
//! operations once produced: `interpret` is a pure function of its input.

pub mod authority_graph;
pub mod canonical_json;
pub mod config;
pub mod crypto;
pub mod dag;
pub mod envelope;
pub mod error;
pub mod interpreter;
pub mod ops;
pub mod seniority;

#[macro_use]
extern crate tracing;

pub use config::InterpreterConfig;
pub use error::{Error, Result};
pub use interpreter::{interpret, Interpretation};

#[cfg(test)]
use std::sync::Once;
#[cfg(test)]
static INIT: Once = Once::new();

/// Initialise a `tracing` subscriber for tests, run only once even if called
/// multiple times.
#[cfg(test)]
pub fn init_logger() {
    INIT.call_once(|| {
        tracing_subscriber::fmt::fmt()
            .with_ansi(false)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_target(false)
            .try_init()
            .unwrap_or_else(|_| println!("error initializing logger"));
    });
}
