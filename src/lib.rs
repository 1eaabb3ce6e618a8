//! Twofish Harness - chunked file transform with timing instrumentation
//!
//! Reads a key file, classifies it into a supported key strength, then
//! pushes an input file through a block cipher one fixed-size chunk at a
//! time, producing an output file plus a console, log and CSV timing trail.
//!
//! ## Pipeline
//!
//! ```text
//! open files → load key (classify) → per chunk: zero → read → transform → time → write → totals
//! ```
//!
//! - **Classify**: key byte count maps to 128, 192 or 256 bits, or `Invalid`
//! - **Load**: key is zero-padded up to its tier length (plus one spare byte)
//! - **Transform**: the primitive always sees the full chunk, padding included
//! - **Write**: only the bytes actually read go to the output
//!
//! ## Example
//!
//! ```no_run
//! use twofish_harness::cli::{start_process, RunOptions};
//!
//! let options = RunOptions {
//!     action: "encrypt".into(),
//!     key: "default.key".into(),
//!     input: "input.txt".into(),
//!     output: "output.txt".into(),
//!     ..Default::default()
//! };
//! let outcome = start_process(&options).unwrap();
//! println!("{}", if outcome.is_success() { "Success..." } else { "Failure..." });
//! ```

pub mod cli;
pub mod error;
pub mod fileio;
pub mod instrument;
pub mod key;
pub mod pipeline;
pub mod tier;

pub use error::{HarnessError, Result};
pub use key::{load_key, KeyBuffer};
pub use tier::{classify, KeyTier};
