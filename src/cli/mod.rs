//! # CLI Module
//!
//! Command implementations behind the `spotgate` binary. Argument parsing lives
//! in `main.rs`; the functions here load what they need and report progress
//! with the crate's console macros.
//!
//! ## Commands
//!
//! - [`serve`] - Runs the HTTP gateway. Missing credentials stop the program
//!   before the listener is bound.
//!
//! ## Usage
//!
//! ```bash
//! spotgate serve                    # listen on SERVER_ADDRESS (default 127.0.0.1:3000)
//! spotgate serve --open             # and open /login in the browser
//! spotgate serve --addr 0.0.0.0:8080
//! spotgate completions zsh > _spotgate
//! ```

mod serve;

pub use serve::serve;
