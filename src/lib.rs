// Library root
// -----------
// Client for a school portal's JSON endpoints: sign in, load the user's
// context, then walk terms, classes and gradebook assignments. The binary
// (`main.rs`) drives it through an interactive terminal menu.
//
// Module responsibilities:
// - `session`: the stateful client; decides which calls are allowed and
//   carries ids from one response into the next request.
// - `transport`: HTTP with a session cookie store, behind a trait.
// - `query` / `decode`: request URL building and response decoding.
// - `term` / `grade`: current-term selection and score normalization.
// - `config`: base URL, timeout and the remembered profile.
// - `ui`: terminal flows on top of `session`.
pub mod config;
pub mod decode;
pub mod error;
pub mod grade;
pub mod model;
pub mod query;
pub mod session;
pub mod term;
pub mod transport;
pub mod ui;

pub use error::{Result, Step, WhapiError};
pub use session::{Session, SessionStage};
