//! Authentication sessions and route access control.

pub mod gate;
pub mod session;

pub use gate::{evaluate, AccessDecision, Route};
pub use session::{expiry, Role, Session, UserClass};
