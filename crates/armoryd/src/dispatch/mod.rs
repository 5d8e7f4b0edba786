//! JSONL request dispatch.
//!
//! The daemon reads one JSON request per line and writes one JSON reply per
//! line. The `op` field selects the operation:
//!
//! ```json
//! {"op":"list","kind":"encoder"}
//! {"op":"describe","kind":"payload","plugin":"shell/reverse_tcp"}
//! {"op":"encode","plugin":"base64","form":"data=hello&params%5Bpadding%5D=false"}
//! {"op":"build","kind":"payload","plugin":"cmd/exec","form":{"params":{"command":"id"}}}
//! {"op":"enqueue","job":"nmap","form":{"targets":"10.0.0.1"}}
//! ```
//!
//! A `form` is either the urlencoded body the page would post or the same
//! fields as JSON. Every reply is one line of the shape
//! `{"status":..,"body":..}`, shown wrapped here:
//!
//! ```json
//! {"status":200,"body":{"plugin":"base64","kind":"encoder",
//!   "params":{"padding":false},
//!   "artifact":{"type":"encoded","text":"aGVsbG8","hex":"61475673624738"}}}
//! {"status":400,"body":{"error":"validation","message":"...",
//!   "errors":[{"kind":"missing_required","field":"port"}]}}
//! ```

mod errors;
mod reply;
mod request;
mod router;
mod session;

pub use self::errors::DispatchError;
pub use self::reply::{Reply, ReplyWriter, STATUS_ACCEPTED, STATUS_OK};
pub use self::request::{FormBody, FromFlatForm, Request};
pub use self::router::Dispatcher;
pub use self::session::{Session, SessionSummary};
