//! Hand kernel: joint hierarchy, tween engine, animation driver and clock.
//!
//! # Invariants
//! - Parents precede children in the rig arena; one forward pass updates all
//!   world transforms.
//! - The Nth joint created owns instance slot N.
//! - All mutation happens on the frame thread; nothing here locks.

pub mod clock;
pub mod driver;
pub mod hand;
pub mod outline;
pub mod rig;
pub mod tween;

pub use clock::FrameClock;
pub use driver::{AnimationDriver, CURL_CLOSED, CURL_HALF_PERIOD, CURL_OPEN};
pub use hand::{FingerSpec, Hand, HandLayout, IdleSpin, MountSpec};
pub use outline::{CatmullRom, palm_outline};
pub use rig::{InstanceSink, Node, NodeKind, Rig, RigError};
pub use tween::{Easing, Repeat, Tween};
