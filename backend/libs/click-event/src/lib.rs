//! Click event record shared by the tracker and the exporter
//!
//! Every click accepted by the tracking endpoint becomes an [`EventRecord`].
//! The record is encoded as a flat JSON object before it is pushed onto the
//! durable queue and decoded again by the exporter:
//!
//! ```json
//! {
//!   "id": "0d5c1c9e-3f5e-4a47-9d47-2d0f6a0b8b11",
//!   "timestamp": "2024-05-01T12:00:00.123456+00:00",
//!   "uniqueId": "campaign-42",
//!   "sub1": "", "sub2": "", "sub3": "", "sub4": "", "sub5": "",
//!   "sub6": "", "sub7": "", "sub8": "", "sub9": "", "sub10": "",
//!   "ip": "203.0.113.7",
//!   "user_agent": "Mozilla/5.0"
//! }
//! ```
//!
//! `id` and `timestamp` are required when decoding; every other key defaults
//! to an empty string.

pub mod attributes;
pub mod codec;
mod record;

pub use attributes::{ClickAttributes, ATTRIBUTE_NAMES};
pub use codec::{decode, encode, CodecError};
pub use record::EventRecord;
