//! Structured, serializable descriptions of runtime values: kind, own
//! properties with accessor metadata, the prototype chain, and bounded
//! samples of iterable contents. Descriptions render to HTML for
//! interactive inspection.
pub mod classify;
pub mod cli;
pub mod config;
pub mod describe;
pub mod error;
pub mod jq_exec;
pub mod realm;
pub mod render;
pub mod sample;
pub mod serialize;

pub use classify::classify;
pub use config::{DescribeOptions, IgnoredTypes};
pub use describe::{Description, PropertyDescription, PropertyValue, RESTRICTED_PROPERTY, describe, describe_with};
pub use error::{DescribeError, Thrown, ThrownKind};
pub use realm::{ObjectId, PropertyKey, Realm, Value};
pub use render::render_html;
pub use sample::{Bucket, BucketedSample, sample};
pub use serialize::{ParsedSignature, parse_signature, serialize};
