//! The traversal engine.
//!
//! Walks a value's own properties, iterable contents and prototype chain,
//! producing a finite [`Description`] tree. Cycles are cut by identity
//! against the objects already on the current path; iterables are sampled
//! with fixed caps. Traversal state is passed down by value (copy on
//! descend) and never exposed to callers.
pub mod model;

pub use model::{Description, PropertyDescription, PropertyValue};

use tracing::{debug, debug_span, trace, warn};

use crate::classify::{classify, is_array_like, is_iterable, is_iterator, is_primitive_or_null};
use crate::config::{DEFAULT_OPTIONS, DescribeOptions};
use crate::error::{DescribeError, Result};
use crate::realm::{ObjectId, Property, PropertyKey, Realm, Slot, Value};
use crate::sample::{self, BucketedSample};
use crate::serialize::{self, ParsedSignature, parse_signature};

/// Stands in for the value of a property whose read was refused.
pub const RESTRICTED_PROPERTY: &str = "Symbol(restricted property)";
const RESTRICTED_KIND: &str = "symbol";

/// Describe `value` with default options.
pub fn describe(realm: &mut Realm, value: &Value) -> Result<Description> {
    describe_with(realm, value, &DEFAULT_OPTIONS)
}

/// Describe `value`. Types listed in `options.ignored_types` end the
/// prototype walk.
pub fn describe_with(realm: &mut Realm, value: &Value, options: &DescribeOptions) -> Result<Description> {
    let span = debug_span!("describe", ignored = options.ignored_types.len());
    let _enter = span.enter();
    Describer { realm, options }.describe(value, &[], &[])
}

// ————————————————————————————————————————————————————————————————————————————
// ENGINE
// ————————————————————————————————————————————————————————————————————————————

struct Describer<'a> {
    realm: &'a mut Realm,
    options: &'a DescribeOptions,
}

impl Describer<'_> {
    /// `history` holds the objects on the path from the root; `chain` the
    /// descendants already visited while climbing to this prototype.
    fn describe(&mut self, value: &Value, history: &[ObjectId], chain: &[ObjectId]) -> Result<Description> {
        let kind = classify(self.realm, value);
        let obj = match value.as_object() {
            Some(obj) if !is_primitive_or_null(self.realm, value) => obj,
            _ => return Ok(Description::primitive(kind, self.summarize(value)?)),
        };
        if let Some(limit) = self.options.max_depth {
            if history.len() >= limit {
                return Err(DescribeError::DepthExceeded { limit });
            }
        }
        let summary = self.summarize(value)?;
        let is_iterable = is_iterable(self.realm, value);
        let is_iterator = is_iterator(self.realm, value);
        let is_cycle = history.contains(&obj);

        let mut history = history.to_vec();
        history.push(obj);

        let properties = self.properties(obj, &kind, is_cycle, is_iterable, &history, chain)?;

        // A revisited object lists its properties (as markers) and stops there.
        let mut iterable_sample = None;
        let mut prototype_description = None;
        if !is_cycle {
            if is_iterable && !self.inherits_iterability(chain) {
                iterable_sample = self.sample(value, &history)?;
            }
            prototype_description = self.prototype(obj, &history, chain)?.map(Box::new);
        }

        Ok(Description {
            kind,
            is_primitive: false,
            value: None,
            summary: Some(summary),
            is_iterable,
            is_iterator,
            properties: Some(properties),
            iterable_sample,
            prototype_description,
            is_circular: is_cycle,
        })
    }

    fn properties(
        &mut self,
        obj: ObjectId,
        declared_on: &str,
        is_cycle: bool,
        is_iterable: bool,
        history: &[ObjectId],
        chain: &[ObjectId],
    ) -> Result<Vec<PropertyDescription>> {
        // elements of iterable array-likes surface through the sample instead
        let skip_indices = self.realm.is_array(obj) || (is_iterable && is_array_like(self.realm, obj));
        let keys = self.realm.own_keys(obj);
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            if skip_indices && key.as_index().is_some() {
                continue;
            }
            // a getter earlier in the walk may have removed it
            let Some(descriptor) = self.realm.own_property(obj, &key).cloned() else {
                continue;
            };
            trace!(property = %key, declared_on, "describing property");
            out.push(self.property(obj, key, descriptor, declared_on, is_cycle, history, chain)?);
        }
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    fn property(
        &mut self,
        obj: ObjectId,
        key: PropertyKey,
        descriptor: Property,
        declared_on: &str,
        is_cycle: bool,
        history: &[ObjectId],
        chain: &[ObjectId],
    ) -> Result<PropertyDescription> {
        let (getter_signature, setter_signature) = match descriptor.slot {
            Slot::Accessor { get, set } => (self.signature(get)?, self.signature(set)?),
            Slot::Data(_) => (None, None),
        };
        let overridden_by = self.overridden_by(&key, chain);

        let (kind, value, is_restricted) = match self.realm.get(obj, &key) {
            Ok(read) => {
                let kind = classify(self.realm, &read);
                let value = if is_primitive_or_null(self.realm, &read) {
                    PropertyValue::Primitive(self.summarize(&read)?)
                } else if is_cycle {
                    let summary = self.summarize(&read)?;
                    PropertyValue::Described(Box::new(Description::circular(kind.clone(), &summary)))
                } else {
                    PropertyValue::Described(Box::new(self.describe(&read, history, &[])?))
                };
                (kind, value, false)
            }
            Err(thrown) if thrown.is_type_error() => {
                debug!(property = %key, %thrown, "property read refused; substituting sentinel");
                let sentinel = PropertyValue::Primitive(RESTRICTED_PROPERTY.to_string());
                (RESTRICTED_KIND.to_string(), sentinel, true)
            }
            Err(thrown) => return Err(thrown.into()),
        };

        Ok(PropertyDescription {
            name: key.to_string(),
            kind,
            enumerable: descriptor.enumerable,
            configurable: descriptor.configurable,
            declared_on: declared_on.to_string(),
            overridden_by,
            getter_signature,
            setter_signature,
            is_restricted,
            value,
        })
    }

    fn signature(&self, func: Option<ObjectId>) -> Result<Option<ParsedSignature>> {
        parse_signature(self.realm, func.map(Value::Object).as_ref())
    }

    /// Kinds of the already-visited descendants that declare `key` themselves.
    fn overridden_by(&mut self, key: &PropertyKey, chain: &[ObjectId]) -> Vec<String> {
        let redeclaring: Vec<ObjectId> =
            chain.iter().rev().copied().filter(|o| self.realm.has_own(*o, key)).collect();
        redeclaring.into_iter().map(|o| classify(self.realm, &Value::Object(o))).collect()
    }

    /// `chain[0]` is the origin object; only the prototypes between it and
    /// the current level count.
    fn inherits_iterability(&mut self, chain: &[ObjectId]) -> bool {
        chain.iter().skip(1).any(|o| is_iterable(self.realm, &Value::Object(*o)))
    }

    /// Bucketed descriptions of the first elements. Enumeration failures
    /// drop the sample; everything else propagates.
    fn sample(&mut self, value: &Value, history: &[ObjectId]) -> Result<Option<BucketedSample<Description>>> {
        let raw = match sample::sample(self.realm, value, self.options.bucket_size, self.options.max_total) {
            Ok(raw) => raw,
            Err(DescribeError::Sampling(thrown)) => {
                warn!(%thrown, "enumeration failed; iterable sample omitted");
                return Ok(None);
            }
            Err(error) => return Err(error),
        };
        raw.try_map(|item| self.describe(&item, history, &[])).map(Some)
    }

    fn prototype(&mut self, obj: ObjectId, history: &[ObjectId], chain: &[ObjectId]) -> Result<Option<Description>> {
        let Some(proto) = self.realm.prototype_of(obj) else {
            return Ok(None);
        };
        let proto = Value::Object(proto);
        let proto_kind = classify(self.realm, &proto);
        if self.options.is_ignored(&proto_kind) {
            trace!(kind = %proto_kind, "prototype ignored");
            return Ok(None);
        }
        let mut chain = chain.to_vec();
        chain.push(obj);
        self.describe(&proto, history, &chain).map(Some)
    }

    fn summarize(&mut self, value: &Value) -> Result<String> {
        serialize::serialize(self.realm, value, self.options.truncate_at)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
