//! Decode capacity derived from the known response shape.
//!
//! The numbers come from the schema, never from the incoming document:
//!
//! ```text
//! { "results": [ { "location": {3 members},
//!                  "now": {3 members},
//!                  "last_update": string } ] }
//! ```
//!
//! One slot holds one value together with its object key. String bytes hold
//! keys, string values and number text.

/// Slots taken by an array of `n` elements.
pub const fn array_slots(n: usize) -> usize {
    n
}

/// Slots taken by an object of `n` members.
pub const fn object_slots(n: usize) -> usize {
    n
}

/// Root value, the `results` array of one element, the root object's single
/// member, two 3-member objects, and six members for the element object plus slack.
pub const WEATHER_SLOTS: usize =
    1 + array_slots(1) + object_slots(1) + 2 * object_slots(3) + object_slots(6);

/// String storage for keys and values of the schema, with slack.
pub const WEATHER_STRING_BYTES: usize = 230;

/// Root object, `results` array, result object, `location`/`now` objects.
pub const WEATHER_NESTING: usize = 4;
