//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity update.
#[derive(Clone, Copy, Debug)]
pub struct Modification;

/// Marker type describing an entity cancellation.
#[derive(Clone, Copy, Debug)]
pub struct Cancellation;

/// Marker type describing a report of something.
#[derive(Clone, Copy, Debug)]
pub struct Report;

/// Marker type describing a planned date of something.
#[derive(Clone, Copy, Debug)]
pub struct Schedule;

/// Marker type describing a deadline of something.
#[derive(Clone, Copy, Debug)]
pub struct Due;
