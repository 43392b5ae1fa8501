//! Field-level change detection between two scrapes.

use crate::rating::Field;
use crate::rating::RatingFields;
use crate::rating::SENTINEL;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldChange {
    pub field: Field,
    pub old: Option<String>,
    pub new: String,
}

/// Compares `current` against `previous` over [`Field::WATCHED`].
///
/// A change is reported only when the new value is present, is not the
/// [`SENTINEL`] and differs from the old one. Values that disappear or turn
/// back into the sentinel are not reported. With no `previous` every real
/// watched value counts as a change. The result follows watch-list order.
pub fn diff(previous: Option<&RatingFields>, current: &RatingFields) -> Vec<FieldChange> {
    Field::WATCHED
        .iter()
        .filter_map(|&field| {
            let old = previous.and_then(|p| p.get(field));
            let new = current.get(field)?;
            if new == SENTINEL || Some(new) == old {
                return None;
            }
            Some(FieldChange {
                field,
                old: old.map(str::to_string),
                new: new.to_string(),
            })
        })
        .collect()
}
