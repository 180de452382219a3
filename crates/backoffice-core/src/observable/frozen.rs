//! Frozen collection helpers - immutable updates over identity-keyed vectors
//!
//! Every helper takes the current collection by reference and returns a new
//! vector. Elements that are not touched are carried over unchanged, so
//! callers can hand the result straight to [`State::set_value`] and rely on
//! the state's equality check to skip no-op updates.
//!
//! # Example
//!
//! ```rust
//! use backoffice_core::observable::frozen::append_to_frozen_array;
//!
//! let items = vec![(1, "a"), (2, "b")];
//!
//! // Same key: replaced in place
//! let items = append_to_frozen_array(&items, (2, "B"), |x| x.0);
//! assert_eq!(items, vec![(1, "a"), (2, "B")]);
//!
//! // New key: appended
//! let items = append_to_frozen_array(&items, (3, "c"), |x| x.0);
//! assert_eq!(items, vec![(1, "a"), (2, "B"), (3, "c")]);
//! ```
//!
//! [`State::set_value`]: super::State::set_value

/// Append `entry`, or replace the element sharing its key in place.
///
/// The index of a replaced element is preserved. A novel key is appended at
/// the end, leaving the relative order of existing elements intact.
pub fn append_to_frozen_array<T, K>(data: &[T], entry: T, key_of: impl Fn(&T) -> K) -> Vec<T>
where
    T: Clone,
    K: PartialEq,
{
    let key = key_of(&entry);
    let mut next = data.to_vec();
    match next.iter().position(|existing| key_of(existing) == key) {
        Some(index) => next[index] = entry,
        None => next.push(entry),
    }
    next
}

/// Append or replace several entries, in order.
pub fn append_many_to_frozen_array<T, K>(
    data: &[T],
    entries: impl IntoIterator<Item = T>,
    key_of: impl Fn(&T) -> K,
) -> Vec<T>
where
    T: Clone,
    K: PartialEq,
{
    entries
        .into_iter()
        .fold(data.to_vec(), |acc, entry| {
            append_to_frozen_array(&acc, entry, &key_of)
        })
}

/// Patch the first element matching `find`.
///
/// At most one element is touched. When nothing matches the result equals
/// the input.
pub fn partial_update_frozen_array<T>(
    data: &[T],
    patch: impl FnOnce(&mut T),
    find: impl Fn(&T) -> bool,
) -> Vec<T>
where
    T: Clone,
{
    let mut next = data.to_vec();
    if let Some(target) = next.iter_mut().find(|item| find(item)) {
        patch(target);
    }
    next
}

/// Patch the first element matching `find`, or append a new one.
///
/// When nothing matches, `create` builds the element that `patch` is then
/// applied to, so both paths go through the same field assignment.
pub fn upsert_frozen_array<T>(
    data: &[T],
    find: impl Fn(&T) -> bool,
    create: impl FnOnce() -> T,
    patch: impl FnOnce(&mut T),
) -> Vec<T>
where
    T: Clone,
{
    let mut next = data.to_vec();
    match next.iter_mut().find(|item| find(item)) {
        Some(target) => patch(target),
        None => {
            let mut created = create();
            patch(&mut created);
            next.push(created);
        }
    }
    next
}

/// Remove every element whose key is in `keys`.
pub fn remove_from_frozen_array<T, K>(data: &[T], keys: &[K], key_of: impl Fn(&T) -> K) -> Vec<T>
where
    T: Clone,
    K: PartialEq,
{
    data.iter()
        .filter(|item| !keys.contains(&key_of(item)))
        .cloned()
        .collect()
}

/// Push `entry` only if no element shares its key.
pub fn push_to_unique_array<T, K>(data: &[T], entry: T, key_of: impl Fn(&T) -> K) -> Vec<T>
where
    T: Clone,
    K: PartialEq,
{
    let key = key_of(&entry);
    let mut next = data.to_vec();
    if !next.iter().any(|existing| key_of(existing) == key) {
        next.push(entry);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Variant {
        culture: Option<&'static str>,
        segment: Option<&'static str>,
        name: String,
    }

    fn variant(culture: Option<&'static str>, name: &str) -> Variant {
        Variant {
            culture,
            segment: None,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_append_replaces_in_place() {
        let data = vec![(1, "a"), (2, "b"), (3, "c")];
        let next = append_to_frozen_array(&data, (2, "x"), |x| x.0);
        assert_eq!(next, vec![(1, "a"), (2, "x"), (3, "c")]);
        // input untouched
        assert_eq!(data[1], (2, "b"));
    }

    #[test]
    fn test_append_novel_key_goes_last() {
        let data = vec![(1, "a")];
        let next = append_to_frozen_array(&data, (9, "z"), |x| x.0);
        assert_eq!(next, vec![(1, "a"), (9, "z")]);
    }

    #[test]
    fn test_append_many_later_entry_wins() {
        let data: Vec<(u8, &str)> = vec![];
        let next = append_many_to_frozen_array(&data, [(1, "a"), (2, "b"), (1, "c")], |x| x.0);
        assert_eq!(next, vec![(1, "c"), (2, "b")]);
    }

    #[test]
    fn test_partial_update_touches_one_match() {
        let data = vec![variant(Some("en-us"), "Doc"), variant(Some("en-us"), "Dup")];
        let next = partial_update_frozen_array(
            &data,
            |v| v.name = "Renamed".into(),
            |v| v.culture == Some("en-us"),
        );
        assert_eq!(next[0].name, "Renamed");
        assert_eq!(next[1].name, "Dup");
    }

    #[test]
    fn test_partial_update_without_match_is_identity() {
        let data = vec![variant(Some("en-us"), "Doc")];
        let next = partial_update_frozen_array(
            &data,
            |v| v.name = "Renamed".into(),
            |v| v.culture == Some("da-dk"),
        );
        assert_eq!(next, data);
    }

    #[test]
    fn test_upsert_appends_when_missing() {
        let data = vec![variant(Some("en-us"), "Doc")];
        let next = upsert_frozen_array(
            &data,
            |v| v.culture == Some("da-dk") && v.segment.is_none(),
            || variant(Some("da-dk"), ""),
            |v| v.name = "Die Dokument".into(),
        );
        assert_eq!(next.len(), 2);
        assert_eq!(next[0], variant(Some("en-us"), "Doc"));
        assert_eq!(next[1], variant(Some("da-dk"), "Die Dokument"));
    }

    #[test]
    fn test_remove_and_unique_push() {
        let data = vec![1, 2, 3, 4];
        assert_eq!(remove_from_frozen_array(&data, &[2, 4], |x| *x), vec![1, 3]);
        assert_eq!(push_to_unique_array(&data, 3, |x| *x), data);
        assert_eq!(push_to_unique_array(&data, 5, |x| *x), vec![1, 2, 3, 4, 5]);
    }
}
