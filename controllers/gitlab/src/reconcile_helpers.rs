//! Shared helpers for the per-kind transformers.
//!
//! Comparison follows "unset means don't care": a field absent from the spec
//! is equal to whatever GitLab reports. Late initialization copies remote
//! values into unset spec fields and never overwrites a field that is set.

use crate::error::ControllerError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Parse an integer external-name; empty means "not created yet"
pub fn parse_external_id(external_name: &str) -> Result<Option<i64>, ControllerError> {
    if external_name.is_empty() {
        return Ok(None);
    }
    external_name
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ControllerError::MalformedExternalName {
            value: external_name.to_string(),
        })
}

/// Like `parse_external_id`, but an unset external-name is an error
pub fn require_external_id(external_name: &str) -> Result<i64, ControllerError> {
    parse_external_id(external_name)?.ok_or(ControllerError::MissingIdentifier("external-name"))
}

/// Natural-key external-name; unset is an error
pub fn require_external_key(external_name: &str) -> Result<&str, ControllerError> {
    if external_name.is_empty() {
        return Err(ControllerError::MissingIdentifier("external-name"));
    }
    Ok(external_name)
}

/// A required parent identifier such as the project ID
pub fn require_id(id: Option<i64>, field: &'static str) -> Result<i64, ControllerError> {
    id.ok_or(ControllerError::MissingIdentifier(field))
}

/// Copy `remote` into `spec` when unset
pub fn late_init<T>(spec: &mut Option<T>, remote: T) {
    if spec.is_none() {
        *spec = Some(remote);
    }
}

/// Copy an optional remote value into `spec` when unset
pub fn late_init_opt<T>(spec: &mut Option<T>, remote: Option<T>) {
    if spec.is_none() {
        *spec = remote;
    }
}

/// Copy `remote` into `spec` when unset, skipping zero IDs
pub fn late_init_non_zero(spec: &mut Option<i64>, remote: Option<i64>) {
    if spec.is_none() {
        *spec = remote.filter(|v| *v != 0);
    }
}

/// Copy a non-empty remote string into `spec` when unset
pub fn late_init_non_empty(spec: &mut Option<String>, remote: &str) {
    if spec.is_none() && !remote.is_empty() {
        *spec = Some(remote.to_string());
    }
}

/// Copy a non-empty remote list into `spec` when unset
pub fn late_init_list<T: Clone>(spec: &mut Option<Vec<T>>, remote: &[T]) {
    if spec.is_none() && !remote.is_empty() {
        *spec = Some(remote.to_vec());
    }
}

/// Parse a remote string into a spec enum when unset; unknown values are left alone
pub fn late_init_enum<E: FromStr>(spec: &mut Option<E>, remote: &str) {
    if spec.is_none() {
        *spec = remote.parse().ok();
    }
}

/// Unset equals anything
pub fn equal_if_set<T: PartialEq>(spec: &Option<T>, remote: &T) -> bool {
    spec.as_ref().is_none_or(|v| v == remote)
}

/// Unset equals anything; set must match an optional remote value
pub fn equal_if_set_opt<T: PartialEq>(spec: &Option<T>, remote: &Option<T>) -> bool {
    spec.is_none() || spec == remote
}

/// Unset equals anything; set compares by the remote string form
pub fn enum_equal_if_set<E: Display>(spec: &Option<E>, remote: &str) -> bool {
    spec.as_ref().is_none_or(|v| v.to_string() == remote)
}

/// Order-insensitive comparison with duplicates counted; empty equals empty
pub fn multiset_equal<T: Ord>(a: &[T], b: &[T]) -> bool {
    fn counts<T: Ord>(items: &[T]) -> BTreeMap<&T, usize> {
        let mut map = BTreeMap::new();
        for item in items {
            *map.entry(item).or_insert(0) += 1;
        }
        map
    }
    a.len() == b.len() && counts(a) == counts(b)
}

/// Unset equals anything; set compares as a multiset
pub fn list_equal_if_set<T: Ord>(spec: &Option<Vec<T>>, remote: &[T]) -> bool {
    spec.as_ref().is_none_or(|v| multiset_equal(v, remote))
}

/// Resolve a field that replaced a deprecated one
///
/// The new field wins when both are set. The second value is true when only
/// the deprecated field supplied the result.
pub fn resolve_deprecated<T: Clone>(current: &Option<T>, deprecated: &Option<T>) -> (Option<T>, bool) {
    match (current, deprecated) {
        (Some(v), _) => (Some(v.clone()), false),
        (None, Some(v)) => (Some(v.clone()), true),
        (None, None) => (None, false),
    }
}

/// RFC 3339 form used in `atProvider` timestamps
pub fn format_time(time: Option<DateTime<Utc>>) -> Option<String> {
    time.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
#[path = "reconcile_helpers_test.rs"]
mod reconcile_helpers_test;
