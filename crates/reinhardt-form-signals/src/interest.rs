//! Path-interest predicate shared by watchers and state subscribers

/// Whether `prefix` addresses `path` or one of its ancestors
///
/// Prefixes only match on segment boundaries: `items` is a prefix of
/// `items.0.name` but not of `itemsCount`.
///
/// # Examples
///
/// ```
/// use reinhardt_form_signals::is_path_prefix;
///
/// assert!(is_path_prefix("items", "items.0.name"));
/// assert!(is_path_prefix("items", "items"));
/// assert!(!is_path_prefix("items", "itemsCount"));
/// ```
pub fn is_path_prefix(prefix: &str, path: &str) -> bool {
	match path.strip_prefix(prefix) {
		Some(rest) => rest.is_empty() || prefix.is_empty() || rest.starts_with('.'),
		None => false,
	}
}

/// Decide whether a subscriber interested in `subscribed` cares about a
/// notification for `name`
///
/// A subscriber with no names, or a notification with no name, always
/// matches. With `exact` set, only identical paths match; otherwise a match
/// is an identical path or one path being an ancestor of the other.
///
/// # Examples
///
/// ```
/// use reinhardt_form_signals::name_matches;
///
/// let names = vec!["address".to_string()];
/// assert!(name_matches(Some(&names), Some("address.city"), false));
/// assert!(!name_matches(Some(&names), Some("address.city"), true));
/// assert!(name_matches(None, Some("anything"), true));
/// ```
pub fn name_matches(subscribed: Option<&[String]>, name: Option<&str>, exact: bool) -> bool {
	let (subscribed, name) = match (subscribed, name) {
		(Some(subscribed), Some(name)) if !subscribed.is_empty() => (subscribed, name),
		_ => return true,
	};

	if exact {
		return subscribed.iter().any(|s| s == name);
	}

	subscribed
		.iter()
		.any(|s| is_path_prefix(s, name) || is_path_prefix(name, s))
}
