//! Field-array controller
//!
//! A field array is a list-valued path whose rows are edited structurally.
//! Every row carries a [`StableKey`] that follows it through reordering so a
//! rendering layer can keep row identity.
//!
//! Structural edits move the row's errors, touched marks and registered
//! descriptors along with its value.
//!
//! ```
//! use reinhardt_form_core::{FieldArrayOptions, FocusOptions, FormControl, FormOptions};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let form = FormControl::new(FormOptions::new());
//! let items = form.field_array("items", FieldArrayOptions::default());
//!
//! items.append(vec![json!({"n": 1}), json!({"n": 2})], FocusOptions::default()).await.unwrap();
//! let keys = items.keys();
//! items.swap(0, 1).await.unwrap();
//!
//! assert_eq!(items.keys(), vec![keys[1], keys[0]]);
//! assert_eq!(form.get_value("items"), json!([{"n": 2}, {"n": 1}]));
//! # });
//! ```

use crate::control::{ArrayRows, FormControl, FormInner, Outbox};
use crate::differ;
use crate::error::FormResult;
use crate::mode::{ReValidateMode, ValidationMode};
use crate::options::UnregisterOptions;
use crate::path;
use crate::registry::FieldDescriptor;
use crate::rules::RegisterOptions;
use crate::state::FormStateUpdate;
use crate::validation::{ValidateOptions, validate_field};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identity of a field-array row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StableKey(Uuid);

impl StableKey {
	pub fn generate() -> Self {
		Self(Uuid::new_v4())
	}

	pub fn as_uuid(&self) -> Uuid {
		self.0
	}
}

impl fmt::Display for StableKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Options for [`FormControl::field_array`]
#[derive(Debug, Clone, Default)]
pub struct FieldArrayOptions {
	/// Rules validated against the whole list
	pub rules: Option<RegisterOptions>,
	/// Unregister the array when it is unmounted
	pub should_unregister: bool,
}

/// Where focus lands after an insertion
#[derive(Debug, Clone, Default)]
pub struct FocusOptions {
	/// Defaults to true
	pub should_focus: Option<bool>,
	/// Row to focus instead of the first inserted one
	pub focus_index: Option<usize>,
	/// Exact path prefix to focus
	pub focus_name: Option<String>,
}

impl FocusOptions {
	pub fn none() -> Self {
		Self {
			should_focus: Some(false),
			..Self::default()
		}
	}

	fn target(&self, array: &str, index: usize) -> Option<String> {
		if !self.should_focus.unwrap_or(true) {
			return None;
		}
		Some(match &self.focus_name {
			Some(name) => name.clone(),
			None => format!("{array}.{}.", self.focus_index.unwrap_or(index)),
		})
	}
}

/// A row paired with its key
#[derive(Debug, Clone, PartialEq)]
pub struct FieldArrayRow {
	pub key: StableKey,
	pub value: Value,
}

/// Structural edit applied to a field array
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ArrayOp {
	Append,
	Prepend(usize),
	Insert { index: usize, count: usize },
	/// Sorted, deduplicated, in range
	Remove(Vec<usize>),
	Swap(usize, usize),
	Move { from: usize, to: usize },
	Update,
	Replace,
}

impl ArrayOp {
	/// Where the row previously at `index` ends up
	pub(crate) fn remap(&self, index: usize) -> Option<usize> {
		match self {
			ArrayOp::Append | ArrayOp::Update | ArrayOp::Replace => Some(index),
			ArrayOp::Prepend(count) => Some(index.saturating_add(*count)),
			ArrayOp::Insert { index: at, count } => {
				Some(if index >= *at { index.saturating_add(*count) } else { index })
			}
			ArrayOp::Remove(removed) => match removed.binary_search(&index) {
				Ok(_) => None,
				Err(shift) => Some(index - shift),
			},
			ArrayOp::Swap(a, b) => Some(match index {
				i if i == *a => *b,
				i if i == *b => *a,
				i => i,
			}),
			ArrayOp::Move { from, to } => Some(match index {
				i if i == *from => *to,
				i if from < to && i > *from && i <= *to => i - 1,
				i if from > to && i >= *to && i < *from => i + 1,
				i => i,
			}),
		}
	}

	/// Whether rows change position, carrying their bookkeeping along
	fn moves_rows(&self) -> bool {
		!matches!(self, ArrayOp::Append | ArrayOp::Update | ArrayOp::Replace)
	}
}

fn insert_at<T>(items: &mut Vec<T>, index: usize, rows: Vec<T>) {
	let index = index.min(items.len());
	items.splice(index..index, rows);
}

/// Remove the rows at `indices`; out-of-range indices are ignored
fn remove_at<T>(items: &mut Vec<T>, indices: &[usize]) {
	let mut index = 0;
	items.retain(|_| {
		let keep = !indices.contains(&index);
		index += 1;
		keep
	});
}

fn move_at<T>(items: &mut Vec<T>, from: usize, to: usize) {
	if from >= items.len() {
		return;
	}
	let item = items.remove(from);
	let to = to.min(items.len());
	items.insert(to, item);
}

/// Move each element of a sparse list through `op`
fn remap_list(list: Vec<Value>, op: &ArrayOp) -> Vec<Value> {
	let mut out: Vec<Value> = Vec::new();
	for (index, item) in list.into_iter().enumerate() {
		if item.is_null() {
			continue;
		}
		if let Some(target) = op.remap(index) {
			if out.len() <= target {
				out.resize(target + 1, Value::Null);
			}
			out[target] = item;
		}
	}
	out
}

impl FormInner {
	/// Current rows of `name` by position; `null` rows are rows too
	fn array_rows(&self, name: &str) -> Vec<Value> {
		path::get(&self.values, name)
			.and_then(Value::as_array)
			.cloned()
			.unwrap_or_default()
	}

	/// Store the edited rows and carry bookkeeping through `op`
	fn update_field_array(
		&mut self,
		name: &str,
		rows: Vec<Value>,
		op: &ArrayOp,
		outbox: &mut Outbox,
	) {
		path::set(&mut self.values, name, Value::Array(rows));

		if op.moves_rows() {
			self.fields.remap_rows(name, |index| op.remap(index));
			self.state.errors.remap_rows(name, |index| op.remap(index));
			self.names.mount = std::mem::take(&mut self.names.mount)
				.into_iter()
				.filter_map(|mounted| match path::split_index(&mounted, name) {
					None => Some(mounted),
					Some((index, rest)) => op.remap(index).map(|target| match rest {
						"" => format!("{name}.{target}"),
						rest => format!("{name}.{target}.{rest}"),
					}),
				})
				.collect();
			if let Some(Value::Array(touched)) =
				path::get_mut(&mut self.state.touched_fields, name)
			{
				let remapped = remap_list(std::mem::take(touched), op);
				*touched = remapped;
			}
			if path::get(&self.state.touched_fields, name).is_some_and(|t| !differ::has_marks(t)) {
				path::unset(&mut self.state.touched_fields, name);
			}
		}

		let mut update = FormStateUpdate {
			is_dirty: Some(self.compute_is_dirty()),
			errors: Some(self.state.errors.clone()),
			is_valid: Some(self.state.is_valid),
			..FormStateUpdate::named(name)
		};
		if self.interest.dirty_fields {
			update.dirty_fields = Some(differ::dirty_fields(&self.values, &self.default_values));
		}
		if op.moves_rows() && self.interest.touched_fields {
			update.touched_fields = Some(self.state.touched_fields.clone());
		}
		self.emit(outbox, update);
		outbox.array(Some(name), &self.values);
	}
}

impl FormControl {
	/// Bind a field-array controller to `name`
	///
	/// Binding the same name twice shares the row keys.
	pub fn field_array(&self, name: &str, options: FieldArrayOptions) -> FieldArray {
		let name = path::normalize(name);
		{
			let mut inner = self.lock();
			inner.names.array.insert(name.clone());
			if let Some(rules) = options.rules.clone() {
				inner.fields.upsert(&name, rules);
				inner.names.mount.insert(name.clone());
			}
			if path::get(&inner.values, &name).is_none() {
				let seeded = path::get(&inner.default_values, &name)
					.cloned()
					.unwrap_or_else(|| Value::Array(Vec::new()));
				path::set(&mut inner.values, &name, seeded);
			}
			let len = inner.array_rows(&name).len();
			inner
				.arrays
				.entry(name.clone())
				.or_insert_with(|| ArrayRows::fresh(len));
			tracing::debug!(array = %name, rows = len, "field array bound");
		}
		FieldArray {
			control: self.clone(),
			name,
			should_unregister: options.should_unregister,
		}
	}
}

/// Controller over one field array
#[derive(Clone)]
pub struct FieldArray {
	control: FormControl,
	name: String,
	should_unregister: bool,
}

impl FieldArray {
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Rows with their keys
	pub fn fields(&self) -> Vec<FieldArrayRow> {
		let mut inner = self.control.lock();
		let rows = inner.array_rows(&self.name);
		let keys = inner.arrays.entry(self.name.clone()).or_default();
		keys.fit(rows.len());
		keys.keys
			.iter()
			.zip(rows)
			.map(|(key, value)| FieldArrayRow { key: *key, value })
			.collect()
	}

	pub fn keys(&self) -> Vec<StableKey> {
		self.fields().into_iter().map(|row| row.key).collect()
	}

	pub fn len(&self) -> usize {
		self.control.lock().array_rows(&self.name).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Add rows at the end
	pub async fn append(&self, rows: Vec<Value>, focus: FocusOptions) -> FormResult<()> {
		let count = rows.len();
		self.mutate(ArrayOp::Append, focus.target(&self.name, self.len()), move |values, keys| {
			values.extend(rows);
			keys.extend((0..count).map(|_| StableKey::generate()));
		})
		.await
	}

	/// Add rows at the start
	pub async fn prepend(&self, rows: Vec<Value>, focus: FocusOptions) -> FormResult<()> {
		let count = rows.len();
		self.mutate(ArrayOp::Prepend(count), focus.target(&self.name, 0), move |values, keys| {
			insert_at(values, 0, rows);
			insert_at(keys, 0, (0..count).map(|_| StableKey::generate()).collect());
		})
		.await
	}

	/// Add rows before `index`
	pub async fn insert(
		&self,
		index: usize,
		rows: Vec<Value>,
		focus: FocusOptions,
	) -> FormResult<()> {
		let count = rows.len();
		let index = index.min(self.len());
		let op = ArrayOp::Insert { index, count };
		self.mutate(op, focus.target(&self.name, index), move |values, keys| {
			insert_at(values, index, rows);
			insert_at(keys, index, (0..count).map(|_| StableKey::generate()).collect());
		})
		.await
	}

	/// Remove the rows at `indices`
	pub async fn remove(&self, indices: &[usize]) -> FormResult<()> {
		let len = self.len();
		let indices: Vec<usize> = indices
			.iter()
			.copied()
			.filter(|index| *index < len)
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect();
		if indices.is_empty() {
			return Ok(());
		}
		let op = ArrayOp::Remove(indices.clone());
		self.mutate(op, None, move |values, keys| {
			remove_at(values, &indices);
			remove_at(keys, &indices);
		})
		.await
	}

	pub async fn remove_all(&self) -> FormResult<()> {
		let all: Vec<usize> = (0..self.len()).collect();
		if all.is_empty() {
			return Ok(());
		}
		self.mutate(ArrayOp::Remove(all), None, |values, keys| {
			values.clear();
			keys.clear();
		})
		.await
	}

	/// Exchange two rows; out-of-range indices are ignored
	pub async fn swap(&self, a: usize, b: usize) -> FormResult<()> {
		let len = self.len();
		if a >= len || b >= len {
			return Ok(());
		}
		self.mutate(ArrayOp::Swap(a, b), None, move |values, keys| {
			values.swap(a, b);
			keys.swap(a, b);
		})
		.await
	}

	/// Move a row to a new position
	pub async fn move_item(&self, from: usize, to: usize) -> FormResult<()> {
		let len = self.len();
		if from >= len {
			return Ok(());
		}
		let to = to.min(len - 1);
		self.mutate(ArrayOp::Move { from, to }, None, move |values, keys| {
			move_at(values, from, to);
			move_at(keys, from, to);
		})
		.await
	}

	/// Replace one row's value, keeping its key
	pub async fn update(&self, index: usize, row: Value) -> FormResult<()> {
		if index >= self.len() {
			return Ok(());
		}
		self.mutate(ArrayOp::Update, None, move |values, _keys| {
			values[index] = row;
		})
		.await
	}

	/// Replace every row; all keys are regenerated
	pub async fn replace(&self, rows: Vec<Value>) -> FormResult<()> {
		self.mutate(ArrayOp::Replace, None, move |values, keys| {
			*keys = (0..rows.len()).map(|_| StableKey::generate()).collect();
			*values = rows;
		})
		.await
	}

	/// Release the array; unregisters it when configured to
	pub async fn unmount(self) -> FormResult<()> {
		let should_unregister =
			self.should_unregister || self.control.lock().options.should_unregister;
		if should_unregister {
			self.control
				.unregister(&[self.name.as_str()], UnregisterOptions::default())
				.await?;
		}
		Ok(())
	}

	async fn mutate<F>(&self, op: ArrayOp, focus: Option<String>, apply: F) -> FormResult<()>
	where
		F: FnOnce(&mut Vec<Value>, &mut Vec<StableKey>),
	{
		let mut outbox = Outbox::default();
		{
			let mut inner = self.control.lock();
			let mut rows = inner.array_rows(&self.name);
			let mut keys = inner.arrays.remove(&self.name).unwrap_or_default();
			keys.fit(rows.len());
			apply(&mut rows, &mut keys.keys);
			keys.actioned = true;
			inner.arrays.insert(self.name.clone(), keys);
			inner.names.focus = focus;
			inner.flags.action = true;
			tracing::debug!(array = %self.name, ?op, rows = rows.len(), "field array edited");
			inner.update_field_array(&self.name, rows, &op, &mut outbox);
		}
		self.control.publish(outbox);
		self.settle().await
	}

	/// Post-edit pass: revalidate, notify watchers, move focus
	async fn settle(&self) -> FormResult<()> {
		let mut outbox = Outbox::default();
		let (revalidate, root, resolver_scoped) = {
			let mut inner = self.control.lock();
			inner.flags.action = false;
			let actioned = inner
				.arrays
				.get_mut(&self.name)
				.is_some_and(|rows| std::mem::take(&mut rows.actioned));
			let mode = inner.options.mode;
			let revalidate =
				actioned && (mode != ValidationMode::OnSubmit || inner.state.is_submitted);
			let rules_apply = !(inner.options.re_validate_mode == ReValidateMode::OnSubmit
				&& mode == ValidationMode::OnSubmit);
			if inner.names.is_watched(&self.name, false) {
				inner.emit(&mut outbox, FormStateUpdate::new());
			}
			let root = inner.fields.get(&self.name).cloned().filter(|_| rules_apply);
			(revalidate, root, self.control.shared.resolver.is_some())
		};
		self.control.publish(outbox);

		if revalidate {
			if resolver_scoped {
				self.revalidate_with_resolver().await?;
			} else if let Some(field) = root {
				self.revalidate_root(field).await;
			}
		}

		let mut outbox = Outbox::default();
		let refresh = {
			let mut inner = self.control.lock();
			outbox.watch(Some(&self.name), None, &inner.values);
			if let Some(prefix) = inner.names.focus.take() {
				if let Some(handle) = inner.handle_with_prefix(&prefix) {
					outbox.focus(handle, false);
				}
			}
			inner.interest.is_valid
		};
		self.control.publish(outbox);

		if refresh {
			self.control.update_valid(false).await?;
		}
		Ok(())
	}

	async fn revalidate_with_resolver(&self) -> FormResult<()> {
		let output = self.control.execute_schema(Some(vec![self.name.clone()])).await?;
		let mut outbox = Outbox::default();
		{
			let mut inner = self.control.lock();
			let slice = output.errors.slice(&self.name);
			if slice != inner.state.errors.slice(&self.name) {
				inner.state.errors.merge_slice(&self.name, slice);
				let update = FormStateUpdate {
					errors: Some(inner.state.errors.clone()),
					..FormStateUpdate::default()
				};
				inner.emit(&mut outbox, update);
			}
		}
		self.control.publish(outbox);
		Ok(())
	}

	async fn revalidate_root(&self, field: FieldDescriptor) {
		let (values, options) = {
			let inner = self.control.lock();
			let options = ValidateOptions {
				criteria_mode: inner.options.criteria_mode,
				should_use_native_validation: false,
				is_field_array: true,
			};
			(Arc::new(inner.values.clone()), options)
		};
		let value = path::get(&values, &self.name).cloned();
		let error = validate_field(&field, value.as_ref(), &values, options).await;

		let mut outbox = Outbox::default();
		{
			let mut inner = self.control.lock();
			let key = path::join(&self.name, "root");
			let changed = match error {
				Some(error) => {
					inner.state.errors.insert(&key, error.clone()).as_ref() != Some(&error)
				}
				None => inner.state.errors.remove(&key).is_some(),
			};
			if changed {
				let update = FormStateUpdate {
					errors: Some(inner.state.errors.clone()),
					..FormStateUpdate::default()
				};
				inner.emit(&mut outbox, update);
			}
		}
		self.control.publish(outbox);
	}
}

impl fmt::Debug for FieldArray {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldArray").field("name", &self.name).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error_map::{ErrorType, FieldError};
	use crate::handle::{FieldHandle, HandleRef};
	use crate::options::{FormOptions, SetErrorOptions};
	use crate::state::{StateInterest, StateKey};
	use proptest::prelude::*;
	use rstest::rstest;
	use serde_json::json;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn rows(n: usize) -> Vec<Value> {
		(0..n).map(|i| json!({"n": i})).collect()
	}

	async fn array_of(n: usize) -> (FormControl, FieldArray) {
		let form = FormControl::new(FormOptions::new());
		let items = form.field_array("items", FieldArrayOptions::default());
		items.append(rows(n), FocusOptions::none()).await.unwrap();
		(form, items)
	}

	#[rstest]
	#[case::append(ArrayOp::Append, 1, Some(1))]
	#[case::prepend(ArrayOp::Prepend(2), 1, Some(3))]
	#[case::insert_before(ArrayOp::Insert { index: 1, count: 1 }, 0, Some(0))]
	#[case::insert_after(ArrayOp::Insert { index: 1, count: 1 }, 1, Some(2))]
	#[case::removed(ArrayOp::Remove(vec![1]), 1, None)]
	#[case::shifted(ArrayOp::Remove(vec![0, 1]), 2, Some(0))]
	#[case::swapped(ArrayOp::Swap(0, 2), 2, Some(0))]
	#[case::moved(ArrayOp::Move { from: 0, to: 2 }, 0, Some(2))]
	#[case::moved_over(ArrayOp::Move { from: 0, to: 2 }, 2, Some(1))]
	#[case::moved_back(ArrayOp::Move { from: 2, to: 0 }, 0, Some(1))]
	#[case::prepend_saturates(ArrayOp::Prepend(2), usize::MAX, Some(usize::MAX))]
	fn test_remap(#[case] op: ArrayOp, #[case] index: usize, #[case] expected: Option<usize>) {
		assert_eq!(op.remap(index), expected);
	}

	#[rstest]
	#[tokio::test]
	async fn test_remove_keeps_surviving_keys() {
		// Arrange
		let (form, items) = array_of(3).await;
		let before = items.keys();

		// Act
		items.remove(&[1]).await.unwrap();

		// Assert
		assert_eq!(items.keys(), vec![before[0], before[2]]);
		assert_eq!(form.get_value("items"), json!([{"n": 0}, {"n": 2}]));
	}

	#[rstest]
	#[tokio::test]
	async fn test_null_rows_keep_their_position_and_key() {
		// Arrange
		let form = FormControl::new(FormOptions::new());
		let items = form.field_array("items", FieldArrayOptions::default());
		items
			.append(vec![Value::Null, json!("b")], FocusOptions::none())
			.await
			.unwrap();
		let before = items.keys();

		// Act
		items.append(vec![json!("c")], FocusOptions::none()).await.unwrap();

		// Assert
		let after = items.fields();
		assert_eq!(before.len(), 2);
		assert_eq!(items.len(), 3);
		assert_eq!(form.get_value("items"), json!([null, "b", "c"]));
		assert_eq!(after[0].key, before[0]);
		assert_eq!(after[0].value, Value::Null);
		assert_eq!(after[1].key, before[1]);
		assert_eq!(after[1].value, json!("b"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_swap_moves_null_row_by_position() {
		// Arrange
		let form = FormControl::new(FormOptions::new());
		let items = form.field_array("items", FieldArrayOptions::default());
		items
			.append(vec![json!("a"), Value::Null, json!("c")], FocusOptions::none())
			.await
			.unwrap();
		let before = items.keys();

		// Act
		items.swap(1, 2).await.unwrap();

		// Assert
		assert_eq!(form.get_value("items"), json!(["a", "c", null]));
		assert_eq!(items.keys(), vec![before[0], before[2], before[1]]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_update_preserves_key_and_replace_regenerates() {
		// Arrange
		let (_form, items) = array_of(2).await;
		let before = items.keys();

		// Act
		items.update(1, json!({"n": 9})).await.unwrap();
		let after_update = items.keys();
		items.replace(rows(2)).await.unwrap();

		// Assert
		assert_eq!(after_update, before);
		assert!(items.keys().iter().all(|key| !before.contains(key)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_row_errors_follow_rows() {
		// Arrange
		let (form, items) = array_of(3).await;
		form.set_error(
			"items.2.n",
			FieldError::new(ErrorType::Required, "third"),
			SetErrorOptions::default(),
		);

		// Act
		items.move_item(2, 0).await.unwrap();

		// Assert
		let errors = form.form_state().errors;
		assert_eq!(errors.get("items.0.n").map(|e| e.message.clone()), Some("third".into()));
		assert!(!errors.contains("items.2.n"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_removing_row_drops_its_error_and_touched_mark() {
		// Arrange
		let (form, items) = array_of(2).await;
		form.declare_interest(StateInterest::new().with(StateKey::TouchedFields));
		form.set_error(
			"items.0.n",
			FieldError::new(ErrorType::Required, ""),
			SetErrorOptions::default(),
		);
		let field = form.register("items.0.n", RegisterOptions::new());
		field.on_blur().await.unwrap();

		// Act
		items.remove(&[0]).await.unwrap();

		// Assert
		let state = form.form_state();
		assert!(state.errors.is_empty());
		assert_eq!(state.touched_fields, json!({}));
		assert!(!form.lock().fields.contains("items.0.n"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_append_focuses_new_row() {
		// Arrange
		#[derive(Default)]
		struct Input(AtomicUsize);
		impl FieldHandle for Input {
			fn focus(&self) {
				self.0.fetch_add(1, Ordering::SeqCst);
			}
		}
		let (form, items) = array_of(1).await;
		let input = Arc::new(Input::default());

		// Act
		items.append(rows(1), FocusOptions::default()).await.unwrap();
		form.register("items.1.n", RegisterOptions::new())
			.attach(Some(input.clone() as HandleRef));
		items.append(rows(1), FocusOptions { focus_index: Some(1), ..Default::default() })
			.await
			.unwrap();

		// Assert
		assert_eq!(input.0.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_root_rules_validated_after_edit_once_submitted() {
		// Arrange
		let form = FormControl::new(FormOptions::new());
		let items = form.field_array(
			"items",
			FieldArrayOptions {
				rules: Some(RegisterOptions::new().with_min_length((2, "at least two"))),
				..Default::default()
			},
		);
		items.append(rows(1), FocusOptions::none()).await.unwrap();
		form.handle_valid_submit(|_| async { Ok::<_, anyhow::Error>(()) })
			.await
			.unwrap();
		let after_submit = form.form_state().errors.contains("items.root");

		// Act
		items.append(rows(1), FocusOptions::none()).await.unwrap();

		// Assert
		assert!(after_submit);
		assert!(!form.form_state().errors.contains("items.root"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_set_value_on_root_regenerates_keys() {
		// Arrange
		let (form, items) = array_of(2).await;
		let before = items.keys();

		// Act
		form.set_value("items", json!([{"n": 5}]), Default::default())
			.await
			.unwrap();

		// Assert
		let after = items.keys();
		assert_eq!(after.len(), 1);
		assert!(!before.contains(&after[0]));
	}

	proptest! {
		#[test]
		fn test_key_order_tracks_value_order(
			ops in prop::collection::vec((0usize..4, 0usize..6, 0usize..6), 0..12),
		) {
			let runtime = tokio::runtime::Builder::new_current_thread()
				.enable_all()
				.build()
				.unwrap();
			runtime.block_on(async {
				let (form, items) = array_of(4).await;
				let original: Vec<(StableKey, Value)> = items
					.fields()
					.into_iter()
					.map(|row| (row.key, row.value))
					.collect();

				for (kind, a, b) in ops {
					match kind {
						0 => items.swap(a, b).await.unwrap(),
						1 => items.move_item(a, b).await.unwrap(),
						2 => items.remove(&[a]).await.unwrap(),
						_ => items
							.insert(a, vec![json!({"n": 100 + b})], FocusOptions::none())
							.await
							.unwrap(),
					}
				}

				let rows = items.fields();
				prop_assert_eq!(rows.len(), form.get_value("items").as_array().map_or(0, Vec::len));
				for row in rows {
					if let Some((_, value)) = original.iter().find(|(key, _)| *key == row.key) {
						prop_assert_eq!(&row.value, value);
					}
				}
				Ok(())
			})?;
		}
	}
}
