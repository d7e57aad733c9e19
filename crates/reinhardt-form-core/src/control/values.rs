//! Reading, writing and watching values

use super::{ArrayRows, FormControl, Outbox};
use crate::differ;
use crate::error::FormResult;
use crate::options::SetValueOptions;
use crate::path;
use crate::state::FormStateUpdate;
use serde_json::Value;

/// Project `values` onto `names`
///
/// No names yields the whole tree, one name its value, several an array.
pub(crate) fn select(values: &Value, names: &[String]) -> Value {
	match names {
		[] => values.clone(),
		[name] => path::get_or(values, name, Value::Null),
		names => Value::Array(
			names
				.iter()
				.map(|name| path::get_or(values, name, Value::Null))
				.collect(),
		),
	}
}

fn normalized(names: &[&str]) -> Vec<String> {
	names.iter().map(|name| path::normalize(name)).collect()
}

impl FormControl {
	/// Snapshot of every value
	pub fn get_values(&self) -> Value {
		self.lock().values.clone()
	}

	/// Value at `name`, `Null` when absent
	pub fn get_value(&self, name: &str) -> Value {
		self.lock().value_at(&path::normalize(name))
	}

	pub fn get_values_of(&self, names: &[&str]) -> Vec<Value> {
		let inner = self.lock();
		normalized(names)
			.iter()
			.map(|name| inner.value_at(name))
			.collect()
	}

	/// Read values and mark them as watched
	///
	/// Watched paths receive a full state publication when they change.
	/// With no names the whole form is watched.
	pub fn watch(&self, names: &[&str]) -> Value {
		let names = normalized(names);
		let mut inner = self.lock();
		if names.is_empty() {
			inner.names.watch_all = true;
		} else {
			inner.names.watch.extend(names.iter().cloned());
		}
		select(&inner.values, &names)
	}

	/// Write a value programmatically
	///
	/// Writing an object over a group of registered fields updates each of
	/// them. Writing a field-array root regenerates its row keys.
	pub async fn set_value(
		&self,
		name: &str,
		value: Value,
		options: SetValueOptions,
	) -> FormResult<()> {
		let name = path::normalize(name);
		let mut outbox = Outbox::default();
		let targets = {
			let mut inner = self.lock();
			path::set(&mut inner.values, &name, value.clone());

			let targets = if inner.names.array.contains(&name) {
				let len = value.as_array().map_or(0, Vec::len);
				inner.arrays.insert(name.clone(), ArrayRows::fresh(len));
				outbox.array(Some(&name), &inner.values);
				if options.should_dirty
					&& (inner.interest.is_dirty || inner.interest.dirty_fields)
				{
					let update = FormStateUpdate {
						is_dirty: Some(inner.compute_is_dirty()),
						dirty_fields: Some(differ::dirty_fields(
							&inner.values,
							&inner.default_values,
						)),
						..FormStateUpdate::named(&name)
					};
					inner.emit(&mut outbox, update);
				}
				vec![name.clone()]
			} else {
				let leaves: Vec<_> = inner.fields.under(&name).cloned().collect();
				for field in &leaves {
					let leaf_value = inner.value_at(field.name());
					for handle in field.handles() {
						outbox.set_value(handle.clone(), leaf_value.clone());
					}
					if options.should_dirty || options.should_touch {
						let update = inner.update_touch_and_dirty(
							field.name(),
							&leaf_value,
							options.should_touch,
							options.should_dirty,
						);
						if let Some(update) = update {
							inner.emit(&mut outbox, update);
						}
					}
				}
				if leaves.is_empty() {
					vec![name.clone()]
				} else {
					leaves.iter().map(|f| f.name().to_string()).collect()
				}
			};

			if inner.names.is_watched(&name, false) {
				let snapshot = FormStateUpdate::snapshot(&inner.state);
				inner.emit(&mut outbox, snapshot);
			}
			outbox.watch(Some(&name), None, &inner.values);
			targets
		};
		tracing::trace!(field = %name, validate = options.should_validate, "value set");
		self.publish(outbox);

		if options.should_validate {
			let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
			self.trigger(&targets).await?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::options::FormOptions;
	use crate::rules::RegisterOptions;
	use crate::state::StateInterest;
	use rstest::rstest;
	use serde_json::json;
	use std::sync::{Arc, Mutex};

	#[rstest]
	#[case::all(vec![], json!({"a": 1, "b": {"c": 2}}))]
	#[case::single(vec!["b.c"], json!(2))]
	#[case::many(vec!["a", "missing"], json!([1, null]))]
	fn test_select_shapes(#[case] names: Vec<&str>, #[case] expected: Value) {
		let values = json!({"a": 1, "b": {"c": 2}});
		let names: Vec<String> = names.into_iter().map(String::from).collect();

		assert_eq!(select(&values, &names), expected);
	}

	#[rstest]
	#[tokio::test]
	async fn test_set_value_marks_dirty_and_touched() {
		// Arrange
		let form = FormControl::new(FormOptions::new().with_default_values(json!({"name": "a"})));
		form.declare_interest(StateInterest::all());
		form.register("name", RegisterOptions::new());

		// Act
		form.set_value("name", json!("b"), SetValueOptions::new().dirty().touch())
			.await
			.unwrap();

		// Assert
		let state = form.form_state();
		assert_eq!(form.get_value("name"), json!("b"));
		assert!(state.is_dirty);
		assert_eq!(state.dirty_fields, json!({"name": true}));
		assert_eq!(state.touched_fields, json!({"name": true}));
	}

	#[rstest]
	#[tokio::test]
	async fn test_set_value_tolerates_index_out_of_reach() {
		// Arrange
		let form = FormControl::new(FormOptions::new().with_default_values(json!({"a": [0]})));
		form.declare_interest(StateInterest::all());

		// Act
		let result = form
			.set_value(
				"a.18446744073709551615",
				json!(1),
				SetValueOptions::new().dirty().touch(),
			)
			.await;

		// Assert
		assert!(result.is_ok());
		assert_eq!(form.get_value("a"), json!([0]));
		assert_eq!(form.get_value("a.18446744073709551615"), Value::Null);
	}

	#[rstest]
	#[tokio::test]
	async fn test_set_value_over_group_reaches_each_field() {
		// Arrange
		let form = FormControl::new(FormOptions::new());
		form.declare_interest(StateInterest::all());
		form.register("address.city", RegisterOptions::new());
		form.register("address.zip", RegisterOptions::new());

		// Act
		form.set_value(
			"address",
			json!({"city": "Paris", "zip": "75001"}),
			SetValueOptions::new().dirty(),
		)
		.await
		.unwrap();

		// Assert
		assert_eq!(
			form.form_state().dirty_fields,
			json!({"address": {"city": true, "zip": true}})
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_set_value_validates_when_asked() {
		// Arrange
		let form = FormControl::new(FormOptions::new());
		form.register("name", RegisterOptions::new().with_required("required"));

		// Act
		form.set_value("name", json!(""), SetValueOptions::new().validate())
			.await
			.unwrap();

		// Assert
		assert!(form.form_state().errors.contains("name"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_set_value_publishes_watch_payload() {
		// Arrange
		let form = FormControl::new(FormOptions::new());
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		let _subscription = form.watch_fields(vec!["name".into()], false, move |payload, value| {
			sink.lock().unwrap().push((payload.name.clone(), value));
		});

		// Act
		form.set_value("name", json!("x"), SetValueOptions::new()).await.unwrap();
		form.set_value("other", json!("y"), SetValueOptions::new()).await.unwrap();

		// Assert
		assert_eq!(
			*seen.lock().unwrap(),
			vec![(Some("name".to_string()), json!("x"))]
		);
	}

	#[rstest]
	fn test_watch_registers_paths() {
		let form = FormControl::new(FormOptions::new().with_default_values(json!({"a": 1})));

		let value = form.watch(&["a"]);
		let all = form.watch(&[]);

		assert_eq!(value, json!(1));
		assert_eq!(all, json!({"a": 1}));
		let inner = form.lock();
		assert!(inner.names.watch.contains("a"));
		assert!(inner.names.watch_all);
	}
}
