//! Field array use case tests
//!
//! A todo list bound to a field array: rows are added, reordered and removed
//! while row fields keep their values, errors and keys.

use reinhardt_form_core::{
	ArrayPayload, FieldArray, FieldArrayOptions, FocusOptions, FormControl, FormOptions,
	RegisterOptions, StableKey, StateInterest, ValidationMode,
};
use rstest::*;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

// =============================================================================
// Fixtures
// =============================================================================

fn todo(title: &str) -> Value {
	json!({"title": title, "done": false})
}

#[fixture]
fn todo_form() -> FormControl {
	let form = FormControl::new(
		FormOptions::new()
			.with_mode(ValidationMode::OnChange)
			.with_default_values(json!({"todos": []})),
	);
	form.declare_interest(StateInterest::all());
	form
}

async fn with_three(form: &FormControl) -> (FieldArray, Vec<StableKey>) {
	let todos = form.field_array("todos", FieldArrayOptions::default());
	todos
		.append(vec![todo("a"), todo("b"), todo("c")], FocusOptions::none())
		.await
		.unwrap();
	let keys = todos.keys();
	(todos, keys)
}

// =============================================================================
// Row identity
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_remove_middle_row_keeps_neighbour_keys(todo_form: FormControl) {
	// Arrange
	let (todos, keys) = with_three(&todo_form).await;

	// Act
	todos.remove(&[1]).await.unwrap();

	// Assert
	assert_eq!(todos.keys(), vec![keys[0], keys[2]]);
	assert_eq!(
		todo_form.get_value("todos"),
		json!([todo("a"), todo("c")])
	);
}

#[rstest]
#[case(0, 2, vec![2, 1, 0])]
#[case(1, 2, vec![0, 2, 1])]
#[case(2, 2, vec![0, 1, 2])]
#[tokio::test]
async fn test_swap_exchanges_rows_and_keys(
	todo_form: FormControl,
	#[case] a: usize,
	#[case] b: usize,
	#[case] expected: Vec<usize>,
) {
	// Arrange
	let (todos, keys) = with_three(&todo_form).await;
	let titles = ["a", "b", "c"];

	// Act
	todos.swap(a, b).await.unwrap();

	// Assert
	let rows = todos.fields();
	assert_eq!(
		rows.iter().map(|row| row.key).collect::<Vec<_>>(),
		expected.iter().map(|&i| keys[i]).collect::<Vec<_>>()
	);
	assert_eq!(
		rows.iter().map(|row| row.value.clone()).collect::<Vec<_>>(),
		expected.iter().map(|&i| todo(titles[i])).collect::<Vec<_>>()
	);
}

#[rstest]
#[tokio::test]
async fn test_move_to_front_reorders_keys(todo_form: FormControl) {
	// Arrange
	let (todos, keys) = with_three(&todo_form).await;

	// Act
	todos.move_item(2, 0).await.unwrap();

	// Assert
	assert_eq!(todos.keys(), vec![keys[2], keys[0], keys[1]]);
}

#[rstest]
#[tokio::test]
async fn test_reset_issues_fresh_keys(todo_form: FormControl) {
	// Arrange
	let (todos, keys) = with_three(&todo_form).await;

	// Act
	todo_form
		.reset(Some(json!({"todos": [todo("x")]})), Default::default())
		.await
		.unwrap();

	// Assert
	let after = todos.keys();
	assert_eq!(after.len(), 1);
	assert!(!keys.contains(&after[0]));
}

// =============================================================================
// Row fields
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_row_error_follows_row_through_prepend(todo_form: FormControl) {
	// Arrange
	let (todos, _) = with_three(&todo_form).await;
	let title = todo_form.register(
		"todos.1.title",
		RegisterOptions::new().with_required("Title required"),
	);
	title.on_change(json!("")).await.unwrap();

	// Act
	todos.prepend(vec![todo("first")], FocusOptions::none()).await.unwrap();

	// Assert
	let errors = todo_form.form_state().errors;
	assert!(errors.contains("todos.2.title"));
	assert!(!errors.contains("todos.1.title"));
}

#[rstest]
#[tokio::test]
async fn test_appending_makes_form_dirty_and_removal_restores(todo_form: FormControl) {
	// Arrange
	let todos = todo_form.field_array("todos", FieldArrayOptions::default());

	// Act
	todos.append(vec![todo("a")], FocusOptions::none()).await.unwrap();
	let dirty_after_append = todo_form.form_state().is_dirty;
	todos.remove_all().await.unwrap();

	// Assert
	assert!(dirty_after_append);
	assert!(!todo_form.form_state().is_dirty);
	assert!(todos.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_update_keeps_key_and_replace_regenerates(todo_form: FormControl) {
	// Arrange
	let (todos, keys) = with_three(&todo_form).await;

	// Act
	todos.update(0, todo("edited")).await.unwrap();
	let after_update = todos.keys();
	todos.replace(vec![todo("only")]).await.unwrap();

	// Assert
	assert_eq!(after_update, keys);
	assert_eq!(todos.len(), 1);
	assert!(!keys.contains(&todos.keys()[0]));
	assert_eq!(todo_form.get_value("todos.0.title"), json!("only"));
}

// =============================================================================
// Notifications
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_array_channel_announces_each_operation(todo_form: FormControl) {
	// Arrange
	let (todos, _) = with_three(&todo_form).await;
	let seen: Arc<Mutex<Vec<ArrayPayload>>> = Arc::default();
	let sink = Arc::clone(&seen);
	let _subscription = todo_form
		.subjects()
		.array
		.subscribe(move |payload: &ArrayPayload| sink.lock().unwrap().push(payload.clone()));

	// Act
	todos.swap(0, 1).await.unwrap();
	todos.remove(&[2]).await.unwrap();

	// Assert
	let seen = seen.lock().unwrap();
	assert_eq!(seen.len(), 2);
	assert!(seen.iter().all(|payload| payload.name.as_deref() == Some("todos")));
	assert_eq!(
		seen[1].values.pointer("/todos").cloned(),
		Some(json!([todo("b"), todo("a")]))
	);
}

#[rstest]
#[tokio::test]
async fn test_min_length_on_array_reported_at_root(todo_form: FormControl) {
	// Arrange
	let todos = todo_form.field_array(
		"todos",
		FieldArrayOptions {
			rules: Some(RegisterOptions::new().with_min_length((2, "Add two todos"))),
			..Default::default()
		},
	);
	todos.append(vec![todo("a")], FocusOptions::none()).await.unwrap();

	// Act
	let valid = todo_form.trigger(&["todos"]).await.unwrap();

	// Assert
	assert!(!valid);
	let errors = todo_form.form_state().errors;
	assert_eq!(
		errors.get("todos.root").map(|e| e.message.as_str()),
		Some("Add two todos")
	);
}
