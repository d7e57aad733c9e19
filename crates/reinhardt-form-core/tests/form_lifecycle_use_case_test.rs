//! End-to-end form lifecycle tests
//!
//! Exercises registration, field events, submission and reset together the
//! way a binding layer drives a form.

use reinhardt_form_core::{
	ErrorMap, FieldHandle, FormControl, FormOptions, FormStateUpdate, HandleRef, RegisterOptions,
	ResetOptions, StateInterest, StateKey, StateSubscription, UnregisterOptions, ValidationMode,
};
use rstest::*;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Default)]
struct TextInput {
	focused: AtomicUsize,
	value: Mutex<Option<Value>>,
}

impl FieldHandle for TextInput {
	fn focus(&self) {
		self.focused.fetch_add(1, Ordering::SeqCst);
	}

	fn set_value(&self, value: &Value) {
		*self.value.lock().unwrap() = Some(value.clone());
	}
}

#[fixture]
fn signup_form() -> FormControl {
	FormControl::new(
		FormOptions::new()
			.with_mode(ValidationMode::OnChange)
			.with_default_values(json!({"name": "", "email": "", "age": null})),
	)
}

fn register_signup(form: &FormControl) {
	form.register("name", RegisterOptions::new().with_required("Name is required"));
	form.register(
		"email",
		RegisterOptions::new()
			.with_required("Email is required")
			.with_pattern((regex::Regex::new(r"^\S+@\S+$").unwrap(), "Invalid email")),
	);
	form.register("age", RegisterOptions::new().with_min((18, "Too young")));
}

// =============================================================================
// Field events
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_required_error_appears_then_clears(signup_form: FormControl) {
	// Arrange
	let name =
		signup_form.register("name", RegisterOptions::new().with_required("Name is required"));

	// Act
	name.on_change(json!("")).await.unwrap();
	let error = signup_form.get_field_state("name").error;
	name.on_change(json!("Ada")).await.unwrap();

	// Assert
	assert_eq!(error.map(|e| e.message), Some("Name is required".to_string()));
	assert!(signup_form.get_field_state("name").error.is_none());
	assert!(!signup_form.get_field_state("name").invalid);
}

#[rstest]
#[tokio::test]
async fn test_dirty_tracks_default_comparison(signup_form: FormControl) {
	// Arrange
	signup_form.declare_interest(
		StateInterest::new()
			.with(StateKey::IsDirty)
			.with(StateKey::DirtyFields),
	);
	let name = signup_form.register("name", RegisterOptions::new());

	// Act
	name.on_change(json!("Ada")).await.unwrap();
	let dirty = signup_form.form_state();
	name.on_change(json!("")).await.unwrap();

	// Assert
	assert!(dirty.is_dirty);
	assert_eq!(dirty.dirty_fields, json!({"name": true}));
	assert!(!signup_form.form_state().is_dirty);
	assert_eq!(signup_form.form_state().dirty_fields, json!({}));
}

// =============================================================================
// Submission
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_invalid_submission_focuses_first_error(signup_form: FormControl) {
	// Arrange
	register_signup(&signup_form);
	let name_input = Arc::new(TextInput::default());
	let email_input = Arc::new(TextInput::default());
	signup_form
		.register("name", RegisterOptions::new().with_required("Name is required"))
		.attach(Some(name_input.clone() as HandleRef));
	signup_form
		.register("email", RegisterOptions::new().with_required("Email is required"))
		.attach(Some(email_input.clone() as HandleRef));
	let reported = Arc::new(Mutex::new(ErrorMap::new()));
	let sink = Arc::clone(&reported);

	// Act
	let result = signup_form
		.handle_submit(
			|_| async { Ok::<_, anyhow::Error>(()) },
			move |errors| async move {
				*sink.lock().unwrap() = errors;
				Ok::<_, anyhow::Error>(())
			},
		)
		.await;

	// Assert
	assert!(result.is_ok());
	let reported = reported.lock().unwrap();
	assert!(reported.contains("name"));
	assert!(reported.contains("email"));
	assert!(!reported.contains("age"));
	assert_eq!(name_input.focused.load(Ordering::SeqCst), 1);
	assert_eq!(email_input.focused.load(Ordering::SeqCst), 0);
	let state = signup_form.form_state();
	assert_eq!(state.submit_count, 1);
	assert!(!state.is_submit_successful);
}

#[rstest]
#[tokio::test]
async fn test_valid_submission_receives_exact_values(signup_form: FormControl) {
	// Arrange
	register_signup(&signup_form);
	let name =
		signup_form.register("name", RegisterOptions::new().with_required("Name is required"));
	let email =
		signup_form.register("email", RegisterOptions::new().with_required("Email is required"));
	let age = signup_form.register("age", RegisterOptions::new().with_min((18, "Too young")));
	name.on_change(json!("Ada")).await.unwrap();
	email.on_change(json!("ada@example.com")).await.unwrap();
	age.on_change(json!(36)).await.unwrap();

	// Act
	let mut received = None;
	signup_form
		.handle_valid_submit(|values| {
			received = Some(values);
			async { Ok::<_, anyhow::Error>(()) }
		})
		.await
		.unwrap();

	// Assert
	assert_eq!(
		received,
		Some(json!({"name": "Ada", "email": "ada@example.com", "age": 36}))
	);
	assert!(signup_form.form_state().is_submit_successful);
}

#[rstest]
#[tokio::test]
async fn test_revalidate_mode_applies_after_submission() {
	// Arrange
	let form = FormControl::new(FormOptions::new().with_default_values(json!({"name": ""})));
	let name = form.register("name", RegisterOptions::new().with_required("required"));

	// Act
	name.on_change(json!("")).await.unwrap();
	let before_submit = form.form_state().errors.len();
	form.handle_valid_submit(|_| async { Ok::<_, anyhow::Error>(()) })
		.await
		.unwrap();
	name.on_change(json!("fixed")).await.unwrap();

	// Assert
	assert_eq!(before_submit, 0);
	assert!(form.form_state().errors.is_empty());
	assert!(form.form_state().is_submitted);
}

// =============================================================================
// Reset and unregister
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_reset_clears_everything_and_pushes_values_to_inputs(signup_form: FormControl) {
	// Arrange
	signup_form.declare_interest(StateInterest::all());
	let input = Arc::new(TextInput::default());
	let name = signup_form.register("name", RegisterOptions::new().with_required("required"));
	name.attach(Some(input.clone() as HandleRef));
	name.on_change(json!("")).await.unwrap();
	name.on_blur().await.unwrap();
	name.on_change(json!("typed")).await.unwrap();

	// Act
	signup_form.reset(None, ResetOptions::default()).await.unwrap();

	// Assert
	let state = signup_form.form_state();
	assert_eq!(signup_form.get_value("name"), json!(""));
	assert!(!state.is_dirty);
	assert_eq!(state.touched_fields, json!({}));
	assert!(state.errors.is_empty());
	assert_eq!(state.submit_count, 0);
	assert_eq!(*input.value.lock().unwrap(), Some(json!("")));
}

#[rstest]
#[tokio::test]
async fn test_unregister_removes_field_from_submission(signup_form: FormControl) {
	// Arrange
	register_signup(&signup_form);

	// Act
	signup_form
		.unregister(&["email", "age"], UnregisterOptions::default())
		.await
		.unwrap();
	let mut received = None;
	let result = signup_form
		.handle_submit(
			|values| {
				received = Some(values);
				async { Ok::<_, anyhow::Error>(()) }
			},
			|_| async { Ok::<_, anyhow::Error>(()) },
		)
		.await;

	// Assert
	assert!(result.is_ok());
	assert!(received.is_none());
	let errors = signup_form.form_state().errors;
	assert_eq!(errors.paths().collect::<Vec<_>>(), vec!["name"]);
	assert_eq!(signup_form.get_values(), json!({"name": ""}));
}

// =============================================================================
// Notifications
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_subscriber_sees_only_relevant_deltas(signup_form: FormControl) {
	// Arrange
	let name = signup_form.register("name", RegisterOptions::new().with_required("required"));
	let email = signup_form.register("email", RegisterOptions::new().with_required("required"));
	let seen: Arc<Mutex<Vec<FormStateUpdate>>> = Arc::default();
	let sink = Arc::clone(&seen);
	let _subscription = signup_form.subscribe_form_state(
		StateSubscription::new(StateInterest::new().with(StateKey::Errors)).with_names(["email"]),
		move |update| sink.lock().unwrap().push(update.clone()),
	);

	// Act
	name.on_change(json!("")).await.unwrap();
	email.on_change(json!("")).await.unwrap();

	// Assert
	let seen = seen.lock().unwrap();
	assert!(!seen.is_empty());
	assert!(
		seen.iter()
			.all(|update| update.name.as_deref().is_none_or(|name| name == "email"))
	);
	assert!(
		seen.iter()
			.any(|update| update.errors.as_ref().is_some_and(|errors| errors.contains("email")))
	);
}

#[rstest]
#[tokio::test]
async fn test_observer_may_reenter_control(signup_form: FormControl) {
	// Arrange
	let name = signup_form.register("name", RegisterOptions::new());
	let reader = signup_form.clone();
	let snapshots = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&snapshots);
	let _subscription = signup_form.watch_fields(vec!["name".into()], false, move |_, _| {
		sink.lock().unwrap().push(reader.get_value("name"));
	});

	// Act
	name.on_change(json!("x")).await.unwrap();

	// Assert
	assert_eq!(*snapshots.lock().unwrap(), vec![json!("x")]);
}
