//! Resolver-driven validation and delayed error display
//!
//! Covers forms validated by a whole-form resolver, cross-field `deps`, and
//! the delay applied before a new error becomes visible.

use reinhardt_form_core::{
	ErrorMap, FieldError, FormControl, FormError, FormOptions, RegisterOptions, ResolverOutput,
	StateInterest, StateKey, ValidateFn, ValidationMode, resolver_fn,
};
use rstest::*;
use serde_json::{Value, json};
use std::time::Duration;

// =============================================================================
// Fixtures
// =============================================================================

/// Trims the name and requires an `@` in the email
#[fixture]
fn resolved_form() -> FormControl {
	let resolver = resolver_fn(|mut values: Value, _context, _options| {
		if let Some(name) = values["name"].as_str().map(|name| name.trim().to_string()) {
			values["name"] = json!(name);
		}
		let mut errors = ErrorMap::new();
		if values["email"].as_str().is_none_or(|email| !email.contains('@')) {
			errors.insert("email", FieldError::new("pattern", "Invalid email"));
		}
		Ok(ResolverOutput { values, errors })
	});
	FormControl::new(
		FormOptions::new()
			.with_mode(ValidationMode::OnChange)
			.with_default_values(json!({"name": "", "email": ""}))
			.with_resolver(resolver),
	)
}

// =============================================================================
// Resolver
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_resolver_errors_surface_on_change(resolved_form: FormControl) {
	// Arrange
	let email = resolved_form.register("email", RegisterOptions::new());

	// Act
	email.on_change(json!("nope")).await.unwrap();
	let invalid = resolved_form.get_field_state("email");
	email.on_change(json!("ada@example.com")).await.unwrap();

	// Assert
	assert!(invalid.invalid);
	assert!(!resolved_form.get_field_state("email").invalid);
}

#[rstest]
#[tokio::test]
async fn test_submit_receives_resolver_values(resolved_form: FormControl) {
	// Arrange
	let name = resolved_form.register("name", RegisterOptions::new());
	let email = resolved_form.register("email", RegisterOptions::new());
	name.on_change(json!("  Ada  ")).await.unwrap();
	email.on_change(json!("ada@example.com")).await.unwrap();

	// Act
	let mut submitted = None;
	resolved_form
		.handle_valid_submit(|values| {
			submitted = Some(values);
			async { Ok::<_, anyhow::Error>(()) }
		})
		.await
		.unwrap();

	// Assert
	assert_eq!(submitted, Some(json!({"name": "Ada", "email": "ada@example.com"})));
	assert_eq!(resolved_form.get_value("name"), json!("  Ada  "));
}

#[rstest]
#[tokio::test]
async fn test_trigger_on_one_field_keeps_other_resolver_errors(resolved_form: FormControl) {
	// Arrange
	resolved_form.register("name", RegisterOptions::new());
	resolved_form.register("email", RegisterOptions::new());
	resolved_form.set_error("name", FieldError::new("server", "Taken"), Default::default());

	// Act
	let valid = resolved_form.trigger(&["email"]).await.unwrap();

	// Assert
	let errors = resolved_form.form_state().errors;
	assert!(!valid);
	assert!(errors.contains("email"));
	assert!(errors.contains("name"));
}

#[rstest]
#[tokio::test]
async fn test_failing_resolver_is_reported_and_clears_validating() {
	// Arrange
	let form = FormControl::new(
		FormOptions::new()
			.with_resolver(resolver_fn(|_, _, _| anyhow::bail!("schema unavailable"))),
	);
	form.declare_interest(StateInterest::new().with(StateKey::IsValidating));
	form.register("name", RegisterOptions::new());

	// Act
	let result = form.trigger(&["name"]).await;

	// Assert
	assert!(matches!(result, Err(FormError::Resolver(_))));
	assert!(!form.form_state().is_validating);
}

// =============================================================================
// Dependent fields
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_confirmation_revalidated_when_password_changes() {
	// Arrange
	let form = FormControl::new(
		FormOptions::new()
			.with_mode(ValidationMode::OnChange)
			.with_default_values(json!({"password": "", "confirm": ""})),
	);
	let password = form.register("password", RegisterOptions::new().with_deps(["confirm"]));
	let confirm = form.register(
		"confirm",
		RegisterOptions::new().with_validate(ValidateFn::new(|value, values| {
			(value != &values["password"]).then(|| "Passwords differ".to_string())
		})),
	);
	password.on_change(json!("secret")).await.unwrap();
	confirm.on_change(json!("secret")).await.unwrap();

	// Act
	password.on_change(json!("changed")).await.unwrap();

	// Assert
	assert_eq!(
		form.get_field_state("confirm").error.map(|e| e.message),
		Some("Passwords differ".to_string())
	);
}

// =============================================================================
// Delayed errors
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_delayed_error_appears_after_delay() {
	// Arrange
	let form = FormControl::new(
		FormOptions::new()
			.with_mode(ValidationMode::OnChange)
			.with_delay_error(Duration::from_millis(40))
			.with_default_values(json!({"name": "x"})),
	);
	let name = form.register("name", RegisterOptions::new().with_required("required"));

	// Act
	name.on_change(json!("")).await.unwrap();
	let immediately = form.form_state().errors.contains("name");
	tokio::time::sleep(Duration::from_millis(150)).await;

	// Assert
	assert!(!immediately);
	assert!(form.form_state().errors.contains("name"));
}

#[rstest]
#[tokio::test]
async fn test_fixing_value_before_delay_never_shows_error() {
	// Arrange
	let form = FormControl::new(
		FormOptions::new()
			.with_mode(ValidationMode::OnChange)
			.with_delay_error(Duration::from_millis(40))
			.with_default_values(json!({"name": "x"})),
	);
	let name = form.register("name", RegisterOptions::new().with_required("required"));

	// Act
	name.on_change(json!("")).await.unwrap();
	name.on_change(json!("fixed")).await.unwrap();
	tokio::time::sleep(Duration::from_millis(150)).await;

	// Assert
	assert!(form.form_state().errors.is_empty());
}
