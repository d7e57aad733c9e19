//! Validation trigger policies

use serde::{Deserialize, Serialize};

/// When field events validate before the first submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
	OnBlur,
	OnChange,
	#[default]
	OnSubmit,
	/// First blur, then every change
	OnTouched,
	All,
}

/// When field events validate after the first submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReValidateMode {
	OnBlur,
	#[default]
	OnChange,
	OnSubmit,
}

/// Stop at the first failing rule per field, or collect all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CriteriaMode {
	#[default]
	FirstError,
	All,
}

impl From<ReValidateMode> for ValidationMode {
	fn from(mode: ReValidateMode) -> Self {
		match mode {
			ReValidateMode::OnBlur => Self::OnBlur,
			ReValidateMode::OnChange => Self::OnChange,
			ReValidateMode::OnSubmit => Self::OnSubmit,
		}
	}
}

/// Whether a field event should skip validation
///
/// Before submission `mode` applies; afterwards `re_validate_mode` does.
///
/// # Examples
///
/// ```
/// use reinhardt_form_core::mode::{skip_validation, FieldEventKind, ReValidateMode, ValidationMode};
///
/// let change = FieldEventKind { is_blur: false, is_touched: false, is_submitted: false };
/// assert!(skip_validation(change, ValidationMode::OnSubmit, ReValidateMode::OnChange));
/// assert!(!skip_validation(change, ValidationMode::OnChange, ReValidateMode::OnChange));
///
/// let after_submit = FieldEventKind { is_submitted: true, ..change };
/// assert!(!skip_validation(after_submit, ValidationMode::OnSubmit, ReValidateMode::OnChange));
/// ```
pub fn skip_validation(
	event: FieldEventKind,
	mode: ValidationMode,
	re_validate_mode: ReValidateMode,
) -> bool {
	if mode == ValidationMode::All {
		return false;
	}
	if !event.is_submitted && mode == ValidationMode::OnTouched {
		return !(event.is_touched || event.is_blur);
	}
	let effective = if event.is_submitted {
		ValidationMode::from(re_validate_mode)
	} else {
		mode
	};
	match effective {
		ValidationMode::OnBlur => !event.is_blur,
		ValidationMode::OnChange => event.is_blur,
		_ => true,
	}
}

/// Facts about a field event relevant to [`skip_validation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldEventKind {
	pub is_blur: bool,
	/// The field was touched before this event
	pub is_touched: bool,
	pub is_submitted: bool,
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(ValidationMode::All, ReValidateMode::OnSubmit, false, false, false, false)]
	#[case(ValidationMode::OnBlur, ReValidateMode::OnChange, false, false, false, true)]
	#[case(ValidationMode::OnBlur, ReValidateMode::OnChange, true, false, false, false)]
	#[case(ValidationMode::OnChange, ReValidateMode::OnChange, false, false, false, false)]
	#[case(ValidationMode::OnChange, ReValidateMode::OnChange, true, false, false, true)]
	#[case(ValidationMode::OnTouched, ReValidateMode::OnChange, false, false, false, true)]
	#[case(ValidationMode::OnTouched, ReValidateMode::OnChange, false, true, false, false)]
	#[case(ValidationMode::OnTouched, ReValidateMode::OnChange, true, false, false, false)]
	#[case(ValidationMode::OnSubmit, ReValidateMode::OnChange, false, false, false, true)]
	#[case(ValidationMode::OnSubmit, ReValidateMode::OnChange, false, false, true, false)]
	#[case(ValidationMode::OnSubmit, ReValidateMode::OnBlur, false, false, true, true)]
	#[case(ValidationMode::OnSubmit, ReValidateMode::OnBlur, true, false, true, false)]
	#[case(ValidationMode::OnChange, ReValidateMode::OnSubmit, false, false, true, true)]
	fn test_skip_validation(
		#[case] mode: ValidationMode,
		#[case] re_validate_mode: ReValidateMode,
		#[case] is_blur: bool,
		#[case] is_touched: bool,
		#[case] is_submitted: bool,
		#[case] expected: bool,
	) {
		let event = FieldEventKind {
			is_blur,
			is_touched,
			is_submitted,
		};

		assert_eq!(skip_validation(event, mode, re_validate_mode), expected);
	}

	#[rstest]
	fn test_modes_deserialize_from_camel_case() {
		let mode: ValidationMode = serde_json::from_str("\"onTouched\"").unwrap();
		let criteria: CriteriaMode = serde_json::from_str("\"firstError\"").unwrap();

		assert_eq!(mode, ValidationMode::OnTouched);
		assert_eq!(criteria, CriteriaMode::FirstError);
	}
}
