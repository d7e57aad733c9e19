//! Field registry and names registry

use crate::handle::{HandleRef, same_handle};
use crate::rules::RegisterOptions;
use indexmap::{IndexMap, IndexSet};
use reinhardt_form_signals::is_path_prefix;
use std::fmt;

/// Registration record of one field
#[derive(Clone)]
pub struct FieldDescriptor {
	name: String,
	options: RegisterOptions,
	handle: Option<HandleRef>,
	refs: Vec<HandleRef>,
	mount: bool,
}

impl FieldDescriptor {
	pub fn new(name: impl Into<String>, options: RegisterOptions) -> Self {
		Self {
			name: name.into(),
			options,
			handle: None,
			refs: Vec::new(),
			mount: true,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn options(&self) -> &RegisterOptions {
		&self.options
	}

	pub fn is_mounted(&self) -> bool {
		self.mount
	}

	/// Handle of a single-input field
	pub fn handle(&self) -> Option<&HandleRef> {
		self.handle.as_ref()
	}

	/// Handles of a radio/checkbox group
	pub fn refs(&self) -> &[HandleRef] {
		&self.refs
	}

	/// First group handle, or the single handle
	pub fn primary_handle(&self) -> Option<&HandleRef> {
		self.refs.first().or(self.handle.as_ref())
	}

	/// Every attached handle
	pub(crate) fn handles(&self) -> impl Iterator<Item = &HandleRef> {
		self.handle.iter().chain(self.refs.iter())
	}

	pub(crate) fn set_mount(&mut self, mount: bool) {
		self.mount = mount;
	}

	pub(crate) fn set_options(&mut self, options: RegisterOptions) {
		self.options = options;
	}

	pub(crate) fn rename(&mut self, name: String) {
		self.name = name;
	}

	/// Attach a live handle; returns `false` when it was already attached
	///
	/// Group inputs accumulate handles, dropping disconnected ones. Other
	/// inputs replace their handle.
	pub(crate) fn attach(&mut self, handle: HandleRef) -> bool {
		if self.options.kind.is_group() {
			if self.refs.iter().any(|h| same_handle(h, &handle)) {
				return false;
			}
			self.refs.retain(|h| h.is_connected());
			self.refs.push(handle);
			true
		} else {
			if self.handle.as_ref().is_some_and(|h| same_handle(h, &handle)) {
				return false;
			}
			self.handle = Some(handle);
			true
		}
	}

	/// Whether every attached handle reports itself disconnected
	pub(crate) fn is_detached(&self) -> bool {
		if self.options.kind.is_group() {
			self.refs.iter().all(|h| !h.is_connected())
		} else {
			self.handle.as_ref().is_none_or(|h| !h.is_connected())
		}
	}
}

impl fmt::Debug for FieldDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldDescriptor")
			.field("name", &self.name)
			.field("options", &self.options)
			.field("has_handle", &self.handle.is_some())
			.field("refs", &self.refs.len())
			.field("mount", &self.mount)
			.finish()
	}
}

/// Path to descriptor mapping in registration order
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
	fields: IndexMap<String, FieldDescriptor>,
}

impl FieldRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
		self.fields.get(name)
	}

	pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut FieldDescriptor> {
		self.fields.get_mut(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.fields.contains_key(name)
	}

	/// Whether fields are registered strictly below `name`
	pub fn has_descendants(&self, name: &str) -> bool {
		self.fields
			.keys()
			.any(|key| key != name && is_path_prefix(name, key))
	}

	/// Create or update the descriptor; returns whether it is new
	pub(crate) fn upsert(&mut self, name: &str, options: RegisterOptions) -> bool {
		match self.fields.get_mut(name) {
			Some(field) => {
				field.set_options(options);
				field.set_mount(true);
				false
			}
			None => {
				self.fields
					.insert(name.to_string(), FieldDescriptor::new(name, options));
				true
			}
		}
	}

	/// Remove `name` and every field below it
	pub(crate) fn remove_tree(&mut self, name: &str) -> usize {
		let before = self.fields.len();
		self.fields.retain(|key, _| !is_path_prefix(name, key));
		before - self.fields.len()
	}

	/// Descriptors at or below `name`, in registration order
	pub fn under<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldDescriptor> + 'a {
		self.fields
			.iter()
			.filter(move |(key, _)| is_path_prefix(name, key))
			.map(|(_, field)| field)
	}

	pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
		self.fields.values()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.fields.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// Move row descriptors of a field array through an index mapping
	pub(crate) fn remap_rows(&mut self, array: &str, map: impl Fn(usize) -> Option<usize>) {
		let fields = std::mem::take(&mut self.fields);
		for (key, mut field) in fields {
			match crate::path::split_index(&key, array) {
				None => {
					self.fields.insert(key, field);
				}
				Some((index, rest)) => {
					if let Some(target) = map(index) {
						let renamed = if rest.is_empty() {
							format!("{array}.{target}")
						} else {
							format!("{array}.{target}.{rest}")
						};
						field.rename(renamed.clone());
						self.fields.insert(renamed, field);
					}
				}
			}
		}
	}
}

/// Sets of paths the store tracks besides descriptors
#[derive(Debug, Clone, Default)]
pub struct Names {
	/// Attached fields, in mount order
	pub mount: IndexSet<String>,
	/// Detached fields awaiting the unregister sweep
	pub un_mount: IndexSet<String>,
	/// Field-array roots
	pub array: IndexSet<String>,
	/// Narrowly watched paths
	pub watch: IndexSet<String>,
	pub watch_all: bool,
	/// Prefix of the field to focus after the next array action
	pub focus: Option<String>,
}

impl Names {
	/// Whether a change at `name` concerns a watcher
	pub fn is_watched(&self, name: &str, is_blur: bool) -> bool {
		!is_blur && (self.watch_all || self.watch.iter().any(|w| is_path_prefix(w, name)))
	}

	/// Whether `name` lives inside a registered field array
	pub fn is_in_field_array(&self, name: &str) -> bool {
		crate::path::array_parent(name).is_some_and(|parent| self.array.contains(&parent))
	}
}
