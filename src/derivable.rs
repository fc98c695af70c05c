/// A stage given either directly or as a thunk producing it.
///
/// Composition operators resolve each argument exactly once, when the
/// composed stage is built.
pub enum Derivable<T> {
	Value(T),
	Derive(Box<dyn FnOnce() -> T + Send>),
}

impl<T> Derivable<T> {
	pub fn derive(thunk: impl FnOnce() -> T + Send + 'static) -> Self {
		Self::Derive(Box::new(thunk))
	}

	pub fn resolve(self) -> T {
		match self {
			Self::Value(value) => value,
			Self::Derive(thunk) => thunk(),
		}
	}
}

impl<T> From<T> for Derivable<T> {
	fn from(value: T) -> Self {
		Self::Value(value)
	}
}

/// Resolve every entry of a derivable list in order.
pub(crate) fn resolve_all<T, I>(entries: I) -> Vec<T>
where
	I: IntoIterator,
	I::Item: Into<Derivable<T>>,
{
	entries.into_iter().map(|entry| entry.into().resolve()).collect()
}
