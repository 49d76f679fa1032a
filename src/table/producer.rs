use crate::error::BoxError;
use std::fmt;
use std::sync::Arc;

/// Produces the replacement text for one match occurrence.
///
/// Invoked lazily, once per match, with the identifier of the text being
/// processed (usually a file path).
pub trait ValueProducer: Send + Sync {
	fn produce(&self, context_id: &str) -> Result<String, BoxError>;
}

impl<F> ValueProducer for F
where
	F: Fn(&str) -> Result<String, BoxError> + Send + Sync,
{
	fn produce(&self, context_id: &str) -> Result<String, BoxError> {
		self(context_id)
	}
}

/// A literal configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
	String(String),
	Integer(i64),
	Float(f64),
	Boolean(bool),
}

impl Literal {
	/// The text substituted into the output for this literal.
	pub fn display(&self) -> String {
		match self {
			Literal::String(s) => s.clone(),
			Literal::Integer(i) => i.to_string(),
			Literal::Float(f) if f.is_infinite() => {
				if f.is_sign_positive() {
					"Infinity".to_string()
				} else {
					"-Infinity".to_string()
				}
			}
			Literal::Float(f) => f.to_string(),
			Literal::Boolean(b) => b.to_string(),
		}
	}

	/// JSON text for this literal, as used by `process.env.*` keys.
	pub fn to_json(&self) -> String {
		let value = match self {
			Literal::String(s) => serde_json::Value::from(s.as_str()),
			Literal::Integer(i) => serde_json::Value::from(*i),
			Literal::Float(f) if f.is_finite() => return self.display(),
			// Non-finite floats have no JSON form and become `null`.
			Literal::Float(_) => serde_json::Value::Null,
			Literal::Boolean(b) => serde_json::Value::from(*b),
		};
		value.to_string()
	}
}

/// A replacement target: either a literal or a context-dependent producer.
#[derive(Clone)]
pub enum Replacement {
	Literal(Literal),
	Function(Arc<dyn ValueProducer>),
}

impl Replacement {
	/// Wrap a closure as a replacement.
	pub fn from_fn<F>(f: F) -> Self
	where
		F: Fn(&str) -> Result<String, BoxError> + Send + Sync + 'static,
	{
		Replacement::Function(Arc::new(f))
	}

	/// Produce the replacement text for one match in `context_id`.
	pub fn produce(&self, context_id: &str) -> Result<String, BoxError> {
		match self {
			Replacement::Literal(literal) => Ok(literal.display()),
			Replacement::Function(producer) => producer.produce(context_id),
		}
	}

	/// The JSON-quoted form of this replacement.
	///
	/// Literals are quoted once, up front. Functions are wrapped so every
	/// produced string is quoted at match time.
	pub fn json_quoted(&self) -> Replacement {
		match self {
			Replacement::Literal(literal) => Replacement::Literal(Literal::String(literal.to_json())),
			Replacement::Function(producer) => {
				let producer = Arc::clone(producer);
				Replacement::from_fn(move |context_id| {
					let value = producer.produce(context_id)?;
					Ok(serde_json::Value::from(value).to_string())
				})
			}
		}
	}
}

impl fmt::Debug for Replacement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Replacement::Literal(literal) => f.debug_tuple("Literal").field(literal).finish(),
			Replacement::Function(_) => f.write_str("Function(<function>)"),
		}
	}
}

impl fmt::Display for Replacement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Replacement::Literal(literal) => f.write_str(&literal.display()),
			Replacement::Function(_) => f.write_str("<function>"),
		}
	}
}

impl From<&str> for Replacement {
	fn from(value: &str) -> Self {
		Replacement::Literal(Literal::String(value.to_string()))
	}
}

impl From<String> for Replacement {
	fn from(value: String) -> Self {
		Replacement::Literal(Literal::String(value))
	}
}

impl From<i64> for Replacement {
	fn from(value: i64) -> Self {
		Replacement::Literal(Literal::Integer(value))
	}
}

impl From<f64> for Replacement {
	fn from(value: f64) -> Self {
		Replacement::Literal(Literal::Float(value))
	}
}

impl From<bool> for Replacement {
	fn from(value: bool) -> Self {
		Replacement::Literal(Literal::Boolean(value))
	}
}
