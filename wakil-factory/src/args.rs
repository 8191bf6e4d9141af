//! Creation arguments.
//!
//! Accessors forward [`Args`] to creation functions untouched: the factory
//! does not know their number or types. Creation functions pick them
//! apart with [`Args::get`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

type ArgValue = Arc<dyn Any + Send + Sync>;

/// An immutable, cheaply clonable list of type-erased arguments.
///
/// # Examples
/// ```
/// use wakil_factory::args;
///
/// let a = args![14i32, String::from("eu")];
/// assert_eq!(a.len(), 2);
/// assert_eq!(a.get::<i32>(0), Some(&14));
/// assert_eq!(a.get::<String>(1).map(String::as_str), Some("eu"));
/// assert_eq!(a.get::<u64>(0), None);
/// ```
#[derive(Clone, Default)]
pub struct Args {
    values: Arc<[ArgValue]>,
}

impl Args {
    /// No arguments.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The argument at `index`, if present and of type `T`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.downcast_ref::<T>()
    }

    /// The argument at `index` as a shared handle, if present and of type `T`.
    pub fn get_arc<T: Any + Send + Sync>(&self, index: usize) -> Option<Arc<T>> {
        Arc::clone(self.values.get(index)?).downcast::<T>().ok()
    }

    /// Appends a value, returning a new list.
    pub fn with<T: Any + Send + Sync>(self, value: T) -> Self {
        let mut values: Vec<ArgValue> = self.values.iter().cloned().collect();
        values.push(Arc::new(value));
        Self {
            values: values.into(),
        }
    }
}

impl From<Vec<ArgValue>> for Args {
    fn from(values: Vec<ArgValue>) -> Self {
        Self {
            values: values.into(),
        }
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("len", &self.values.len()).finish()
    }
}

/// Builds [`Args`] from a list of values.
#[macro_export]
macro_rules! args {
    () => {
        $crate::args::Args::empty()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::args::Args::from(::std::vec![
            $(::std::sync::Arc::new($value) as ::std::sync::Arc<dyn ::std::any::Any + Send + Sync>),+
        ])
    };
}
