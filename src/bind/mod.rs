//! Record registration and traversal.
//!
//! A record opts into binding by implementing [`Bind`]: it describes each of its fields
//! to a [`Visitor`] together with the field's [`Field`] options. Every layer of the
//! pipeline is a visitor walking the same description.
//!
//! # Data Flow
//! ```text
//! record.bind(visitor)
//!     → visitor.leaf(field, &mut value)        scalars, arrays, durations, ...
//!     → visitor.nested(field, &mut sub_record) composite fields
//!     → visitor.sequence(field, &mut vec)      lists of composites
//! ```
//!
//! # Design Decisions
//! - Registration is explicit; there is no runtime reflection
//! - `Option<T>` composites are visited only when present
//! - Sequences can grow, so the environment layer can populate `Vec<T>` by index

pub mod field;
pub(crate) mod layers;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::BindResult;
use crate::value::Leaf;

pub use field::{ArgBinding, EnvBinding, Field};

/// A record whose fields can be bound from configuration sources.
///
/// ```
/// use strata::bind::{Bind, Field, Visitor};
/// use strata::BindResult;
///
/// #[derive(Default)]
/// struct Database {
///     host: String,
///     port: u16,
/// }
///
/// impl Bind for Database {
///     fn bind(&mut self, v: &mut dyn Visitor) -> BindResult<()> {
///         v.leaf(&Field::new("host").default("localhost"), &mut self.host)?;
///         v.leaf(&Field::new("port").default("3306"), &mut self.port)
///     }
/// }
/// ```
pub trait Bind {
    fn bind(&mut self, visitor: &mut dyn Visitor) -> BindResult<()>;
}

/// Receives the fields of a record, one call per field.
pub trait Visitor {
    fn leaf(&mut self, field: &Field, value: &mut dyn Leaf) -> BindResult<()>;

    fn nested(&mut self, field: &Field, value: &mut dyn Bind) -> BindResult<()>;

    fn sequence(&mut self, field: &Field, value: &mut dyn Sequence) -> BindResult<()>;
}

/// A growable list of composite elements.
pub trait Sequence {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn element(&mut self, index: usize) -> Option<&mut dyn Bind>;

    /// Append a default element and return it.
    fn push_default(&mut self) -> &mut dyn Bind;

    /// Remove the last element.
    fn pop(&mut self);
}

impl<T: Bind + Default> Sequence for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn element(&mut self, index: usize) -> Option<&mut dyn Bind> {
        self.get_mut(index).map(|e| e as &mut dyn Bind)
    }

    fn push_default(&mut self) -> &mut dyn Bind {
        let index = Vec::len(self);
        self.push(T::default());
        &mut self[index]
    }

    fn pop(&mut self) {
        Vec::pop(self);
    }
}

impl<T: Bind> Bind for Option<T> {
    fn bind(&mut self, visitor: &mut dyn Visitor) -> BindResult<()> {
        match self {
            Some(inner) => inner.bind(visitor),
            None => Ok(()),
        }
    }
}

impl<T: Bind + ?Sized> Bind for Box<T> {
    fn bind(&mut self, visitor: &mut dyn Visitor) -> BindResult<()> {
        (**self).bind(visitor)
    }
}

/// Everything the loader and the reload supervisor need from a record type.
pub trait Settings: Bind + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Settings for T where T: Bind + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}
