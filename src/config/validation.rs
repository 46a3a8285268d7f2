//! Required-field check.
//!
//! # Responsibilities
//! - Walk the fully resolved record, including nested records and sequence elements
//! - Report every required leaf that still holds its zero value
//!
//! # Design Decisions
//! - Returns all missing fields, not just the first
//! - Runs last, after defaults, so a default satisfies `required`

use crate::bind::layers::FieldPath;
use crate::bind::{Bind, Field, Sequence, Visitor};
use crate::error::{BindError, BindResult};
use crate::value::Leaf;

#[derive(Default)]
struct RequiredCheck {
    path: FieldPath,
    missing: Vec<String>,
}

impl Visitor for RequiredCheck {
    fn leaf(&mut self, field: &Field, value: &mut dyn Leaf) -> BindResult<()> {
        if field.is_required() && value.is_zero() {
            self.missing.push(self.path.join(field.name()));
        }
        Ok(())
    }

    fn nested(&mut self, field: &Field, value: &mut dyn Bind) -> BindResult<()> {
        self.path.push(field.name());
        let result = value.bind(self);
        self.path.pop();
        result
    }

    fn sequence(&mut self, field: &Field, value: &mut dyn Sequence) -> BindResult<()> {
        self.path.push(field.name());
        for index in 0..value.len() {
            if let Some(element) = value.element(index) {
                self.path.push(index.to_string());
                element.bind(self)?;
                self.path.pop();
            }
        }
        self.path.pop();
        Ok(())
    }
}

/// Fail with [`BindError::MissingRequired`] naming every required field left empty.
pub fn check_required<T: Bind + ?Sized>(record: &mut T) -> BindResult<()> {
    let mut check = RequiredCheck::default();
    record.bind(&mut check)?;
    if check.missing.is_empty() {
        return Ok(());
    }
    tracing::warn!(fields = ?check.missing, "Required configuration fields are empty");
    Err(BindError::MissingRequired {
        fields: check.missing,
    })
}
