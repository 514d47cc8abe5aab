//! Macros for code generation in entity types.
//!
//! Every stored entity carries the same identity fields (`handle`,
//! `gramps_id`, `origin`). These macros generate the shared trait impl and the
//! conversions into [`Object`](crate::object::Object) so each entity type only
//! declares its own fields.

/// Implement [`GenealogyObject`](crate::object::GenealogyObject) and the
/// `Object` conversions for an entity type.
///
/// The type must have `handle: Handle`, `gramps_id: String` and
/// `origin: Option<String>` fields, and `Object` must have a variant of the
/// same name.
///
/// # Example
///
/// ```ignore
/// impl_genealogy_object!(Person, Person);
/// ```
#[macro_export]
macro_rules! impl_genealogy_object {
    ($ty:ident, $variant:ident) => {
        impl $crate::object::GenealogyObject for $ty {
            fn kind(&self) -> $crate::handle::ObjectKind {
                $crate::handle::ObjectKind::$variant
            }

            fn handle(&self) -> &$crate::handle::Handle {
                &self.handle
            }

            fn gramps_id(&self) -> &str {
                &self.gramps_id
            }

            fn origin(&self) -> Option<&str> {
                self.origin.as_deref()
            }

            fn set_origin(&mut self, origin: Option<String>) {
                self.origin = origin;
            }
        }

        impl From<$ty> for $crate::object::Object {
            fn from(value: $ty) -> Self {
                $crate::object::Object::$variant(value)
            }
        }

        impl TryFrom<$crate::object::Object> for $ty {
            type Error = $crate::object::Object;

            fn try_from(value: $crate::object::Object) -> std::result::Result<Self, Self::Error> {
                match value {
                    $crate::object::Object::$variant(inner) => Ok(inner),
                    other => Err(other),
                }
            }
        }
    };
}

/// Dispatch a method call to whichever entity an `Object` holds.
#[macro_export]
macro_rules! with_object {
    ($object:expr, $inner:ident => $body:expr) => {
        match $object {
            $crate::object::Object::Person($inner) => $body,
            $crate::object::Object::Family($inner) => $body,
            $crate::object::Object::Event($inner) => $body,
            $crate::object::Object::Source($inner) => $body,
            $crate::object::Object::Repository($inner) => $body,
            $crate::object::Object::Place($inner) => $body,
            $crate::object::Object::Media($inner) => $body,
            $crate::object::Object::Note($inner) => $body,
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::handle::{Handle, ObjectKind};
    use crate::note::Note;
    use crate::object::{GenealogyObject, Object};

    #[test]
    fn test_generated_conversions() {
        let note = Note::new(Handle::new("n1"), "N0001", "text");
        let object: Object = note.clone().into();
        assert_eq!(object.kind(), ObjectKind::Note);
        assert_eq!(object.gramps_id(), "N0001");
        let back = Note::try_from(object).unwrap();
        assert_eq!(back, note);
    }
}
