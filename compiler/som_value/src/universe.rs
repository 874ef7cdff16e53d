//! The class universe: well-known classes, user classes, `class_of` and
//! `describe`.

use rustc_hash::FxHashMap;

use crate::errors::{unsupported_state, EvalError};
use crate::value::{ClassRef, Value};

/// Fallback text for an object whose class was never set.
pub const CLASSLESS_DESCRIPTION: &str = "an Object(class==null)";

/// Classes every value maps onto, plus a registry of user classes by name.
pub struct Universe {
    object: ClassRef,
    nil: ClassRef,
    true_class: ClassRef,
    false_class: ClassRef,
    integer: ClassRef,
    double: ClassRef,
    string: ClassRef,
    symbol: ClassRef,
    block: ClassRef,
    class: ClassRef,
    classes: FxHashMap<Box<str>, ClassRef>,
}

impl Universe {
    pub fn new() -> Self {
        let object = ClassRef::new("Object", 0, false, None);
        let value_class = |name: &str| ClassRef::new(name, 0, true, Some(object.clone()));
        let nil = value_class("Nil");
        let true_class = value_class("True");
        let false_class = value_class("False");
        let integer = value_class("Integer");
        let double = value_class("Double");
        let string = value_class("String");
        let symbol = ClassRef::new("Symbol", 0, true, Some(string.clone()));
        let block = ClassRef::new("Block", 0, false, Some(object.clone()));
        let class = ClassRef::new("Class", 0, false, Some(object.clone()));

        let mut classes = FxHashMap::default();
        for c in [
            &object,
            &nil,
            &true_class,
            &false_class,
            &integer,
            &double,
            &string,
            &symbol,
            &block,
            &class,
        ] {
            classes.insert(Box::from(c.name()), c.clone());
        }

        Universe {
            object,
            nil,
            true_class,
            false_class,
            integer,
            double,
            string,
            symbol,
            block,
            class,
            classes,
        }
    }

    pub fn object_class(&self) -> &ClassRef {
        &self.object
    }

    pub fn integer_class(&self) -> &ClassRef {
        &self.integer
    }

    /// Register a class inheriting from `superclass` (or `Object`).
    ///
    /// Redefining a name replaces the registry entry; existing instances keep
    /// the class they were allocated with.
    pub fn define_class(
        &mut self,
        name: &str,
        num_fields: usize,
        is_value: bool,
        superclass: Option<&ClassRef>,
    ) -> ClassRef {
        let parent = superclass.unwrap_or(&self.object).clone();
        let class = ClassRef::new(name, num_fields, is_value, Some(parent));
        if self.classes.insert(Box::from(name), class.clone()).is_some() {
            tracing::debug!(class = name, "class redefined");
        }
        class
    }

    pub fn lookup_class(&self, name: &str) -> Option<ClassRef> {
        self.classes.get(name).cloned()
    }

    /// The class of `value`.
    ///
    /// Fails with `UnsupportedState` for an instance whose class was never set
    /// and for foreign handles, which are not runtime objects.
    pub fn class_of(&self, value: &Value) -> Result<ClassRef, EvalError> {
        let class = match value {
            Value::Nil => &self.nil,
            Value::Bool(true) => &self.true_class,
            Value::Bool(false) => &self.false_class,
            Value::Integer(_) | Value::BigInteger(_) => &self.integer,
            Value::Double(_) => &self.double,
            Value::String(_) => &self.string,
            Value::Symbol(_) => &self.symbol,
            Value::Block(_) => &self.block,
            Value::Class(_) => &self.class,
            Value::Instance(obj) => {
                return obj
                    .class()
                    .ok_or_else(|| unsupported_state("class of an object whose class is null"));
            }
            Value::Foreign(handle) => {
                return Err(unsupported_state(format!(
                    "class of foreign handle {}",
                    handle.0
                )));
            }
        };
        Ok(class.clone())
    }

    /// Diagnostic text: `a <ClassName>`, or the fixed classless fallback.
    ///
    /// Never reached from arithmetic or field access.
    #[cold]
    pub fn describe(&self, value: &Value) -> String {
        match self.class_of(value) {
            Ok(class) => format!("a {}", class.name()),
            Err(_) => CLASSLESS_DESCRIPTION.to_string(),
        }
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Universe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Universe")
            .field("classes", &self.classes.len())
            .finish_non_exhaustive()
    }
}
