//! Class identities, class instances, closures and foreign handles.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use som_ir::ExprId;

use super::Value;
use crate::activation::{Activation, AddressFault};

/// A class as seen by the interpreter core.
///
/// Method lookup lives elsewhere; the core only needs the name (for
/// `describe`), the instance layout and the value-semantics flag.
#[derive(Debug)]
pub struct Class {
    name: Box<str>,
    num_fields: usize,
    is_value: bool,
    superclass: Option<ClassRef>,
}

impl Class {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of instance fields, including inherited ones.
    pub fn num_fields(&self) -> usize {
        self.num_fields
    }

    /// Whether instances are value types (compared by content, immutable).
    pub fn is_value(&self) -> bool {
        self.is_value
    }

    pub fn superclass(&self) -> Option<&ClassRef> {
        self.superclass.as_ref()
    }

    /// Whether `self` is `other` or inherits from it.
    pub fn is_kind_of(&self, other: &ClassRef) -> bool {
        if std::ptr::eq(self, &*other.0) {
            return true;
        }
        self.superclass
            .as_ref()
            .is_some_and(|parent| parent.is_kind_of(other))
    }
}

/// Shared handle to a class. Equality is identity.
#[derive(Clone)]
pub struct ClassRef(Rc<Class>);

impl ClassRef {
    /// Build a class. `num_fields` counts only the fields this class adds;
    /// inherited fields are laid out first.
    pub fn new(
        name: impl Into<Box<str>>,
        num_fields: usize,
        is_value: bool,
        superclass: Option<ClassRef>,
    ) -> Self {
        let inherited = superclass.as_ref().map_or(0, |s| s.num_fields);
        ClassRef(Rc::new(Class {
            name: name.into(),
            num_fields: inherited + num_fields,
            is_value,
            superclass,
        }))
    }

    /// Whether two handles denote the same class.
    #[inline]
    pub fn same(a: &ClassRef, b: &ClassRef) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for ClassRef {
    type Target = Class;

    #[inline]
    fn deref(&self) -> &Class {
        &self.0
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        ClassRef::same(self, other)
    }
}

impl Eq for ClassRef {}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassRef({})", self.0.name)
    }
}

struct InstanceData {
    class: Option<ClassRef>,
    fields: Vec<Value>,
}

/// A heap object with a class and indexed fields.
///
/// Identity type unless its class is a value class. A missing class is the
/// degenerate state of an object whose allocation was never finished.
#[derive(Clone)]
pub struct Instance(Rc<RefCell<InstanceData>>);

impl Instance {
    /// Allocate an instance with every field set to nil.
    pub fn new(class: ClassRef) -> Self {
        let fields = vec![Value::Nil; class.num_fields()];
        Self::with_fields(class, fields)
    }

    /// Allocate an instance with the given field contents.
    pub fn with_fields(class: ClassRef, fields: Vec<Value>) -> Self {
        Instance(Rc::new(RefCell::new(InstanceData {
            class: Some(class),
            fields,
        })))
    }

    /// An object whose class was never set.
    pub fn uninitialized(num_fields: usize) -> Self {
        Instance(Rc::new(RefCell::new(InstanceData {
            class: None,
            fields: vec![Value::Nil; num_fields],
        })))
    }

    pub fn class(&self) -> Option<ClassRef> {
        self.0.borrow().class.clone()
    }

    pub fn is_value(&self) -> bool {
        self.0.borrow().class.as_ref().is_some_and(|c| c.is_value())
    }

    pub fn num_fields(&self) -> usize {
        self.0.borrow().fields.len()
    }

    pub fn field(&self, index: u32) -> Result<Value, AddressFault> {
        let data = self.0.borrow();
        data.fields
            .get(index as usize)
            .cloned()
            .ok_or(AddressFault::SlotOutOfBounds {
                len: data.fields.len(),
            })
    }

    pub fn set_field(&self, index: u32, value: Value) -> Result<(), AddressFault> {
        let mut data = self.0.borrow_mut();
        let len = data.fields.len();
        let slot = data
            .fields
            .get_mut(index as usize)
            .ok_or(AddressFault::SlotOutOfBounds { len })?;
        *slot = value;
        Ok(())
    }

    #[inline]
    pub fn ptr_eq(a: &Instance, b: &Instance) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Field-wise equality, used for value-class instances.
    pub fn content_eq(a: &Instance, b: &Instance) -> bool {
        if Instance::ptr_eq(a, b) {
            return true;
        }
        let (a, b) = (a.0.borrow(), b.0.borrow());
        let same_class = match (&a.class, &b.class) {
            (Some(x), Some(y)) => ClassRef::same(x, y),
            _ => false,
        };
        same_class && a.fields == b.fields
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        match &data.class {
            Some(class) => write!(f, "Instance({}, {:?})", class.name(), data.fields),
            None => write!(f, "Instance(<no class>, {:?})", data.fields),
        }
    }
}

struct BlockData {
    body: ExprId,
    num_args: u32,
    num_slots: u32,
    outer: Activation,
}

/// A closure: a block body plus the activation it was created in.
///
/// Identity type: each evaluation of a block literal yields a distinct
/// closure, even over the same body and activation.
#[derive(Clone)]
pub struct BlockValue(Rc<BlockData>);

impl BlockValue {
    pub fn new(body: ExprId, num_args: u32, num_slots: u32, outer: Activation) -> Self {
        BlockValue(Rc::new(BlockData {
            body,
            num_args,
            num_slots,
            outer,
        }))
    }

    pub fn body(&self) -> ExprId {
        self.0.body
    }

    pub fn num_args(&self) -> u32 {
        self.0.num_args
    }

    pub fn num_slots(&self) -> u32 {
        self.0.num_slots
    }

    /// The lexically enclosing activation captured at creation.
    pub fn outer(&self) -> &Activation {
        &self.0.outer
    }

    #[inline]
    pub fn ptr_eq(a: &BlockValue, b: &BlockValue) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for BlockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({:?}/{})", self.0.body, self.0.num_args)
    }
}

/// Opaque host-side handle that has no class and cannot live in a slot.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ForeignHandle(pub u64);
