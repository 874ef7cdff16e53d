//! Activations and the context chain.
//!
//! An `Activation` is the run-time record of one method or block invocation:
//! its receiver, its arguments, its field slots, and a link to the lexically
//! enclosing activation (for blocks, the activation the block literal was
//! evaluated in; for methods, none).
//!
//! Non-local access is addressed by a `context_level` fixed when the tree
//! was built: follow the enclosing link exactly that many times, then index.
//! No names, no hashing. Failing to reach the target is an addressing bug in
//! whoever built the tree and is reported as an [`AddressFault`].
//!
//! Activations are reference counted. A closure keeps its creating activation
//! alive after the creating call returns. Enclosing links only ever point at
//! activations created earlier, so the chain itself is acyclic.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::Value;

/// Inline capacity for argument lists; most sends have few arguments.
pub type Arguments = SmallVec<[Value; 4]>;

/// Why a statically computed address did not resolve.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AddressFault {
    /// The enclosing chain ended after `reached` hops.
    #[error("context chain ends after {reached} hop(s)")]
    ContextChainExhausted { reached: u32 },
    /// The slot index is outside the slot sequence.
    #[error("index out of bounds for {len} slot(s)")]
    SlotOutOfBounds { len: usize },
    /// The receiver reached is not an object with fields.
    #[error("receiver is {type_name}, not an object with fields")]
    NotAnInstance { type_name: &'static str },
}

struct Frame {
    receiver: Value,
    arguments: Arguments,
    slots: RefCell<Vec<Value>>,
    outer: Option<Activation>,
}

/// Shared handle to one invocation record.
#[derive(Clone)]
pub struct Activation(Rc<Frame>);

impl Activation {
    /// Activation of a method: no enclosing activation, slots start as nil.
    pub fn root(
        receiver: Value,
        arguments: impl IntoIterator<Item = Value>,
        num_slots: usize,
    ) -> Self {
        Activation(Rc::new(Frame {
            receiver,
            arguments: arguments.into_iter().collect(),
            slots: RefCell::new(vec![Value::Nil; num_slots]),
            outer: None,
        }))
    }

    /// Activation of a block invoked with `arguments`, enclosed by `outer`.
    pub fn nested(
        outer: &Activation,
        receiver: Value,
        arguments: impl IntoIterator<Item = Value>,
        num_slots: usize,
    ) -> Self {
        Activation(Rc::new(Frame {
            receiver,
            arguments: arguments.into_iter().collect(),
            slots: RefCell::new(vec![Value::Nil; num_slots]),
            outer: Some(outer.clone()),
        }))
    }

    /// Build an activation with explicit slot contents.
    pub fn with_slots(
        outer: Option<&Activation>,
        receiver: Value,
        arguments: impl IntoIterator<Item = Value>,
        slots: Vec<Value>,
    ) -> Self {
        Activation(Rc::new(Frame {
            receiver,
            arguments: arguments.into_iter().collect(),
            slots: RefCell::new(slots),
            outer: outer.cloned(),
        }))
    }

    /// The lexically enclosing activation, if any.
    #[inline]
    pub fn outer(&self) -> Option<&Activation> {
        self.0.outer.as_ref()
    }

    /// Follow the enclosing link `context_level` times.
    ///
    /// Level 0 is `self`. Cost is `context_level` pointer hops.
    #[inline]
    pub fn at_context_level(&self, context_level: u32) -> Result<&Activation, AddressFault> {
        let mut current = self;
        for reached in 0..context_level {
            current = current
                .0
                .outer
                .as_ref()
                .ok_or(AddressFault::ContextChainExhausted { reached })?;
        }
        Ok(current)
    }

    #[inline]
    pub fn receiver(&self) -> &Value {
        &self.0.receiver
    }

    pub fn argument(&self, index: u32) -> Result<Value, AddressFault> {
        self.0
            .arguments
            .get(index as usize)
            .cloned()
            .ok_or(AddressFault::SlotOutOfBounds {
                len: self.0.arguments.len(),
            })
    }

    pub fn num_arguments(&self) -> usize {
        self.0.arguments.len()
    }

    pub fn num_slots(&self) -> usize {
        self.0.slots.borrow().len()
    }

    pub fn read_slot(&self, index: u32) -> Result<Value, AddressFault> {
        let slots = self.0.slots.borrow();
        slots
            .get(index as usize)
            .cloned()
            .ok_or(AddressFault::SlotOutOfBounds { len: slots.len() })
    }

    /// Overwrite one slot. The borrow is released before the old value drops.
    pub fn write_slot(&self, index: u32, value: Value) -> Result<(), AddressFault> {
        let previous = {
            let mut slots = self.0.slots.borrow_mut();
            let len = slots.len();
            let slot = slots
                .get_mut(index as usize)
                .ok_or(AddressFault::SlotOutOfBounds { len })?;
            std::mem::replace(slot, value)
        };
        drop(previous);
        Ok(())
    }

    /// Number of activations in the chain, counting `self`.
    pub fn chain_len(&self) -> usize {
        let mut len = 1;
        let mut current = self;
        while let Some(outer) = current.outer() {
            len += 1;
            current = outer;
        }
        len
    }

    #[inline]
    pub fn ptr_eq(a: &Activation, b: &Activation) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Slots may hold blocks that point back here; print shallowly.
        f.debug_struct("Activation")
            .field("receiver", &self.0.receiver.type_name())
            .field("arguments", &self.0.arguments.len())
            .field("slots", &self.num_slots())
            .field("chain_len", &self.chain_len())
            .finish()
    }
}
