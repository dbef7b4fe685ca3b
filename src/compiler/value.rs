//! Lowered values with an explicit indirection depth.

use inkwell::{
    builder::Builder,
    values::{BasicValueEnum, PointerValue},
};

use crate::errors::errors::Error;

/// A lowered expression together with the number of loads separating it from
/// the value it denotes.
///
/// Depth 0 is a plain value, depth 1 the address of a value (a variable slot
/// or a reference parameter), depth 2 a slot that holds an address (a
/// reference variable).
#[derive(Debug, Clone, Copy)]
pub struct GenValue<'a> {
    pub value: BasicValueEnum<'a>,
    pub depth: u8,
}

impl<'a> GenValue<'a> {
    pub fn scalar(value: impl Into<BasicValueEnum<'a>>) -> Self {
        GenValue {
            value: value.into(),
            depth: 0,
        }
    }

    pub fn address(pointer: PointerValue<'a>) -> Self {
        GenValue {
            value: pointer.into(),
            depth: 1,
        }
    }

    pub fn slot(pointer: PointerValue<'a>, depth: u8) -> Self {
        GenValue {
            value: pointer.into(),
            depth,
        }
    }

    fn load(self, builder: &Builder<'a>) -> Result<Self, Error> {
        let value = builder.build_load(self.value.into_pointer_value(), "")?;

        Ok(GenValue {
            value,
            depth: self.depth - 1,
        })
    }

    /// Loads until a plain value is reached.
    pub fn to_value(self, builder: &Builder<'a>) -> Result<BasicValueEnum<'a>, Error> {
        let mut current = self;
        while current.depth > 0 {
            current = current.load(builder)?;
        }

        Ok(current.value)
    }

    /// Loads until a single address remains. Plain values have no address.
    pub fn to_address(self, builder: &Builder<'a>) -> Result<Option<PointerValue<'a>>, Error> {
        if self.depth == 0 {
            return Ok(None);
        }

        let mut current = self;
        while current.depth > 1 {
            current = current.load(builder)?;
        }

        Ok(Some(current.value.into_pointer_value()))
    }
}
