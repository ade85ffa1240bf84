//! Typed SSA input graph.
//!
//! The engine consumes one already type-checked program in SSA form: functions
//! made of basic blocks, explicit phi edges, parameters, constants, and
//! branch/jump/return terminators. Parsing source and inferring types is the
//! job of an external front-end; this module only defines the shapes that
//! front-end produces, plus [`FunctionBuilder`] for building them by hand.
//!
//! # Key Components
//!
//! - [`Program`] - Functions, methods and struct definitions
//! - [`Function`] - Parameters, result type, blocks and a definition index
//! - [`Block`] - Phi nodes followed by instructions
//! - [`Instruction`] / [`InstructionKind`] - The modeled instruction set
//! - [`Type`] - Static types and their signatures
//! - [`FunctionBuilder`] - Fluent construction with type inference

mod block;
mod builder;
mod function;
mod instruction;
mod phi;
mod program;
mod types;
mod value;

pub use block::Block;
pub use builder::FunctionBuilder;
pub use function::{DefSite, Function, Parameter};
pub use instruction::{
    BinaryOperator, Callee, Instruction, InstructionKind, Intrinsic, UnaryOperator,
};
pub use phi::{PhiNode, PhiOperand};
pub use program::Program;
pub use types::{FieldDef, IntKind, StructDef, Type, MACHINE_WIDTH};
pub use value::{BlockId, Constant, Operand, ValueId};
