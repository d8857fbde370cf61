//! Arena-based module model.
//!
//! Functions, blocks and values live in flat arenas addressed by typed
//! ids, so the structure serializes cleanly and never forms ownership
//! cycles even though the call relation is cyclic.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Index of a function within a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncId(pub usize);

/// Index of a global within a module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalId(pub usize);

/// Index of a value within a module's value arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueId(pub usize);

/// Source position of a call site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePos {
    pub file: String,
    pub line: usize,
}

/// A module-level variable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Global {
    pub name: String,
}

/// SSA-style value shapes the resolver understands. Anything else a
/// provider wants to ship maps to `Opaque` and resolves to nothing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Integer constant.
    Const(i64),
    /// Formal parameter of a function.
    Param { function: FuncId, index: usize },
    /// Phi node joining control-flow edges.
    Phi { incoming: Vec<ValueId> },
    /// Address of a module-level variable.
    Global(GlobalId),
    /// Unary operation on another value.
    Unary(ValueId),
    /// Type conversion of another value.
    Convert(ValueId),
    /// `&base.field`, positioned in its containing block so stores can
    /// be replayed in order.
    FieldAddr {
        base: ValueId,
        field: usize,
        function: FuncId,
        block: usize,
    },
    /// Result of a direct call to `callee`.
    CallResult { callee: FuncId },
    /// Anything the provider could not express.
    Opaque,
}

/// Block-level instructions. Only the shapes the resolver inspects are
/// modelled; providers collapse everything else into `Other`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instr {
    /// `*addr = value`
    Store { addr: ValueId, value: ValueId },
    /// `return values...`
    Return { values: Vec<ValueId> },
    /// Call site with positional arguments.
    Call {
        callee: FuncId,
        args: Vec<ValueId>,
        pos: SourcePos,
    },
    /// Present for ordering only.
    Other,
}

/// A basic block: an ordered list of instructions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Block {
    pub instrs: Vec<Instr>,
}

/// A function with its blocks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: usize,
    pub blocks: Vec<Block>,
}

/// A whole program in HLIR form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Module {
    pub functions: Vec<Function>,
    pub globals: Vec<Global>,
    pub values: Vec<Value>,
}

impl Module {
    /// Look up a function.
    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.0]
    }

    /// Look up a value.
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0]
    }

    /// Find a function by name.
    pub fn find_function(&self, name: &str) -> Option<FuncId> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(FuncId)
    }

    /// Load a module from its JSON interchange form.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Entry-point functions: the program `main` plus init functions.
    pub fn entry_points(&self) -> Vec<FuncId> {
        self.functions
            .iter()
            .enumerate()
            .filter(|(_, f)| {
                f.name == "main"
                    || f.name.ends_with(".main")
                    || f.name == "init"
                    || f.name.contains(".init")
                    || f.name.starts_with("init#")
            })
            .map(|(i, _)| FuncId(i))
            .collect()
    }
}
