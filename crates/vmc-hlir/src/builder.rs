//! Fluent construction of HLIR modules.
//!
//! Providers translate their native IR through this API; tests use it to
//! assemble small programs directly.

use crate::module::{
    Block, FuncId, Function, Global, GlobalId, Instr, Module, SourcePos, Value, ValueId,
};

/// Builder for [`Module`].
#[derive(Default)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function with a single empty block.
    pub fn function(&mut self, name: &str, params: usize) -> FuncId {
        self.module.functions.push(Function {
            name: name.to_string(),
            params,
            blocks: vec![Block::default()],
        });
        FuncId(self.module.functions.len() - 1)
    }

    /// Add an extra block to a function.
    pub fn block(&mut self, function: FuncId) -> usize {
        let blocks = &mut self.module.functions[function.0].blocks;
        blocks.push(Block::default());
        blocks.len() - 1
    }

    /// Add a module-level variable.
    pub fn global(&mut self, name: &str) -> GlobalId {
        self.module.globals.push(Global {
            name: name.to_string(),
        });
        GlobalId(self.module.globals.len() - 1)
    }

    fn value(&mut self, value: Value) -> ValueId {
        self.module.values.push(value);
        ValueId(self.module.values.len() - 1)
    }

    pub fn constant(&mut self, value: i64) -> ValueId {
        self.value(Value::Const(value))
    }

    pub fn param(&mut self, function: FuncId, index: usize) -> ValueId {
        self.value(Value::Param { function, index })
    }

    pub fn phi(&mut self, incoming: Vec<ValueId>) -> ValueId {
        self.value(Value::Phi { incoming })
    }

    pub fn global_ref(&mut self, global: GlobalId) -> ValueId {
        self.value(Value::Global(global))
    }

    pub fn unary(&mut self, operand: ValueId) -> ValueId {
        self.value(Value::Unary(operand))
    }

    pub fn convert(&mut self, operand: ValueId) -> ValueId {
        self.value(Value::Convert(operand))
    }

    pub fn field_addr(
        &mut self,
        base: ValueId,
        field: usize,
        function: FuncId,
        block: usize,
    ) -> ValueId {
        self.value(Value::FieldAddr {
            base,
            field,
            function,
            block,
        })
    }

    pub fn call_result(&mut self, callee: FuncId) -> ValueId {
        self.value(Value::CallResult { callee })
    }

    pub fn opaque(&mut self) -> ValueId {
        self.value(Value::Opaque)
    }

    /// Append a store to a block.
    pub fn store(&mut self, function: FuncId, block: usize, addr: ValueId, value: ValueId) {
        self.module.functions[function.0].blocks[block]
            .instrs
            .push(Instr::Store { addr, value });
    }

    /// Append a return to a block.
    pub fn ret(&mut self, function: FuncId, block: usize, values: Vec<ValueId>) {
        self.module.functions[function.0].blocks[block]
            .instrs
            .push(Instr::Return { values });
    }

    /// Append a call site to a block.
    pub fn call_site(
        &mut self,
        caller: FuncId,
        block: usize,
        callee: FuncId,
        args: Vec<ValueId>,
        file: &str,
        line: usize,
    ) {
        self.module.functions[caller.0].blocks[block]
            .instrs
            .push(Instr::Call {
                callee,
                args,
                pos: SourcePos {
                    file: file.to_string(),
                    line,
                },
            });
    }

    /// Finish and return the module.
    pub fn finish(self) -> Module {
        self.module
    }
}
