//! Host-provided native functions.
//!
//! A native is called like any other `@name` global, but runs in Rust and
//! binds its result directly without pushing a frame.

use icvm_foundation::{FaultKind, Value};

use crate::globals::GlobalTable;

/// Native function callable from IR.
#[derive(Clone, Copy, Debug)]
pub struct NativeFunction {
    /// Global name (without `@`).
    pub name: &'static str,
    /// Exact number of arguments.
    pub arity: usize,
    /// Function pointer.
    pub func: fn(&[Value]) -> Result<Value, FaultKind>,
}

impl NativeFunction {
    /// Creates a native.
    #[must_use]
    pub const fn new(
        name: &'static str,
        arity: usize,
        func: fn(&[Value]) -> Result<Value, FaultKind>,
    ) -> Self {
        Self { name, arity, func }
    }

    /// Checks arity and invokes the function.
    ///
    /// # Errors
    ///
    /// Returns [`FaultKind::Arity`] on an argument count mismatch, or whatever
    /// fault the function itself raises.
    pub fn call(&self, args: &[Value]) -> Result<Value, FaultKind> {
        if args.len() != self.arity {
            return Err(FaultKind::Arity {
                callee: self.name.to_string(),
                expected: self.arity,
                actual: args.len(),
            });
        }
        (self.func)(args)
    }
}

/// The natives installed by [`install_prelude`].
pub const PRELUDE: [NativeFunction; 6] = [
    NativeFunction::new("abs", 1, native_abs),
    NativeFunction::new("min", 2, native_min),
    NativeFunction::new("max", 2, native_max),
    NativeFunction::new("strlen", 1, native_strlen),
    NativeFunction::new("concat", 2, native_concat),
    NativeFunction::new("itoa", 1, native_itoa),
];

/// Registers the prelude natives in `globals`.
pub fn install_prelude(globals: &mut GlobalTable) {
    for native in PRELUDE {
        globals.define_native(native);
    }
}

fn int_arg(args: &[Value], i: usize, context: &str) -> Result<i64, FaultKind> {
    match &args[i] {
        Value::Int(n) => Ok(*n),
        other => Err(FaultKind::type_mismatch(
            "integer",
            other.value_type(),
            context,
        )),
    }
}

fn text_arg<'a>(args: &'a [Value], i: usize, context: &str) -> Result<&'a str, FaultKind> {
    args[i]
        .as_text()
        .ok_or_else(|| FaultKind::type_mismatch("text", args[i].value_type(), context))
}

fn native_abs(args: &[Value]) -> Result<Value, FaultKind> {
    int_arg(args, 0, "@abs")?
        .checked_abs()
        .map(Value::Int)
        .ok_or_else(|| FaultKind::arithmetic("overflow in @abs"))
}

fn native_min(args: &[Value]) -> Result<Value, FaultKind> {
    Ok(Value::Int(int_arg(args, 0, "@min")?.min(int_arg(args, 1, "@min")?)))
}

fn native_max(args: &[Value]) -> Result<Value, FaultKind> {
    Ok(Value::Int(int_arg(args, 0, "@max")?.max(int_arg(args, 1, "@max")?)))
}

fn native_strlen(args: &[Value]) -> Result<Value, FaultKind> {
    let len = text_arg(args, 0, "@strlen")?.chars().count();
    i64::try_from(len)
        .map(Value::Int)
        .map_err(|_| FaultKind::arithmetic("length overflow in @strlen"))
}

fn native_concat(args: &[Value]) -> Result<Value, FaultKind> {
    let a = text_arg(args, 0, "@concat")?;
    let b = text_arg(args, 1, "@concat")?;
    Ok(Value::from(format!("{a}{b}")))
}

fn native_itoa(args: &[Value]) -> Result<Value, FaultKind> {
    match &args[0] {
        Value::Int(n) => Ok(Value::from(n.to_string())),
        other => Err(FaultKind::type_mismatch("integer", other.value_type(), "@itoa")),
    }
}
