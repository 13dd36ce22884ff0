//! Program and Language (§3.5, §4.8, §6.3).
//!
//! A [`Language`] is the host's registry of built-in libraries, shared across as
//! many [`Program`]s as the host wants to compile; a `Program` is one compiled
//! script — its AST's compiled forms plus the flag set that picked them — and an
//! [`crate::context::ExecutionContext`] is the mutable state of one run of it.

use ahash::AHashMap;

use crate::ast::Node;
use crate::bytecode::{Code, Vm, VmOutcome};
use crate::context::{ExecutionContext, LibraryFactory};
use crate::error::{ParseErrorKind, TangError, TangResult};
use crate::value::{FunctionObject, Value};

pub type FunctionTable = AHashMap<u64, FunctionObject>;

/// A container of native library factories a script can `use` (§6.3: "create/destroy
/// Language (a container for built-in libraries)"). Cloned into every `Program` built
/// against it, since a `Program` must own everything an `ExecutionContext` needs for
/// its whole lifetime.
#[derive(Clone, Default)]
pub struct Language {
    factories: AHashMap<u64, LibraryFactory>,
}

impl Language {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `Language` pre-populated with the bundled `Math`/`Random` libraries (§6.4).
    pub fn with_builtins() -> Self {
        let mut lang = Self::new();
        lang.register("Math", crate::library::math::create);
        lang.register("Random", crate::library::random::create);
        lang
    }

    /// Registers a global library creator by identifier (§6.3): `name` is the
    /// identifier a script's `use` statement names as its library (the capitalized
    /// form, e.g. `"Math"` for `use math;`).
    pub fn register(&mut self, name: &str, factory: LibraryFactory) {
        self.factories.insert(crate::scope::hash_identifier(name), factory);
    }
}

/// The flag set carried by a `Program` (§3.5): `debug` enables the CLI's tree-dump
/// diagnostics, `duplicate_code` mirrors the original's copy-vs-borrow source choice
/// (this port always owns its source, so the flag is accepted but has no effect
/// beyond being readable by an embedder), and the two `disable_*` flags force a
/// backend off regardless of what's available.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flags {
    pub debug: bool,
    pub duplicate_code: bool,
    pub disable_bytecode: bool,
    pub disable_binary: bool,
}

impl Flags {
    /// Reads `TANG_DEBUG`, `TANG_DISABLE_BYTECODE`, `TANG_DISABLE_BINARY` and ORs them
    /// onto a base set of flags (§6.1 ADDED Configuration): an embedder's explicit
    /// flags always win over environment defaults being *absent*, but the environment
    /// can only ever turn a flag on, never off.
    pub fn default_flags() -> Self {
        Self {
            debug: env_flag("TANG_DEBUG"),
            duplicate_code: false,
            disable_bytecode: env_flag("TANG_DISABLE_BYTECODE"),
            disable_binary: env_flag("TANG_DISABLE_BINARY"),
        }
    }

    fn merged_with_env(self) -> Self {
        let env = Self::default_flags();
        Self {
            debug: self.debug || env.debug,
            duplicate_code: self.duplicate_code,
            disable_bytecode: self.disable_bytecode || env.disable_bytecode,
            disable_binary: self.disable_binary || env.disable_binary,
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var_os(name).is_some_and(|v| v != "0" && v != "")
}

#[cfg(all(feature = "jit", target_arch = "x86_64"))]
type NativeEntry = unsafe extern "C" fn(*mut ExecutionContext) -> *mut Value;

/// A compiled program: the bytecode form (unless disabled), the native-compiled form
/// (unless disabled, unavailable on this target, or the AST used a construct the
/// native compiler bails on — §4.7 "all-or-nothing per Program"), and the library
/// factories an `ExecutionContext` built against it can resolve.
pub struct Program {
    flags: Flags,
    code: Code,
    functions: FunctionTable,
    #[cfg(all(feature = "jit", target_arch = "x86_64"))]
    native: Option<crate::jit::ExecutablePage>,
    factories: AHashMap<u64, LibraryFactory>,
}

impl Program {
    /// Parses, simplifies, analyzes, and compiles `source` against `language`
    /// (§6.3: "create Program given a Language and source plus flags"). `flags` is
    /// merged with the environment defaults (`Flags::default_flags`).
    pub fn create(language: &Language, source: &str, flags: Flags) -> TangResult<Self> {
        Self::create_with_mode(language, source, flags, ParseMode::Script)
    }

    /// Same as [`Program::create`], but parses `source` as a template document
    /// (§6.2: literal text outside `<% %>` becomes implicit `print`s).
    pub fn create_template(language: &Language, source: &str, flags: Flags) -> TangResult<Self> {
        Self::create_with_mode(language, source, flags, ParseMode::Template)
    }

    fn create_with_mode(language: &Language, source: &str, flags: Flags, mode: ParseMode) -> TangResult<Self> {
        let flags = flags.merged_with_env();

        let mut ast = match mode {
            ParseMode::Script => crate::parser::parse(source),
            ParseMode::Template => crate::parser::parse_template(source),
        };
        if let crate::ast::NodeKind::ParseError(kind) = ast.kind {
            return Err(TangError::Parse(kind));
        }

        let mut vars = crate::ast::VariableMap::new();
        ast.simplify(&mut vars);

        let mut arena = crate::scope::ScopeArena::new();
        if let Err(e) = ast.analyze_program(&mut arena) {
            return Err(TangError::Semantic(analyze_error_to_parse_error(e)));
        }

        // Bytecode is always compiled, even when `disable_bytecode` forbids running
        // the *top-level* program through the VM: native-compiled code re-enters the
        // VM for every script-to-script call (§4.7, `ExecutionContext::call_function_via_vm`),
        // so the function table has to exist whenever native code might call into it.
        let (code, functions) = ast.compile_bytecode_program(&arena);

        #[cfg(all(feature = "jit", target_arch = "x86_64"))]
        let native = if flags.disable_binary {
            None
        } else {
            ast.compile_native_program(&arena).and_then(|(native_code, relocations)| crate::jit::ExecutablePage::with_relocations(&native_code, &relocations).ok())
        };

        Ok(Self {
            flags,
            code,
            functions,
            #[cfg(all(feature = "jit", target_arch = "x86_64"))]
            native,
            factories: language.factories.clone(),
        })
    }

    /// Whether this program ended up with a usable native-compiled form (the AST
    /// was native-eligible, the feature/target allow it, and it wasn't disabled).
    pub fn has_native(&self) -> bool {
        #[cfg(all(feature = "jit", target_arch = "x86_64"))]
        {
            self.native.is_some()
        }
        #[cfg(not(all(feature = "jit", target_arch = "x86_64")))]
        {
            false
        }
    }

    pub fn debug(&self) -> bool {
        self.flags.debug
    }

    /// Builds a fresh `ExecutionContext` against this Program's library factories and
    /// links it to the Program's compiled bytecode (§6.3: "create Execution Context
    /// given a Program").
    pub fn create_context(&self) -> ExecutionContext {
        let mut ctx = ExecutionContext::new();
        for (&hash, &factory) in &self.factories {
            ctx.register_library(hash, factory);
        }
        ctx.link_program(&self.code, &self.functions);
        ctx
    }

    /// Runs the program to completion, preferring the native-compiled form when
    /// available, falling back to the bytecode VM otherwise (§4.7/§4.8). Sets
    /// `ctx.result` and leaves `ctx.output` populated for the caller to read.
    pub fn execute(&self, ctx: &mut ExecutionContext) {
        #[cfg(all(feature = "jit", target_arch = "x86_64"))]
        if let Some(page) = &self.native {
            // SAFETY: `page` holds machine code emitted by `compile_native_program`
            // for exactly this ABI signature; `ctx` outlives the call. `native` is
            // only ever `Some` when `flags.disable_binary` was false at creation time.
            let entry: NativeEntry = unsafe { std::mem::transmute(page.as_ptr()) };
            let result_ptr = unsafe { entry(ctx as *mut ExecutionContext) };
            ctx.result = unsafe { &*result_ptr }.clone();
            return;
        }

        if self.flags.disable_bytecode {
            ctx.result = Value::error(crate::value::ErrorValue::Message("no backend available: both bytecode and binary execution are disabled".to_string()));
            return;
        }

        match Vm::new(&self.code, &self.functions, ctx).run() {
            VmOutcome::Finished(value) => ctx.result = value,
            VmOutcome::StackOverflow => {
                ctx.result = Value::error(crate::value::ErrorValue::Message("call stack exhausted".to_string()));
            }
        }
    }
}

enum ParseMode {
    Script,
    Template,
}

fn analyze_error_to_parse_error(e: crate::ast::AnalyzeError) -> ParseErrorKind {
    use crate::ast::AnalyzeError;
    match e {
        AnalyzeError::FunctionRedeclared(n) => ParseErrorKind::FunctionRedeclared(n),
        AnalyzeError::IdentifierRedeclared(n) => ParseErrorKind::IdentifierRedeclared(n),
        AnalyzeError::GlobalIdentifierRedeclared(n) => ParseErrorKind::GlobalIdentifierRedeclared(n),
        AnalyzeError::MisplacedUse => ParseErrorKind::MisplacedUse,
        AnalyzeError::MisplacedGlobal => ParseErrorKind::MisplacedGlobal,
        AnalyzeError::UnknownIdentifier(n) => ParseErrorKind::Message(format!("unknown identifier '{n}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> (String, String, bool) {
        let language = Language::with_builtins();
        let program = Program::create(&language, source, Flags::default()).expect("compile should succeed");
        let mut ctx = program.create_context();
        program.execute(&mut ctx);
        let is_error = ctx.result.is_error();
        (ctx.result.to_display_string(&ctx.gc), ctx.output.clone(), is_error)
    }

    #[test]
    fn arithmetic_precedence() {
        let (result, ..) = run("3 + 4 * 2;");
        assert_eq!(result, "11");
    }

    #[test]
    fn reassignment() {
        let (result, ..) = run("a = 5; a = a + 1; a;");
        assert_eq!(result, "6");
    }

    #[test]
    fn if_else_branches() {
        let (result, ..) = run(r#"if (1 < 2) { "yes"; } else { "no"; }"#);
        assert_eq!(result, "yes");
    }

    #[test]
    fn while_loop() {
        let (result, ..) = run("i = 0; while (i < 3) { i = i + 1; } i;");
        assert_eq!(result, "3");
    }

    #[test]
    fn math_library_pi() {
        let (result, ..) = run("use math; math.pi;");
        assert_eq!(result, "3.141593");
    }

    #[test]
    fn print_accumulates_output_and_result_is_null() {
        let (result, output, _) = run(r#"print("hi"); null;"#);
        assert_eq!(output, "hi");
        assert_eq!(result, "null");
    }

    #[test]
    fn divide_by_zero_is_error() {
        let (result, _, is_error) = run("10 / 0;");
        assert!(is_error);
        assert!(result.starts_with("Error:"));
    }

    #[test]
    fn semantic_error_is_reported_as_tang_error() {
        let language = Language::with_builtins();
        let err = Program::create(&language, "{ global x; } global x;", Flags::default()).unwrap_err();
        assert!(matches!(err, TangError::Semantic(_)));
    }
}
