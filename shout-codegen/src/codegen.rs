//! Lowers the AST into C source code.
//!
//! Generation is a single depth-first walk. Every expression is turned into a [`Fragment`] that
//! carries its inferred type and, when known, its constant value, which drives constant folding
//! and the pruning of statically decided `if` statements.

use std::collections::HashMap;

use shout_parser::ast::{
    Assignable, BinaryExpr, ElementType, Expr, FunctionDef, IfStatement, ListExpr, Program, Stmt,
};
use shout_source::GenerationError;
use tracing::{debug, trace};

use crate::value::{Const, Fragment, Type};

/// The fixed include block at the top of every generated file.
pub const PREAMBLE: &str = "#include <stdio.h>\n#include <string.h>\n\n";
const INDENT: &str = "    ";

/// Generates the C translation of `program`.
pub fn generate(program: &Program) -> Result<String, GenerationError> {
    let mut module = Module::default();
    let main_body = {
        let mut codegen = CodeGenerator::new(&mut module, None);
        codegen.codegen_stmts(&program.body)?;
        codegen.into_body()
    };
    Ok(module.finish(&main_body))
}

/// Generates the C translation of a program in the JSON AST interchange format.
pub fn generate_json(json: &str) -> Result<String, GenerationError> {
    let program =
        Program::from_json(json).map_err(|err| GenerationError::MalformedAst(err.to_string()))?;
    generate(&program)
}

/// State shared by all functions of one compilation run.
#[derive(Debug, Default)]
pub struct Module {
    /// Function definitions generated so far, in completion order.
    functions: String,
    /// Maps every function generated so far to its inferred return type.
    return_types: HashMap<String, Type>,
}

impl Module {
    /// Assembles the final translation unit around the body of `main`.
    pub fn finish(self, main_body: &str) -> String {
        format!(
            "{preamble}{functions}int main() {{\n{body}{indent}return 0;\n}}\n",
            preamble = PREAMBLE,
            functions = self.functions,
            body = main_body,
            indent = INDENT
        )
    }
}

/// The function whose body is being generated.
#[derive(Debug)]
struct FunctionContext {
    name: String,
    /// The type of the first `return` seen in the body.
    return_type: Option<Type>,
}

/// Generates the body of one function, or of `main` for the top-level statements.
/// Every function definition is generated by a new `CodeGenerator`, so a function body never sees
/// the variables, indentation or return type of the code around it.
pub struct CodeGenerator<'m> {
    module: &'m mut Module,
    body: String,
    /// Current indentation depth.
    indent: usize,
    /// Maps every variable declared in this body to its type.
    scope: HashMap<String, Type>,
    /// `None` for the top-level statements.
    function: Option<FunctionContext>,
}

impl<'m> CodeGenerator<'m> {
    fn new(module: &'m mut Module, function: Option<FunctionContext>) -> Self {
        Self {
            module,
            body: String::new(),
            indent: 1,
            scope: HashMap::new(),
            function,
        }
    }

    /// Consumes `self` and returns the generated body.
    #[must_use]
    fn into_body(self) -> String {
        self.body
    }

    /// Consumes `self` and returns the generated function body and the function return type.
    /// A function without any `return` returns `int` and gets a trailing `return 0;`.
    fn finish_function(mut self) -> (String, Type) {
        let return_type = self.function.take().and_then(|function| function.return_type);
        match return_type {
            Some(return_type) => (self.body, return_type),
            None => {
                self.emit("return 0;");
                (self.body, Type::Int)
            }
        }
    }

    fn emit(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.body.push_str(INDENT);
        }
        self.body.push_str(line);
        self.body.push('\n');
    }

    fn function_name(&self) -> &str {
        self.function
            .as_ref()
            .map_or("main", |function| function.name.as_str())
    }
}

/* Statements */
impl<'m> CodeGenerator<'m> {
    fn codegen_stmts(&mut self, stmts: &[Stmt]) -> Result<(), GenerationError> {
        for stmt in stmts {
            self.codegen_stmt(stmt)?;
        }
        Ok(())
    }

    /// Generates `stmts` one indentation level deeper.
    fn codegen_block(&mut self, stmts: &[Stmt]) -> Result<(), GenerationError> {
        self.indent += 1;
        let result = self.codegen_stmts(stmts);
        self.indent -= 1;
        result
    }

    fn codegen_stmt(&mut self, stmt: &Stmt) -> Result<(), GenerationError> {
        match stmt {
            Stmt::VarDeclaration(decl) => {
                self.codegen_var_declaration(&decl.identifier, &decl.expression)
            }
            Stmt::Assignment(assignment) => {
                let value = self.codegen_expr(&assignment.expression);
                let line = match &assignment.assignable {
                    Assignable::Identifier(ident) => format!("{} = {};", ident, value.code),
                    Assignable::IndexedIdentifier(target) => {
                        let index = self.codegen_expr(&target.index);
                        format!("{}[{}] = {};", target.identifier, index.code, value.code)
                    }
                };
                self.emit(&line);
                Ok(())
            }
            Stmt::Output(expr) => {
                let value = self.codegen_expr(expr);
                self.emit(&format!(
                    "printf(\"{}\\n\", {});",
                    value.ty.format_specifier(),
                    value.code
                ));
                Ok(())
            }
            Stmt::Return(expr) => self.codegen_return(expr),
            Stmt::FunctionCallStatement(call) => {
                let args = self.codegen_args(&call.arguments);
                self.emit(&format!("{}({});", call.name, args));
                Ok(())
            }
            Stmt::IfStatement(if_stmt) => self.codegen_if(if_stmt),
            Stmt::Loop(loop_stmt) => {
                // Loop conditions are never decided statically.
                let condition = self.codegen_expr(&loop_stmt.condition);
                self.emit(&format!("while ({}) {{", condition.code));
                self.codegen_block(&loop_stmt.block.stmts)?;
                self.emit("}");
                Ok(())
            }
            Stmt::FunctionDef(def) => self.codegen_function(def),
            Stmt::EmptyStatement(_) => {
                self.emit(";");
                Ok(())
            }
            Stmt::Block(stmts) => self.codegen_stmts(stmts),
        }
    }

    fn codegen_var_declaration(&mut self, ident: &str, expr: &Expr) -> Result<(), GenerationError> {
        let ty = match expr {
            Expr::ListExpression(list) => {
                let (element_type, elements) = self.codegen_list(list);
                self.emit(&format!(
                    "{} {}[] = {{{}}};",
                    element_type.c_type(),
                    ident,
                    join(&elements)
                ));
                // Indexed reads are inferred as int, so only the element type is recorded.
                element_type
            }
            expr => {
                let value = self.codegen_expr(expr);
                if value.ty.is_array() {
                    return Err(GenerationError::ArrayVariable(ident.to_string()));
                }
                self.emit(&format!("{} {} = {};", value.ty.c_type(), ident, value.code));
                value.ty
            }
        };
        trace!(ident, %ty, "declared variable");
        self.scope.insert(ident.to_string(), ty);
        Ok(())
    }

    fn codegen_return(&mut self, expr: &Expr) -> Result<(), GenerationError> {
        let value = self.codegen_expr(expr);
        if value.ty.is_array() {
            return Err(GenerationError::ArrayReturn(self.function_name().to_string()));
        }

        if let Some(function) = &mut self.function {
            let first = function
                .return_type
                .get_or_insert_with(|| value.ty.clone());
            if *first != value.ty {
                return Err(GenerationError::InconsistentReturnTypes {
                    function: function.name.clone(),
                    first: first.to_string(),
                    found: value.ty.to_string(),
                });
            }
        }

        self.emit(&format!("return {};", value.code));
        Ok(())
    }

    fn codegen_if(&mut self, if_stmt: &IfStatement) -> Result<(), GenerationError> {
        let (condition, decided) = match &if_stmt.condition {
            Expr::RelationalExpression(expr) => self.codegen_relational(expr),
            expr => (self.codegen_expr(expr), None),
        };

        match decided {
            Some(true) => {
                debug!(condition = %condition.code, "pruned else branch");
                self.codegen_stmts(&if_stmt.then.stmts)
            }
            Some(false) => {
                debug!(condition = %condition.code, "pruned then branch");
                match &if_stmt.else_block {
                    Some(else_block) => self.codegen_stmts(&else_block.stmts),
                    None => Ok(()),
                }
            }
            None => {
                self.emit(&format!("if ({}) {{", condition.code));
                self.codegen_block(&if_stmt.then.stmts)?;
                self.emit("}");
                if let Some(else_block) = &if_stmt.else_block {
                    self.emit("else {");
                    self.codegen_block(&else_block.stmts)?;
                    self.emit("}");
                }
                Ok(())
            }
        }
    }

    fn codegen_function(&mut self, def: &FunctionDef) -> Result<(), GenerationError> {
        let (body, return_type) = {
            let function = FunctionContext {
                name: def.name.clone(),
                return_type: None,
            };
            let mut cg = CodeGenerator::new(&mut *self.module, Some(function));
            for param in &def.parameters {
                // Parameters are always int.
                cg.scope.insert(param.clone(), Type::Int);
            }
            cg.codegen_stmts(&def.body.stmts)?;
            cg.finish_function()
        };

        let params = def
            .parameters
            .iter()
            .map(|param| format!("int {}", param))
            .collect::<Vec<_>>()
            .join(", ");
        let code = format!(
            "{} {}({}) {{\n{}}}\n\n",
            return_type.c_type(),
            def.name,
            params,
            body
        );
        debug!(function = %def.name, return_type = %return_type, "generated function");

        self.module.functions.push_str(&code);
        self.module.return_types.insert(def.name.clone(), return_type);
        Ok(())
    }
}

/* Expressions */
impl<'m> CodeGenerator<'m> {
    fn codegen_expr(&self, expr: &Expr) -> Fragment {
        match expr {
            Expr::IntegerLiteral(val) => Fragment::constant(Const::Int(*val)),
            Expr::FloatLiteral(val) => Fragment::constant(Const::Float(*val)),
            Expr::StringLiteral(lexeme) => {
                let text = lexeme
                    .strip_prefix('"')
                    .and_then(|text| text.strip_suffix('"'))
                    .unwrap_or(lexeme);
                Fragment::new(format!("\"{}\"", text), Type::Str)
            }
            Expr::Identifier(ident) => {
                let ty = self.scope.get(ident).cloned().unwrap_or(Type::Int);
                Fragment::new(ident.clone(), ty)
            }
            Expr::IndexedIdentifier(expr) => {
                let index = self.codegen_expr(&expr.index);
                Fragment::new(format!("{}[{}]", expr.identifier, index.code), Type::Int)
            }
            Expr::FunctionCall(call) => {
                let ty = self
                    .module
                    .return_types
                    .get(&call.name)
                    .cloned()
                    .unwrap_or(Type::Int);
                let args = self.codegen_args(&call.arguments);
                Fragment::new(format!("{}({})", call.name, args), ty)
            }
            Expr::Term(expr) | Expr::ArithmeticExpression(expr) => self.codegen_arithmetic(expr),
            Expr::RelationalExpression(expr) => self.codegen_relational(expr).0,
            Expr::UnaryExpression(expr) => {
                let operand = self.codegen_expr(&expr.operand);
                match operand.value.and_then(Const::negate) {
                    Some(value) => Fragment::constant(value),
                    None => Fragment::new(format!("(-{})", operand.code), operand.ty),
                }
            }
            Expr::ListExpression(list) => {
                let (element_type, elements) = self.codegen_list(list);
                Fragment::new(
                    format!("{{{}}}", join(&elements)),
                    Type::Array(Box::new(element_type)),
                )
            }
        }
    }

    fn codegen_arithmetic(&self, expr: &BinaryExpr) -> Fragment {
        let lhs = self.codegen_expr(&expr.left);
        let rhs = self.codegen_expr(&expr.right);

        let folded = match (lhs.value, rhs.value) {
            (Some(l), Some(r)) => Const::fold(expr.operator, l, r),
            _ => None,
        };
        match folded {
            Some(value) => {
                trace!(
                    lhs = %lhs.code,
                    op = expr.operator.symbol(),
                    rhs = %rhs.code,
                    result = %value.literal(),
                    "folded constant"
                );
                Fragment::constant(value)
            }
            None => Fragment::new(
                format!("({} {} {})", lhs.code, expr.operator.symbol(), rhs.code),
                Type::promote(&lhs.ty, &rhs.ty),
            ),
        }
    }

    /// Returns the comparison and, if both operands are constants, its outcome.
    fn codegen_relational(&self, expr: &BinaryExpr) -> (Fragment, Option<bool>) {
        let lhs = self.codegen_expr(&expr.left);
        let rhs = self.codegen_expr(&expr.right);

        let decided = match (lhs.value, rhs.value) {
            (Some(l), Some(r)) => Const::compare(expr.operator, l, r),
            _ => None,
        };
        let fragment = Fragment::new(
            format!("({} {} {})", lhs.code, expr.operator.symbol(), rhs.code),
            Type::Int,
        );
        (fragment, decided)
    }

    /// Returns the element type of a list literal and its generated elements.
    fn codegen_list(&self, list: &ListExpr) -> (Type, Vec<Fragment>) {
        let elements: Vec<Fragment> = list
            .elements
            .iter()
            .map(|element| self.codegen_expr(element))
            .collect();
        let element_type = match list.element_type {
            Some(ElementType::Int) | None => Type::Int,
            Some(ElementType::Float) => Type::Float,
            Some(ElementType::String) => Type::Str,
            // Names and calls take the type inferred for the first element.
            Some(ElementType::Identifier) | Some(ElementType::Unknown) => elements
                .first()
                .map(|element| element.ty.clone())
                .filter(|ty| !ty.is_array())
                .unwrap_or(Type::Int),
        };
        (element_type, elements)
    }

    fn codegen_args(&self, args: &[Expr]) -> String {
        let args: Vec<Fragment> = args.iter().map(|arg| self.codegen_expr(arg)).collect();
        join(&args)
    }
}

fn join(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|fragment| fragment.code.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shout_parser::{lexer::scan, parser::parse};

    fn compile(source: &str) -> String {
        generate(&parse(&scan(source).unwrap()).unwrap()).unwrap()
    }

    fn compile_error(source: &str) -> GenerationError {
        generate(&parse(&scan(source).unwrap()).unwrap()).unwrap_err()
    }

    /// Returns the lines of `main` between the opening brace and the trailing `return 0;`.
    fn main_body(source: &str) -> Vec<String> {
        let output = compile(source);
        let start = output.find("int main() {\n").unwrap() + "int main() {\n".len();
        let end = output.rfind("    return 0;\n}\n").unwrap();
        output[start..end].lines().map(str::to_string).collect()
    }

    #[test]
    fn test_program() {
        insta::assert_snapshot!(compile(r#"
            make x assign 2 add 3 multiply 4;
            make y assign x add 1.5;
            make name assign "shout";
            shout(y);
            shout(name);
        "#), @r###"
        #include <stdio.h>
        #include <string.h>

        int main() {
            int x = 14;
            double y = (x + 1.5);
            char* name = "shout";
            printf("%f\n", y);
            printf("%s\n", name);
            return 0;
        }
        "###);
    }

    #[test]
    fn test_functions() {
        insta::assert_snapshot!(compile(r#"
            def area(w, h) {
                return w multiply h;
            }
            def half(v) {
                return v divide 2.0;
            }
            def noop() {
                shout(1);
            }
            shout(area(2, 3));
            shout(half(5));
            call noop();
        "#), @r###"
        #include <stdio.h>
        #include <string.h>

        int area(int w, int h) {
            return (w * h);
        }

        double half(int v) {
            return (v / 2.0);
        }

        int noop() {
            printf("%d\n", 1);
            return 0;
        }

        int main() {
            printf("%d\n", area(2, 3));
            printf("%f\n", half(5));
            noop();
            return 0;
        }
        "###);
    }

    #[test]
    fn test_constant_folding() {
        assert_eq!(
            main_body("shout(2 add 3 multiply 4);"),
            vec!["    printf(\"%d\\n\", 14);"]
        );
        assert_eq!(
            main_body("shout(1 add 2.5);"),
            vec!["    printf(\"%f\\n\", 3.5);"]
        );
        assert_eq!(
            main_body("make q assign 7 divide 2; make r assign 7.0 divide 2;"),
            vec!["    int q = 3;", "    double r = 3.5;"]
        );
        assert_eq!(
            main_body("make n assign subtract 5; make m assign subtract n;"),
            vec!["    int n = -5;", "    int m = (-n);"]
        );
        assert_eq!(
            main_body("make a assign (1 add 2) multiply subtract 3;"),
            vec!["    int a = -9;"]
        );
        assert_eq!(
            main_body("make f assign 1.5 add 0.5;"),
            vec!["    double f = 2.0;"]
        );
    }

    #[test]
    fn test_int_overflow_is_not_folded() {
        assert_eq!(
            main_body("make x assign 2147483647 add 1; shout(x);"),
            vec!["    int x = (2147483647 + 1);", "    printf(\"%d\\n\", x);"]
        );
        assert_eq!(
            main_body("make y assign 2147483646 add 1;"),
            vec!["    int y = 2147483647;"]
        );
        assert_eq!(
            main_body("make z assign 65536 multiply 65536;"),
            vec!["    int z = (65536 * 65536);"]
        );
    }

    #[test]
    fn test_division_by_zero_is_not_folded() {
        assert_eq!(
            main_body("shout(10 divide 0);"),
            vec!["    printf(\"%d\\n\", (10 / 0));"]
        );
        assert_eq!(
            main_body("shout(1 add 10 divide 0);"),
            vec!["    printf(\"%d\\n\", (1 + (10 / 0)));"]
        );
    }

    #[test]
    fn test_dead_branch_elimination() {
        let output = compile("if (1 less_than 2) { shout(1); } else { shout(2); }");
        assert_eq!(
            main_body("if (1 less_than 2) { shout(1); } else { shout(2); }"),
            vec!["    printf(\"%d\\n\", 1);"]
        );
        assert!(!output.contains("if ("));
        assert!(!output.contains("else"));

        assert_eq!(
            main_body("if (1 greater_than 2) { shout(1); } else { shout(2); }"),
            vec!["    printf(\"%d\\n\", 2);"]
        );
        assert!(main_body("if (1 equal_to 2) { shout(1); }").is_empty());
        // operands that fold to constants are decided as well
        assert_eq!(
            main_body("if (1 add 1 less_than 3) { shout(1); }"),
            vec!["    printf(\"%d\\n\", 1);"]
        );
    }

    #[test]
    fn test_conditions_that_stay() {
        assert_eq!(
            main_body("make a assign 3; if (a greater_than 2) { shout(a); } else { shout(0); }"),
            vec![
                "    int a = 3;",
                "    if ((a > 2)) {",
                "        printf(\"%d\\n\", a);",
                "    }",
                "    else {",
                "        printf(\"%d\\n\", 0);",
                "    }",
            ]
        );
        // only relational conditions are decided statically
        assert_eq!(
            main_body("if (1 add 1) { shout(1); }"),
            vec!["    if (2) {", "        printf(\"%d\\n\", 1);", "    }"]
        );
        // loops are never decided statically
        assert_eq!(
            main_body("check (1 less_than 2) { shout(1); }"),
            vec![
                "    while ((1 < 2)) {",
                "        printf(\"%d\\n\", 1);",
                "    }"
            ]
        );
    }

    #[test]
    fn test_inconsistent_return_types() {
        let err = compile_error(
            "def f(a) { if (a less_than 1) { return 1; } else { return 2.5; } }",
        );
        assert_eq!(
            err,
            GenerationError::InconsistentReturnTypes {
                function: "f".to_string(),
                first: "int".to_string(),
                found: "float".to_string(),
            }
        );
        // the same types are fine
        compile("def g(a) { if (a less_than 1) { return 1; } return a; }");
    }

    #[test]
    fn test_pruned_branch_is_not_generated() {
        // the pruned `return 2.5;` takes no part in the return type
        let output =
            compile("def f() { if (1 less_than 2) { return 1; } else { return 2.5; } }");
        assert!(output.contains("int f() {\n    return 1;\n}\n"));
        assert!(!output.contains("2.5"));
    }

    #[test]
    fn test_array_return_is_rejected() {
        assert_eq!(
            compile_error("def f() { return [1, 2]; }"),
            GenerationError::ArrayReturn("f".to_string())
        );
        assert_eq!(
            compile_error("return [1];"),
            GenerationError::ArrayReturn("main".to_string())
        );
        assert_eq!(
            compile_error("make x assign subtract [1, 2];"),
            GenerationError::ArrayVariable("x".to_string())
        );
        // any other use of a list literal is emitted as is
        assert_eq!(
            main_body("shout([1, 2]);"),
            vec!["    printf(\"%s\\n\", {1, 2});"]
        );
    }

    #[test]
    fn test_function_scope_is_isolated() {
        let output = compile(
            "make x assign 1.5; def f() { return x; } shout(f()); shout(x);",
        );
        assert!(output.contains("int f() {\n    return x;\n}\n"));
        assert!(output.contains("    printf(\"%d\\n\", f());\n    printf(\"%f\\n\", x);\n"));

        let output = compile(
            "def g() { make y assign 2.5; return 1; } def h() { return y; }",
        );
        assert!(output.contains("int h() {"));
    }

    #[test]
    fn test_forward_references_default_to_int() {
        assert_eq!(
            main_body("shout(later()); def later() { return 2.5; } shout(later());"),
            vec![
                "    printf(\"%d\\n\", later());",
                "    printf(\"%f\\n\", later());"
            ]
        );
    }

    #[test]
    fn test_nested_function_definitions() {
        let output = compile(
            "def outer() { def inner() { return 1.5; } if (inner() greater_than 1) { return 1; } return 0; }",
        );
        let inner = output.find("double inner() {").unwrap();
        let outer = output.find("int outer() {").unwrap();
        assert!(inner < outer);
        assert!(output.contains(
            "int outer() {\n    if ((inner() > 1)) {\n        return 1;\n    }\n    return 0;\n}\n"
        ));
        assert_eq!(output.matches("int main() {").count(), 1);
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            main_body(
                "make xs assign [1.5, 2.5]; xs[1] assign 3.5; shout(xs[0]); shout(xs); make ys assign [1 add 1, 2];"
            ),
            vec![
                "    double xs[] = {1.5, 2.5};",
                "    xs[1] = 3.5;",
                "    printf(\"%d\\n\", xs[0]);",
                "    printf(\"%f\\n\", xs);",
                "    int ys[] = {2, 2};",
            ]
        );
        assert_eq!(
            main_body("make s assign \"a\"; make names assign [s, s];"),
            vec!["    char* s = \"a\";", "    char* names[] = {s, s};"]
        );
    }

    #[test]
    fn test_misc_statements() {
        assert_eq!(
            main_body("make i assign 0; i assign i add 1; ; call tick(i, 2.5);"),
            vec![
                "    int i = 0;",
                "    i = (i + 1);",
                "    ;",
                "    tick(i, 2.5);"
            ]
        );
        // a top-level return is emitted into main
        assert_eq!(main_body("return 3;"), vec!["    return 3;"]);
    }

    #[test]
    fn test_indentation_does_not_leak() {
        let output = compile(
            "make a assign 1; if (a less_than 2) { def f() { check (a less_than 1) { shout(a); } } shout(a); }",
        );
        assert!(output.contains(
            "int f() {\n    while ((a < 1)) {\n        printf(\"%d\\n\", a);\n    }\n    return 0;\n}\n"
        ));
        assert!(output.contains("    if ((a < 2)) {\n        printf(\"%d\\n\", a);\n    }\n"));
    }

    #[test]
    fn test_generate_json() {
        let output = generate_json(r#"{"Program": [{"Output": {"StringLiteral": "\"hi\""}}]}"#).unwrap();
        assert!(output.contains("    printf(\"%s\\n\", \"hi\");\n"));

        let err = generate_json(
            r#"{"Program": [{"Output": {"IntegerLiteral": 1}, "Return": {"IntegerLiteral": 1}}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GenerationError::MalformedAst(_)));
        assert!(matches!(
            generate_json(r#"{"Program": [{"Shout": {"IntegerLiteral": 1}}]}"#),
            Err(GenerationError::MalformedAst(_))
        ));
    }
}
