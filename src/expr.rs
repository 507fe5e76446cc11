// ABOUTME: Abstract expression tree, the parser's output and the evaluator's input

use crate::syntax::Syntax;
use std::rc::Rc;

/// A `cond` clause: the test expression (`None` for a literal `else`) and the
/// ordered body expressions evaluated when the clause is taken.
#[derive(Debug, Clone)]
pub struct CondClause {
    pub test: Option<Rc<Expr>>,
    pub body: Vec<Rc<Expr>>,
}

/// A single binding in a `let`/`letrec` form.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub expr: Rc<Expr>,
}

/// The resolved expression tree (§3 of the spec). Produced once per syntax
/// node by the parser; a closure's body is shared (`Rc`) across every
/// invocation and every re-capture of that closure.
#[derive(Debug, Clone)]
pub enum Expr {
    Fixnum(i64),
    RationalLit(i64, i64),
    StringLit(String),
    True,
    False,
    VoidLit,
    ExitLit,

    Var(String),
    Quote(Syntax),

    If(Rc<Expr>, Rc<Expr>, Rc<Expr>),
    Cond(Vec<CondClause>),
    Begin(Vec<Rc<Expr>>),
    And(Vec<Rc<Expr>>),
    Or(Vec<Rc<Expr>>),

    Lambda {
        params: Vec<String>,
        variadic: bool,
        body: Rc<Expr>,
    },
    Apply(Rc<Expr>, Vec<Rc<Expr>>),

    Define(String, Rc<Expr>),
    Set(String, Rc<Expr>),

    Let(Vec<Binding>, Rc<Expr>),
    Letrec(Vec<Binding>, Rc<Expr>),

    // Unary primitives
    Car(Rc<Expr>),
    Cdr(Rc<Expr>),
    Not(Rc<Expr>),
    IsBoolean(Rc<Expr>),
    IsFixnum(Rc<Expr>),
    IsNull(Rc<Expr>),
    IsPair(Rc<Expr>),
    IsProcedure(Rc<Expr>),
    IsSymbol(Rc<Expr>),
    IsString(Rc<Expr>),
    IsList(Rc<Expr>),
    Display(Rc<Expr>),

    // Binary primitives
    Modulo(Rc<Expr>, Rc<Expr>),
    Expt(Rc<Expr>, Rc<Expr>),
    Cons(Rc<Expr>, Rc<Expr>),
    IsEq(Rc<Expr>, Rc<Expr>),
    SetCar(Rc<Expr>, Rc<Expr>),
    SetCdr(Rc<Expr>, Rc<Expr>),

    // Variadic primitives
    Plus(Vec<Rc<Expr>>),
    Minus(Vec<Rc<Expr>>),
    Mul(Vec<Rc<Expr>>),
    Div(Vec<Rc<Expr>>),
    Less(Vec<Rc<Expr>>),
    LessEq(Vec<Rc<Expr>>),
    Equal(Vec<Rc<Expr>>),
    GreaterEq(Vec<Rc<Expr>>),
    Greater(Vec<Rc<Expr>>),
    ListCtor(Vec<Rc<Expr>>),
    MakeVoid(Vec<Rc<Expr>>),
}

impl Expr {
    /// Whether this expression is, syntactically, an explicit `void`
    /// invocation, recursively through the tails the REPL printing policy
    /// cares about (§6): the last expr of `begin`, both branches of `if`,
    /// and the taken-clause tails of `cond`.
    pub fn is_explicit_void_tail(&self) -> bool {
        match self {
            Expr::VoidLit | Expr::MakeVoid(_) => true,
            Expr::Begin(exprs) => exprs.last().is_some_and(|e| e.is_explicit_void_tail()),
            Expr::If(_, then, els) => then.is_explicit_void_tail() || els.is_explicit_void_tail(),
            Expr::Cond(clauses) => clauses
                .iter()
                .any(|c| c.body.last().is_some_and(|e| e.is_explicit_void_tail())),
            _ => false,
        }
    }

    /// Whether this expression is, syntactically, a `display` invocation,
    /// under the same tail-recursion rule as above.
    pub fn is_display_tail(&self) -> bool {
        match self {
            Expr::Display(_) => true,
            Expr::Begin(exprs) => exprs.last().is_some_and(|e| e.is_display_tail()),
            Expr::If(_, then, els) => then.is_display_tail() || els.is_display_tail(),
            Expr::Cond(clauses) => clauses
                .iter()
                .any(|c| c.body.last().is_some_and(|e| e.is_display_tail())),
            _ => false,
        }
    }
}
