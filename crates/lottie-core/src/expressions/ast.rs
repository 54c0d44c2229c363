#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
    /// `var name;` or `var name = init;` (`let`/`const` read the same).
    Var { name: String, init: Option<Expr> },
    Assign { name: String, value: Expr },
    Expr(Expr),
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Lit(Lit),
    Ident(String),
    Array(Vec<Expr>),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lit {
    Num(f64),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl Expr {
    pub(crate) fn as_str_lit(&self) -> Option<&str> {
        match self {
            Expr::Lit(Lit::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_num_lit(&self) -> Option<f64> {
        match self {
            Expr::Lit(Lit::Num(n)) => Some(*n),
            _ => None,
        }
    }

    pub(crate) fn is_ident(&self, name: &str) -> bool {
        matches!(self, Expr::Ident(s) if s == name)
    }

    /// `callee(args..)` where the callee is a bare identifier.
    pub(crate) fn as_named_call(&self, name: &str) -> Option<&[Expr]> {
        match self {
            Expr::Call { callee, args } if callee.is_ident(name) => Some(args),
            _ => None,
        }
    }

    /// `object.method(args..)`
    pub(crate) fn as_method_call(&self, method: &str) -> Option<(&Expr, &[Expr])> {
        match self {
            Expr::Call { callee, args } => match callee.as_ref() {
                Expr::Member { object, property } if property == method => Some((object, args)),
                _ => None,
            },
            _ => None,
        }
    }
}
