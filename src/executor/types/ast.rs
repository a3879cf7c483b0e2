//! Abstract Syntax Tree node types

use serde::{Deserialize, Serialize};

use super::values::Value;

/* ===================== Operators ===================== */

/// Unary prefix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitNot,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Compound assignment operator (`=`, `+=`, `??=`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    Add,
    #[serde(rename = "-=")]
    Sub,
    #[serde(rename = "*=")]
    Mul,
    #[serde(rename = "/=")]
    Div,
    #[serde(rename = "%=")]
    Rem,
    #[serde(rename = "**=")]
    Pow,
    #[serde(rename = "<<=")]
    Shl,
    #[serde(rename = ">>=")]
    Shr,
    #[serde(rename = "&=")]
    BitAnd,
    #[serde(rename = "^=")]
    BitXor,
    #[serde(rename = "|=")]
    BitOr,
    #[serde(rename = "&&=")]
    And,
    #[serde(rename = "||=")]
    Or,
    #[serde(rename = "??=")]
    Nullish,
}

impl AssignOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "=" => AssignOp::Assign,
            "+=" => AssignOp::Add,
            "-=" => AssignOp::Sub,
            "*=" => AssignOp::Mul,
            "/=" => AssignOp::Div,
            "%=" => AssignOp::Rem,
            "**=" => AssignOp::Pow,
            "<<=" => AssignOp::Shl,
            ">>=" => AssignOp::Shr,
            "&=" => AssignOp::BitAnd,
            "^=" => AssignOp::BitXor,
            "|=" => AssignOp::BitOr,
            "&&=" => AssignOp::And,
            "||=" => AssignOp::Or,
            "??=" => AssignOp::Nullish,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::Pow => "**=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitXor => "^=",
            AssignOp::BitOr => "|=",
            AssignOp::And => "&&=",
            AssignOp::Or => "||=",
            AssignOp::Nullish => "??=",
        }
    }

    /// The binary operator a compound assignment applies, `None` for plain `=`
    pub fn binary_op(&self) -> Option<BinaryOp> {
        let op = match self {
            AssignOp::Assign => return None,
            AssignOp::Add => BinaryOp::Add,
            AssignOp::Sub => BinaryOp::Sub,
            AssignOp::Mul => BinaryOp::Mul,
            AssignOp::Div => BinaryOp::Div,
            AssignOp::Rem => BinaryOp::Rem,
            AssignOp::Pow => BinaryOp::Pow,
            AssignOp::Shl => BinaryOp::Shl,
            AssignOp::Shr => BinaryOp::Shr,
            AssignOp::BitAnd => BinaryOp::BitAnd,
            AssignOp::BitXor => BinaryOp::BitXor,
            AssignOp::BitOr => BinaryOp::BitOr,
            AssignOp::And => BinaryOp::And,
            AssignOp::Or => BinaryOp::Or,
            AssignOp::Nullish => BinaryOp::Nullish,
        };
        Some(op)
    }
}

/// Binary operator
///
/// The parser emits assignment operators as right-associative binary
/// operators (`Assign`); normalization turns those into `Node::Assignment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    LooseEq,
    LooseNe,
    StrictEq,
    StrictNe,
    And,
    Or,
    Nullish,
    Assign(AssignOp),
}

impl BinaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "**" => BinaryOp::Pow,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            "<" => BinaryOp::Lt,
            ">" => BinaryOp::Gt,
            "<=" => BinaryOp::Le,
            ">=" => BinaryOp::Ge,
            "==" => BinaryOp::LooseEq,
            "!=" => BinaryOp::LooseNe,
            "===" => BinaryOp::StrictEq,
            "!==" => BinaryOp::StrictNe,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            "??" => BinaryOp::Nullish,
            other => return AssignOp::from_symbol(other).map(BinaryOp::Assign),
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::LooseEq => "==",
            BinaryOp::LooseNe => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Nullish => "??",
            BinaryOp::Assign(op) => op.as_str(),
        }
    }
}

impl From<BinaryOp> for String {
    fn from(op: BinaryOp) -> Self {
        op.as_str().to_string()
    }
}

impl TryFrom<String> for BinaryOp {
    type Error = String;

    fn try_from(symbol: String) -> Result<Self, Self::Error> {
        BinaryOp::from_symbol(&symbol).ok_or_else(|| format!("unsupported operator '{}'", symbol))
    }
}

/// `++` or `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOp {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

impl UpdateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

/* ===================== Nodes ===================== */

/// One raw-text segment of a template literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateElement {
    pub raw: String,
    pub tail: bool,
}

/// Object literal property; the key is a `Literal` once normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: Node,
    pub value: Node,
    /// `[expr]: value`; the key is an expression and is never rewritten
    #[serde(default)]
    pub computed: bool,
}

/// Expression AST node
///
/// Trees are immutable after normalization and can be resolved from several
/// threads at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Literal {
        /// Omitted from JSON when `undefined`, which JSON cannot express
        #[serde(default, skip_serializing_if = "Value::is_undefined")]
        value: Value,
        raw: String,
    },
    /// Script-local variable, not an external reference
    Identifier {
        name: String,
    },
    /// External `$(label:name)` reference
    VariableRef {
        name: String,
    },
    Unary {
        operator: UnaryOp,
        argument: Box<Node>,
        prefix: bool,
    },
    Binary {
        operator: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Conditional {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    Call {
        callee: String,
        arguments: Vec<Node>,
    },
    TemplateLiteral {
        quasis: Vec<TemplateElement>,
        expressions: Vec<Node>,
    },
    Compound {
        body: Vec<Node>,
    },
    Array {
        elements: Vec<Option<Node>>,
    },
    Object {
        properties: Vec<Property>,
    },
    Member {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
    },
    Return {
        argument: Box<Node>,
    },
    Assignment {
        operator: AssignOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Update {
        operator: UpdateOp,
        argument: Box<Node>,
        prefix: bool,
    },
}

impl Node {
    /// Variant name, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Literal { .. } => "Literal",
            Node::Identifier { .. } => "Identifier",
            Node::VariableRef { .. } => "VariableRef",
            Node::Unary { .. } => "Unary",
            Node::Binary { .. } => "Binary",
            Node::Conditional { .. } => "Conditional",
            Node::Call { .. } => "Call",
            Node::TemplateLiteral { .. } => "TemplateLiteral",
            Node::Compound { .. } => "Compound",
            Node::Array { .. } => "Array",
            Node::Object { .. } => "Object",
            Node::Member { .. } => "Member",
            Node::Return { .. } => "Return",
            Node::Assignment { .. } => "Assignment",
            Node::Update { .. } => "Update",
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Node::Identifier { name: name.into() }
    }

    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        Node::Literal {
            raw: format!("'{}'", value),
            value: Value::String(value),
        }
    }

    pub fn number(value: f64) -> Self {
        Node::Literal {
            raw: Value::Number(value).to_js_string(),
            value: Value::Number(value),
        }
    }

    pub fn is_identifier(&self, expected: &str) -> bool {
        matches!(self, Node::Identifier { name } if name == expected)
    }

    /// Whether `++`, `--` and assignments may target this node
    pub fn is_assignable(&self) -> bool {
        matches!(self, Node::Identifier { .. } | Node::Member { .. })
    }
}
