//! Runtime values.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{BlockStatement, Identifier, Node};
use crate::env::Environment;

#[derive(Debug, PartialEq, Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Null,
    Str(String),
    Array(Vec<Object>),
    Hash(HashMap<HashKey, HashPair>),

    /// Control-flow wrapper for `return`; unwrapped at call boundaries and
    /// at top level, never observable from the language.
    Return(Box<Object>),

    /// A runtime failure. Sticky: every evaluation step that sees one in an
    /// operand passes it along unchanged.
    Error(String),

    Function(Function),
    Builtin(Builtin),

    /// An AST fragment captured by the `quote` special form.
    Quote(Box<Node>),

    Macro(Macro),
}

/// A function value together with the environment it closed over.
#[derive(Clone)]
pub struct Function {
    pub params: Vec<Identifier>,
    pub body: BlockStatement,
    pub env: Rc<Environment>,
}

/// A macro definition: like a function, but its body runs over argument
/// syntax at expansion time.
#[derive(Clone)]
pub struct Macro {
    pub params: Vec<Identifier>,
    pub body: BlockStatement,
    pub env: Rc<Environment>,
}

// The captured environment can refer back to the function, so Debug must
// not descend into it.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("params", &self.params)
            .field("body", &self.body.to_string())
            .finish()
    }
}

impl fmt::Debug for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Macro")
            .field("params", &self.params)
            .field("body", &self.body.to_string())
            .finish()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.env, &other.env) && self.params == other.params && self.body == other.body
    }
}

impl PartialEq for Macro {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.env, &other.env) && self.params == other.params && self.body == other.body
    }
}

/// Native functions reachable by name when an identifier resolves nowhere
/// else. Dispatch lives in the evaluator, which owns the output writer
/// `puts` needs.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Builtin {
    Len,
    First,
    Last,
    Rest,
    Push,
    Puts,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "len" => Builtin::Len,
            "first" => Builtin::First,
            "last" => Builtin::Last,
            "rest" => Builtin::Rest,
            "push" => Builtin::Push,
            "puts" => Builtin::Puts,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::First => "first",
            Builtin::Last => "last",
            Builtin::Rest => "rest",
            Builtin::Push => "push",
            Builtin::Puts => "puts",
        }
    }
}

/// Index of a hash entry: the owning type's tag plus a 64-bit digest.
/// Two keys collide iff both components match.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct HashKey {
    kind: &'static str,
    value: u64,
}

/// A hash entry keeps the original key object around so `inspect` can show
/// it.
#[derive(Debug, PartialEq, Clone)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

// 64-bit FNV-1a over raw bytes.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

impl Object {
    /// Stable tag used in error messages and hash keys.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::Null => "NULL",
            Object::Str(_) => "STRING",
            Object::Array(_) => "ARRAY",
            Object::Hash(_) => "HASH",
            Object::Return(_) => "RETURN_VALUE",
            Object::Error(_) => "ERROR",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::Quote(_) => "QUOTE",
            Object::Macro(_) => "MACRO",
        }
    }

    /// The hash-map index for this object, if its kind is hashable.
    pub fn hash_key(&self) -> Option<HashKey> {
        let value = match self {
            Object::Integer(v) => *v as u64,
            Object::Boolean(b) => *b as u64,
            Object::Str(s) => fnv1a(s.as_bytes()),
            _ => return None,
        };
        Some(HashKey {
            kind: self.type_name(),
            value,
        })
    }

    /// Everything is truthy except `false` and `null`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(v) => write!(f, "{}", v),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::Null => write!(f, "null"),
            Object::Str(s) => write!(f, "{}", s),
            Object::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Object::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, pair) in pairs.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", pair.key, pair.value)?;
                }
                write!(f, "}}")
            }
            Object::Return(inner) => write!(f, "{}", inner),
            Object::Error(message) => write!(f, "ERROR: {}", message),
            Object::Function(function) => {
                write!(f, "fn(")?;
                for (i, param) in function.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") {{\n{}\n}}", function.body)
            }
            Object::Builtin(_) => write!(f, "builtin function"),
            Object::Quote(node) => write!(f, "QUOTE({})", node),
            Object::Macro(m) => {
                write!(f, "macro(")?;
                for (i, param) in m.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") {{\n{}\n}}", m.body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_hash_keys_depend_on_content() {
        let hello1 = Object::Str("Hello World".to_string());
        let hello2 = Object::Str("Hello World".to_string());
        let diff = Object::Str("My name is johnny".to_string());
        assert_eq!(hello1.hash_key(), hello2.hash_key());
        assert_ne!(hello1.hash_key(), diff.hash_key());
    }

    #[test]
    fn integer_and_boolean_hash_keys() {
        assert_eq!(Object::Integer(1).hash_key(), Object::Integer(1).hash_key());
        assert_ne!(Object::Integer(1).hash_key(), Object::Integer(2).hash_key());
        assert_eq!(
            Object::Boolean(true).hash_key(),
            Object::Boolean(true).hash_key()
        );
        assert_ne!(
            Object::Boolean(true).hash_key(),
            Object::Boolean(false).hash_key()
        );
    }

    #[test]
    fn hash_keys_of_different_types_do_not_collide() {
        // Boolean true digests to 1, same as integer 1; the type tag keeps
        // them apart.
        assert_ne!(Object::Integer(1).hash_key(), Object::Boolean(true).hash_key());
    }

    #[test]
    fn only_scalar_kinds_are_hashable() {
        assert!(Object::Null.hash_key().is_none());
        assert!(Object::Array(vec![]).hash_key().is_none());
        assert!(Object::Hash(HashMap::new()).hash_key().is_none());
    }

    #[test]
    fn truthiness() {
        assert!(!Object::Null.is_truthy());
        assert!(!Object::Boolean(false).is_truthy());
        assert!(Object::Boolean(true).is_truthy());
        assert!(Object::Integer(0).is_truthy());
        assert!(Object::Str(String::new()).is_truthy());
    }

    #[test]
    fn inspect_forms() {
        assert_eq!(Object::Integer(5).to_string(), "5");
        assert_eq!(Object::Boolean(true).to_string(), "true");
        assert_eq!(Object::Null.to_string(), "null");
        assert_eq!(Object::Str("monkey".to_string()).to_string(), "monkey");
        assert_eq!(
            Object::Array(vec![Object::Integer(1), Object::Integer(2)]).to_string(),
            "[1, 2]"
        );
        assert_eq!(
            Object::Error("type mismatch".to_string()).to_string(),
            "ERROR: type mismatch"
        );
        assert_eq!(
            Object::Return(Box::new(Object::Integer(7))).to_string(),
            "7"
        );
    }
}
