use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub const TYPE_STR_ANY: &str = "Any";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "Boolean";
pub const TYPE_STR_INT: &str = "Int";
pub const TYPE_STR_LONG: &str = "Long";
pub const TYPE_STR_FLOAT: &str = "Float";
pub const TYPE_STR_DOUBLE: &str = "Double";
pub const TYPE_STR_STRING: &str = "String";
pub const TYPE_STR_LIST: &str = "List";

/// Upcast helper so every `HostObject` can be downcast to its concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A caller-defined object that expressions can navigate.
///
/// The engine never inspects a host object directly. Its members are reached
/// through the resolvers registered on the evaluation context, usually the
/// `ReflectiveResolver` backed by a `TypeRegistry` entry for `type_name()`.
pub trait HostObject: AsAny + fmt::Debug + 'static {
    /// Runtime type name, used for member lookup and cache keys.
    fn type_name(&self) -> &str;

    /// Whether this object may stand in where `type_name` is expected.
    fn instance_of(&self, type_name: &str) -> bool {
        self.type_name() == type_name
    }
}

pub type ObjectRef = Rc<RefCell<dyn HostObject>>;

#[derive(Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    List(Vec<Value>),
    Object(ObjectRef),
}

impl Value {
    /// Wrap a host object so it can be used as a root object, variable or argument.
    pub fn object<T: HostObject>(obj: T) -> Self {
        Value::Object(Rc::new(RefCell::new(obj)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Double(_)
        )
    }

    /// Concrete runtime type of this value.
    ///
    /// Lists report the common element type of their items, or `Any` when the
    /// items disagree or the list is empty. A host object that is mutably
    /// borrowed at the time reports `Any` as well.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Int(_) => ValueType::Int,
            Value::Long(_) => ValueType::Long,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::List(items) => {
                let mut element: Option<ValueType> = None;
                for item in items {
                    let t = item.value_type();
                    match &element {
                        None => element = Some(t),
                        Some(e) if *e == t => {}
                        Some(_) => return ValueType::list_of(ValueType::Any),
                    }
                }
                ValueType::list_of(element.unwrap_or(ValueType::Any))
            }
            Value::Object(o) => match o.try_borrow() {
                Ok(obj) => ValueType::Object(obj.type_name().to_string()),
                Err(_) => ValueType::Any,
            },
        }
    }

    /// Name of the runtime type, as used by the type registry.
    ///
    /// A host object that is mutably borrowed while it is inspected (a setter
    /// re-entering evaluation on its own object) reports `Any`, which no
    /// registered type matches.
    pub fn type_name(&self) -> String {
        match self {
            Value::Object(o) => o
                .try_borrow()
                .map(|obj| obj.type_name().to_string())
                .unwrap_or_else(|_| TYPE_STR_ANY.to_string()),
            Value::List(_) => TYPE_STR_LIST.to_string(),
            _ => self.value_type().to_string(),
        }
    }

    /// Borrow the host object as `T` and apply `f`.
    ///
    /// Returns `None` if this is not an object of type `T` or it is already
    /// mutably borrowed.
    pub fn with_object<T: HostObject, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        match self {
            Value::Object(o) => {
                let obj = o.try_borrow().ok()?;
                (*obj).as_any().downcast_ref::<T>().map(f)
            }
            _ => None,
        }
    }

    /// Mutably borrow the host object as `T` and apply `f`.
    pub fn with_object_mut<T: HostObject, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        match self {
            Value::Object(o) => {
                let mut obj = o.try_borrow_mut().ok()?;
                (*obj).as_any_mut().downcast_mut::<T>().map(f)
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(l) => write!(f, "{}", l),
            Value::Float(x) => write!(f, "{}", x),
            Value::Double(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(o) => match o.try_borrow() {
                Ok(obj) => write!(f, "{:?}", &*obj),
                Err(_) => write!(f, "<borrowed object>"),
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Value::Null"),
            Value::Boolean(b) => write!(f, "Value::Boolean({})", b),
            Value::Int(i) => write!(f, "Value::Int({})", i),
            Value::Long(l) => write!(f, "Value::Long({})", l),
            Value::Float(x) => write!(f, "Value::Float({:?})", x),
            Value::Double(x) => write!(f, "Value::Double({:?})", x),
            Value::String(s) => write!(f, "Value::String({:?})", s),
            Value::List(items) => f.debug_tuple("Value::List").field(items).finish(),
            Value::Object(o) => match o.try_borrow() {
                Ok(obj) => write!(f, "Value::Object({})", obj.type_name()),
                Err(_) => write!(f, "Value::Object(...)"),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(l: i64) -> Self {
        Value::Long(l)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(x)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Double(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Runtime type descriptor used for method signatures, coercion targets and
/// resolution cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Any,
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    List(Box<ValueType>),
    Object(String),
}

impl ValueType {
    pub fn list_of(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    pub fn object(name: impl Into<String>) -> Self {
        ValueType::Object(name.into())
    }

    /// Position in the numeric widening order `Int < Long < Float < Double`.
    pub fn numeric_rank(&self) -> Option<u8> {
        match self {
            ValueType::Int => Some(0),
            ValueType::Long => Some(1),
            ValueType::Float => Some(2),
            ValueType::Double => Some(3),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Primitive types cannot hold `null`.
    pub fn is_primitive(&self) -> bool {
        self.is_numeric() || *self == ValueType::Boolean
    }

    pub fn element_type(&self) -> Option<&ValueType> {
        match self {
            ValueType::List(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => write!(f, "{}", TYPE_STR_ANY),
            ValueType::Null => write!(f, "{}", TYPE_STR_NULL),
            ValueType::Boolean => write!(f, "{}", TYPE_STR_BOOLEAN),
            ValueType::Int => write!(f, "{}", TYPE_STR_INT),
            ValueType::Long => write!(f, "{}", TYPE_STR_LONG),
            ValueType::Float => write!(f, "{}", TYPE_STR_FLOAT),
            ValueType::Double => write!(f, "{}", TYPE_STR_DOUBLE),
            ValueType::String => write!(f, "{}", TYPE_STR_STRING),
            ValueType::List(e) => write!(f, "{}<{}>", TYPE_STR_LIST, e),
            ValueType::Object(name) => write!(f, "{}", name),
        }
    }
}

/// Rust types an evaluation result can be extracted into.
pub trait FromValue: Sized {
    fn value_type() -> ValueType;

    /// Extract from a value already coerced to `value_type()`.
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    fn value_type() -> ValueType {
        ValueType::Any
    }

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for bool {
    fn value_type() -> ValueType {
        ValueType::Boolean
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i32 {
    fn value_type() -> ValueType {
        ValueType::Int
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn value_type() -> ValueType {
        ValueType::Long
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Long(l) => Some(l),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn value_type() -> ValueType {
        ValueType::Float
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(x),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn value_type() -> ValueType {
        ValueType::Double
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Double(x) => Some(x),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Account {
        owner: String,
    }

    impl HostObject for Account {
        fn type_name(&self) -> &str {
            "Account"
        }
    }

    impl HostObject for String {
        fn type_name(&self) -> &str {
            "String"
        }
    }

    #[test]
    fn test_list_type_uses_common_element_type() {
        let strings = Value::from(vec!["a", "b"]);
        assert_eq!(strings.value_type(), ValueType::list_of(ValueType::String));

        let mixed = Value::List(vec![Value::Int(1), Value::from("x")]);
        assert_eq!(mixed.value_type(), ValueType::list_of(ValueType::Any));

        let empty = Value::List(vec![]);
        assert_eq!(empty.value_type(), ValueType::list_of(ValueType::Any));
    }

    #[test]
    fn test_object_downcast_and_identity() {
        let a = Value::object(Account {
            owner: "ann".to_string(),
        });
        assert_eq!(a.type_name(), "Account");
        assert_eq!(a.with_object(|acc: &Account| acc.owner.clone()), Some("ann".to_string()));
        assert_eq!(a.with_object(|s: &String| s.len()), None);

        a.with_object_mut(|acc: &mut Account| acc.owner = "bob".to_string());
        assert_eq!(a.with_object(|acc: &Account| acc.owner.clone()), Some("bob".to_string()));

        let b = Value::object(Account {
            owner: "bob".to_string(),
        });
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_type_of_object_under_mutation() {
        let a = Value::object(Account {
            owner: "ann".to_string(),
        });
        let seen = a.with_object_mut(|acc: &mut Account| {
            acc.owner.push('!');
            (a.value_type(), a.type_name())
        });
        assert_eq!(seen, Some((ValueType::Any, TYPE_STR_ANY.to_string())));
        assert_eq!(a.value_type(), ValueType::object("Account"));
        assert_eq!(a.type_name(), "Account");
    }

    #[test]
    fn test_numeric_rank_orders_widening() {
        assert!(ValueType::Int.numeric_rank() < ValueType::Long.numeric_rank());
        assert!(ValueType::Long.numeric_rank() < ValueType::Float.numeric_rank());
        assert!(ValueType::Float.numeric_rank() < ValueType::Double.numeric_rank());
        assert_eq!(ValueType::String.numeric_rank(), None);
    }
}
