//! Plain demo classes: a counter, a value type, a comparable, a collection
//! and a static utility.

use std::any::Any;
use std::sync::Mutex;

use seqgen_core::operation::{arg, arg_int, arg_object, arg_str};
use seqgen_core::{CollectionView, CoreError, Instance, OperationRegistry, Thrown, TypeId, TypeRegistry, Value};

pub const COUNTER: &str = "demo.Counter";
pub const MONEY: &str = "demo.Money";
pub const VERSION: &str = "demo.Version";
pub const BAG: &str = "demo.Bag";
pub const MATH_UTIL: &str = "demo.MathUtil";

// ----------------------------------------------------------------------------
// Counter
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Counter {
    count: Mutex<i32>,
}

impl Counter {
    pub fn get(&self) -> i32 {
        self.count.lock().map(|c| *c).unwrap_or_default()
    }

    /// Fails an assertion on negative input.
    pub fn add(&self, amount: i32) -> Result<(), Thrown> {
        if amount < 0 {
            return Err(Thrown::new("java.lang.AssertionError", format!("negative amount {amount}")));
        }
        if let Ok(mut count) = self.count.lock() {
            *count = count.wrapping_add(amount);
        }
        Ok(())
    }
}

impl Instance for Counter {
    fn class_name(&self) -> &str {
        COUNTER
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_java_string(&self) -> Option<Result<String, Thrown>> {
        Some(Ok(format!("Counter({})", self.get())))
    }
}

// ----------------------------------------------------------------------------
// Money
// ----------------------------------------------------------------------------

/// Equal by amount and currency; `hashCode` is left at the identity default.
#[derive(Debug)]
pub struct Money {
    amount: i32,
    currency: String,
}

impl Money {
    pub fn new(amount: i32, currency: Option<&str>) -> Result<Self, Thrown> {
        let Some(currency) = currency else {
            return Err(Thrown::null_pointer());
        };
        Ok(Money { amount, currency: currency.to_string() })
    }
}

impl Instance for Money {
    fn class_name(&self) -> &str {
        MONEY
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &Value) -> Option<Result<bool, Thrown>> {
        let equal = other
            .downcast_ref::<Money>()
            .is_some_and(|o| o.amount == self.amount && o.currency == self.currency);
        Some(Ok(equal))
    }
}

// ----------------------------------------------------------------------------
// Version
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    major: i32,
    minor: i32,
}

impl Instance for Version {
    fn class_name(&self) -> &str {
        VERSION
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &Value) -> Option<Result<bool, Thrown>> {
        Some(Ok(other.downcast_ref::<Version>() == Some(self)))
    }

    fn hash_code(&self) -> Option<Result<i32, Thrown>> {
        Some(Ok(self.major.wrapping_mul(31).wrapping_add(self.minor)))
    }

    fn to_java_string(&self) -> Option<Result<String, Thrown>> {
        Some(Ok(format!("{}.{}", self.major, self.minor)))
    }

    fn compare_to(&self, other: &Value) -> Option<Result<i32, Thrown>> {
        Some(match other {
            Value::Null => Err(Thrown::null_pointer()),
            _ => match other.downcast_ref::<Version>() {
                Some(o) => Ok(self.cmp(o) as i32),
                None => Err(Thrown::class_cast(format!("{} cannot be cast to {VERSION}", other.kind_name()))),
            },
        })
    }
}

// ----------------------------------------------------------------------------
// Bag
// ----------------------------------------------------------------------------

/// An unordered collection that accepts anything, `null` included.
#[derive(Debug, Default)]
pub struct Bag {
    items: Mutex<Vec<Value>>,
}

impl Bag {
    pub fn add(&self, item: Value) -> bool {
        match self.items.lock() {
            Ok(mut items) => {
                items.push(item);
                true
            }
            Err(_) => false,
        }
    }

    fn snapshot(&self) -> Vec<Value> {
        self.items.lock().map(|items| items.clone()).unwrap_or_default()
    }
}

impl CollectionView for Bag {
    fn size(&self) -> Result<i32, Thrown> {
        Ok(self.snapshot().len() as i32)
    }

    fn to_array(&self) -> Result<Vec<Value>, Thrown> {
        Ok(self.snapshot())
    }
}

impl Instance for Bag {
    fn class_name(&self) -> &str {
        BAG
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_collection(&self) -> Option<&dyn CollectionView> {
        Some(self)
    }
}

// ----------------------------------------------------------------------------
// Registration
// ----------------------------------------------------------------------------

pub(crate) fn register(types: &mut TypeRegistry, ops: &mut OperationRegistry) -> Result<(), CoreError> {
    let counter = types.register_class(COUNTER, &[])?;
    let money = types.register_class(MONEY, &[])?;
    let version = types.register_class(VERSION, &[TypeId::OBJECT, TypeId::COMPARABLE])?;
    let bag = types.register_class(BAG, &[TypeId::OBJECT, TypeId::COLLECTION])?;
    let math = types.register_class(MATH_UTIL, &[])?;

    ops.constructor(types, counter, &[], |_| Ok(Value::object(Counter::default())))?;
    ops.method(types, counter, "add", &[TypeId::INT], TypeId::VOID, |args| {
        arg_object::<Counter>(args, 0)?.add(arg_int(args, 1)?)?;
        Ok(Value::Null)
    })?;
    ops.observer(types, counter, "get", TypeId::INT, |args| Ok(Value::Int(arg_object::<Counter>(args, 0)?.get())))?;

    ops.constructor(types, money, &[TypeId::INT, TypeId::STRING], |args| {
        Ok(Value::object(Money::new(arg_int(args, 0)?, arg_str(args, 1)?)?))
    })?;
    ops.observer(types, money, "getAmount", TypeId::INT, |args| {
        Ok(Value::Int(arg_object::<Money>(args, 0)?.amount))
    })?;
    ops.observer(types, money, "getCurrency", TypeId::STRING, |args| {
        Ok(Value::string(arg_object::<Money>(args, 0)?.currency.as_str()))
    })?;

    ops.constructor(types, version, &[TypeId::INT, TypeId::INT], |args| {
        Ok(Value::object(Version { major: arg_int(args, 0)?, minor: arg_int(args, 1)? }))
    })?;
    ops.observer(types, version, "getMajor", TypeId::INT, |args| {
        Ok(Value::Int(arg_object::<Version>(args, 0)?.major))
    })?;
    ops.method(types, version, "next", &[], version, |args| {
        let v = arg_object::<Version>(args, 0)?;
        Ok(Value::object(Version { major: v.major, minor: v.minor.wrapping_add(1) }))
    })?;

    ops.constructor(types, bag, &[], |_| Ok(Value::object(Bag::default())))?;
    ops.method(types, bag, "add", &[TypeId::OBJECT], TypeId::BOOLEAN, |args| {
        let item = arg(args, 1)?.clone();
        Ok(Value::Boolean(arg_object::<Bag>(args, 0)?.add(item)))
    })?;
    ops.observer(types, bag, "size", TypeId::INT, |args| Ok(Value::Int(arg_object::<Bag>(args, 0)?.size()?)))?;

    ops.static_method(types, math, "max", &[TypeId::INT, TypeId::INT], TypeId::INT, |args| {
        Ok(Value::Int(arg_int(args, 0)?.max(arg_int(args, 1)?)))
    })?;
    ops.static_method(types, math, "negate", &[TypeId::INT], TypeId::INT, |args| {
        Ok(Value::Int(arg_int(args, 0)?.wrapping_neg()))
    })?;
    ops.static_method(types, math, "divide", &[TypeId::INT, TypeId::INT], TypeId::INT, |args| {
        let (a, b) = (arg_int(args, 0)?, arg_int(args, 1)?);
        if b == 0 {
            return Err(Thrown::new(Thrown::ARITHMETIC, "/ by zero").into());
        }
        Ok(Value::Int(a.wrapping_div(b)))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_hash_is_inconsistent_with_equals() {
        let a = Value::object(Money::new(3, Some("EUR")).unwrap());
        let b = Value::object(Money::new(3, Some("EUR")).unwrap());
        assert!(a.java_equals(&b).unwrap());
        assert_ne!(a.java_hash_code().unwrap(), b.java_hash_code().unwrap());
    }

    #[test]
    fn counter_rejects_negative_amounts() {
        let c = Counter::default();
        c.add(2).unwrap();
        assert_eq!(c.get(), 2);
        assert_eq!(c.add(-1).unwrap_err().type_name, "java.lang.AssertionError");
    }

    #[test]
    fn version_orders_by_major_then_minor() {
        let a = Value::object(Version { major: 1, minor: 2 });
        let b = Value::object(Version { major: 1, minor: 3 });
        assert_eq!(a.java_compare_to(&b).unwrap().unwrap(), -1);
        assert!(matches!(a.java_compare_to(&Value::Null), Some(Err(_))));
    }

    #[test]
    fn bag_is_a_collection() {
        let bag = Bag::default();
        bag.add(Value::Int(1));
        bag.add(Value::Null);
        assert_eq!(bag.size().unwrap(), 2);
        assert_eq!(bag.to_array().unwrap().len(), 2);
    }
}
