//! Property value type checking
//!
//! `assignable_to` decides whether a property's parsed value list satisfies
//! a declared `PropertyType`. Built from small predicate combinators over
//! the token shapes in `dts_value`. Macros are optimistic: a bare macro
//! satisfies any scalar predicate, and a non-empty array made up entirely
//! of macros satisfies any array content requirement.

use crate::dts_value::DtsValue;
use crate::model::PropertyType;

fn is_string(v: &DtsValue) -> bool {
    matches!(v, DtsValue::String(_) | DtsValue::Macro)
}

fn is_int_or_expr(v: &DtsValue) -> bool {
    matches!(v, DtsValue::Int(_) | DtsValue::Expression | DtsValue::Macro)
}

fn is_phandle(v: &DtsValue) -> bool {
    matches!(v, DtsValue::PHandle | DtsValue::Macro)
}

fn is_byte(v: &DtsValue) -> bool {
    matches!(v, DtsValue::Byte(_) | DtsValue::Macro)
}

fn is_phandle_or_cell(v: &DtsValue) -> bool {
    is_phandle(v) || is_int_or_expr(v)
}

fn scalar(p: impl Fn(&DtsValue) -> bool) -> impl Fn(&[DtsValue]) -> bool {
    move |values| values.len() == 1 && p(&values[0])
}

fn list(p: impl Fn(&DtsValue) -> bool) -> impl Fn(&[DtsValue]) -> bool {
    move |values| values.iter().all(&p)
}

fn not_empty_list(p: impl Fn(&DtsValue) -> bool) -> impl Fn(&[DtsValue]) -> bool {
    move |values| !values.is_empty() && values.iter().all(&p)
}

/// Test the contents of a `<...>` cell array with `p`. Macro elements are
/// dropped before the test, but an array of nothing but macros is accepted
/// outright. A bare macro in array position also passes.
fn cell_array(p: impl Fn(&[DtsValue]) -> bool) -> impl Fn(&DtsValue) -> bool {
    move |value| match value {
        DtsValue::Macro => true,
        DtsValue::CellArray(elements) => array_contents(elements, &p),
        _ => false,
    }
}

/// Same macro handling as `cell_array`, for `[...]` byte arrays.
fn byte_array(p: impl Fn(&[DtsValue]) -> bool) -> impl Fn(&DtsValue) -> bool {
    move |value| match value {
        DtsValue::Macro => true,
        DtsValue::ByteArray(elements) => array_contents(elements, &p),
        _ => false,
    }
}

fn array_contents(elements: &[DtsValue], p: &impl Fn(&[DtsValue]) -> bool) -> bool {
    let concrete: Vec<DtsValue> = elements
        .iter()
        .filter(|e| !e.is_macro())
        .cloned()
        .collect();
    if !elements.is_empty() && concrete.is_empty() {
        return true;
    }
    p(&concrete)
}

/// Whether `values` (a property's parsed value list) satisfies `ty`.
pub fn assignable_to(values: &[DtsValue], ty: PropertyType) -> bool {
    match ty {
        PropertyType::String => scalar(is_string)(values),
        PropertyType::StringList => not_empty_list(is_string)(values),
        PropertyType::Int => scalar(cell_array(scalar(is_int_or_expr)))(values),
        PropertyType::Ints => list(cell_array(list(is_int_or_expr)))(values),
        PropertyType::Boolean => values.is_empty(),
        PropertyType::Bytes => scalar(byte_array(list(is_byte)))(values),
        PropertyType::PHandle => scalar(cell_array(scalar(is_phandle)))(values),
        PropertyType::PHandles => list(cell_array(list(is_phandle)))(values),
        PropertyType::PHandleList => list(cell_array(list(is_phandle_or_cell)))(values),
        PropertyType::Path => scalar(|v| is_string(v) || is_phandle(v))(values),
        PropertyType::Compound => true,
    }
}
