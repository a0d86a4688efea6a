use super::*;
use crate::compose::{build_generic, build_property};
use typectx_common::AssemblyDesc;

fn assembly() -> Arc<AssemblyDesc> {
    Arc::new(AssemblyDesc::new("app.core"))
}

fn mapping_property(asm: &Arc<AssemblyDesc>) -> Arc<PropertyDesc> {
    let key = Arc::new(TypeDesc::value_type("Key", asm));
    let value = Arc::new(TypeDesc::class("Value", asm));
    let mapping = Arc::new(TypeDesc::class("Mapping", asm).with_generic_args(vec![key, value]));
    let declaring = Arc::new(TypeDesc::class("Order", asm));
    Arc::new(
        PropertyDesc::new("Lookup", &mapping, &declaring).with_nullability(vec![false, true]),
    )
}

#[test]
fn test_display_name_marks_nullable_slots() {
    let asm = assembly();
    let node = build_property(&mapping_property(&asm));

    assert_eq!(node.display_name(), "Mapping<Key, Value?>");
}

#[test]
fn test_display_name_nullable_value_and_array() {
    let asm = assembly();
    let int = Arc::new(TypeDesc::value_type("Int32", &asm));
    let optional = Arc::new(TypeDesc::nullable_value(&int));
    let array = Arc::new(TypeDesc::array(&int));
    let declaring = Arc::new(TypeDesc::class("Order", &asm));

    let optional_node = build_property(&Arc::new(PropertyDesc::new(
        "Count", &optional, &declaring,
    )));
    assert_eq!(optional_node.display_name(), "Int32?");

    let array_node = build_property(&Arc::new(PropertyDesc::new("Ids", &array, &declaring)));
    assert_eq!(array_node.display_name(), "Int32[]");
}

#[test]
fn test_attribute_lookup_prefers_nearest_declaration() {
    let asm = assembly();
    let declaring = Arc::new(
        TypeDesc::class("Order", &asm)
            .with_attribute(Attribute::new("json.Name").with_arg("origin", "type")),
    );
    let value = Arc::new(TypeDesc::class("Value", &asm));
    let property = Arc::new(
        PropertyDesc::new("Data", &value, &declaring)
            .with_attribute(Attribute::new("json.Name").with_arg("origin", "member")),
    );

    let node = build_property(&property);

    let nearest = node.attribute("json.Name").expect("declared twice");
    assert_eq!(nearest.arg("origin"), Some("member"));

    let origins: Vec<_> = node
        .attributes_named("json.Name")
        .filter_map(|a| a.arg("origin"))
        .collect();
    assert_eq!(origins, vec!["member", "type"]);
}

#[test]
fn test_generic_info_name_is_lazy_and_memoized() {
    let asm = assembly();
    let declaring = Arc::new(TypeDesc::class("Service", &asm));
    let string = Arc::new(TypeDesc::class("String", &asm));
    let method =
        Arc::new(MethodDesc::new("make", &declaring).with_generic_args(vec![string.clone()]));

    let info = ContextualGenericInfo::new(
        method.clone(),
        0,
        Arc::new(build_generic(&string, &method)),
    );

    let first = info.name();
    let second = info.name();
    assert_eq!(first, "String");
    // memoized per node: both reads see the same allocation
    assert_eq!(first.as_ptr(), second.as_ptr());
    assert_eq!(info.position(), 0);
    assert_eq!(info.method().name(), "make");
}

#[test]
fn test_member_union_exposes_common_accessors() {
    let asm = assembly();
    let property = mapping_property(&asm);
    let node = Arc::new(ContextualPropertyInfo::new(
        property.clone(),
        Arc::new(build_property(&property)),
    ));
    let member = ContextualMemberInfo::Property(node);

    assert_eq!(member.name(), "Lookup");
    assert_eq!(member.declaring_type().name(), "Order");
    assert_eq!(member.nullability(), Nullability::NotNullable);
    assert_eq!(member.contextual_type().display_name(), "Mapping<Key, Value?>");
}
