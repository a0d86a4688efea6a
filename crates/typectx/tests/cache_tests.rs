use super::*;
use rayon::prelude::*;
use typectx_common::{AssemblyDesc, ParameterDesc};

use crate::contextual::Nullability;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn assembly() -> Arc<AssemblyDesc> {
    Arc::new(AssemblyDesc::new("app.core"))
}

fn order_property(asm: &Arc<AssemblyDesc>) -> Arc<PropertyDesc> {
    let value = Arc::new(TypeDesc::class("Value", asm));
    let declaring = Arc::new(TypeDesc::class("Order", asm));
    Arc::new(PropertyDesc::new("Data", &value, &declaring).with_nullability(vec![true]))
}

#[test]
fn test_idempotent_until_clear() {
    init_tracing();
    let cache = ContextCache::new();
    let asm = assembly();
    let property = order_property(&asm);
    let ty = Arc::new(TypeDesc::class("Order", &asm));

    let first = cache.contextual_property(&property);
    let second = cache.contextual_property(&property);
    assert!(Arc::ptr_eq(&first, &second));

    let cached_first = cache.cached_type(&ty);
    let cached_second = cache.cached_type(&ty);
    assert!(Arc::ptr_eq(&cached_first, &cached_second));

    let ctx_first = cache.contextual_type(&ty);
    let ctx_second = cache.contextual_type(&ty);
    assert!(Arc::ptr_eq(&ctx_first, &ctx_second));
}

#[test]
fn test_clear_recomputes_value_equal_nodes() {
    let cache = ContextCache::new();
    let asm = assembly();
    let property = order_property(&asm);

    let before = cache.contextual_property(&property);
    cache.clear();
    assert!(cache.is_empty());

    let after = cache.contextual_property(&property);
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before.name(), after.name());
    assert_eq!(before.nullability(), after.nullability());
    assert_eq!(
        before.contextual_type().display_name(),
        after.contextual_type().display_name()
    );
}

#[test]
fn test_overloads_do_not_collide() {
    let cache = ContextCache::new();
    let asm = assembly();
    let declaring = Arc::new(TypeDesc::class("Service", &asm));
    let string = Arc::new(TypeDesc::class("String", &asm));
    let int = Arc::new(TypeDesc::value_type("Int32", &asm));

    let by_name = Arc::new(
        MethodDesc::new("find", &declaring)
            .with_parameters(vec![Arc::new(ParameterDesc::new("name", 0, &string))]),
    );
    let by_id = Arc::new(
        MethodDesc::new("find", &declaring)
            .with_parameters(vec![Arc::new(ParameterDesc::new("id", 0, &int))]),
    );

    let params_name = cache.contextual_parameters(&by_name);
    let params_id = cache.contextual_parameters(&by_id);

    assert_eq!(params_name.len(), 1);
    assert_eq!(params_id.len(), 1);
    assert_eq!(params_name[0].contextual_type().type_desc().name(), "String");
    assert_eq!(params_id[0].contextual_type().type_desc().name(), "Int32");

    // two distinct entries, both memoized
    assert_eq!(cache.len(), 2);
    assert!(Arc::ptr_eq(
        &params_name,
        &cache.contextual_parameters(&by_name)
    ));
}

#[test]
fn test_generics_cached_per_instantiation() {
    let cache = ContextCache::new();
    let asm = assembly();
    let declaring = Arc::new(TypeDesc::class("Service", &asm));
    let string = Arc::new(TypeDesc::class("String", &asm));
    let int = Arc::new(TypeDesc::value_type("Int32", &asm));

    let of_string =
        Arc::new(MethodDesc::new("make", &declaring).with_generic_args(vec![string.clone()]));
    let of_int = Arc::new(MethodDesc::new("make", &declaring).with_generic_args(vec![int]));

    let generics_string = cache.contextual_generics(&of_string);
    let generics_int = cache.contextual_generics(&of_int);

    assert_eq!(generics_string.len(), 1);
    assert_eq!(generics_string[0].name(), "String");
    assert_eq!(generics_int[0].name(), "Int32");
    assert!(Arc::ptr_eq(
        &generics_string,
        &cache.contextual_generics(&of_string)
    ));
}

#[test]
fn test_unsupported_member_inserts_nothing() {
    let cache = ContextCache::new();
    let asm = assembly();
    let declaring = Arc::new(TypeDesc::class("Service", &asm));
    let method = Arc::new(MethodDesc::new("run", &declaring));

    let result = cache.contextual_member(&MemberDesc::Method(method));
    match result {
        Err(MetadataError::UnsupportedMemberKind { name, kind }) => {
            assert_eq!(name, "run");
            assert_eq!(kind, "method");
        }
        Ok(_) => panic!("method members must be rejected"),
    }
    assert!(cache.is_empty());
}

#[test]
fn test_open_generic_bypasses_cache() {
    let cache = ContextCache::new();
    let asm = assembly();
    let param = Arc::new(TypeDesc::type_param("T"));
    let open_list = Arc::new(TypeDesc::class("List", &asm).with_generic_args(vec![param]));

    let first = cache.cached_type(&open_list);
    let second = cache.cached_type(&open_list);

    assert!(first.key().is_none());
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(cache.is_empty());
}

#[test]
fn test_ad_hoc_attributes_are_never_memoized() {
    let cache = ContextCache::new();
    let asm = assembly();
    let ty = Arc::new(TypeDesc::class("Value", &asm).with_attribute(Attribute::new("type.Marker")));

    let first = cache.contextual_type_with(&ty, vec![Attribute::new("adhoc.Marker")]);
    let second = cache.contextual_type_with(&ty, vec![Attribute::new("adhoc.Marker")]);

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(cache.is_empty());

    // supplied attributes come before the composed context set
    let paths: Vec<_> = first.attributes().iter().map(|a| a.path()).collect();
    assert_eq!(paths, vec!["adhoc.Marker", "type.Marker"]);
}

#[test]
fn test_properties_and_fields_union_skips_methods() {
    let cache = ContextCache::new();
    let asm = assembly();
    let string = Arc::new(TypeDesc::class("String", &asm));
    let int = Arc::new(TypeDesc::value_type("Int32", &asm));
    let ty = Arc::new(TypeDesc::class("Person", &asm));

    let name = Arc::new(PropertyDesc::new("Name", &string, &ty));
    let age = Arc::new(FieldDesc::new("Age", &int, &ty));
    let greet = Arc::new(MethodDesc::new("greet", &ty));
    ty.attach_members(vec![
        MemberDesc::Property(name.clone()),
        MemberDesc::Field(age.clone()),
        MemberDesc::Method(greet),
    ]);

    let members = cache.contextual_properties_and_fields(&ty);
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].name(), "Name");
    assert_eq!(members[1].name(), "Age");

    // the union shares the individually cached nodes
    match &members[0] {
        ContextualMemberInfo::Property(node) => {
            assert!(Arc::ptr_eq(node, &cache.contextual_property(&name)));
        }
        ContextualMemberInfo::Field(_) => panic!("first member is a property"),
    }
    match &members[1] {
        ContextualMemberInfo::Field(node) => {
            assert!(Arc::ptr_eq(node, &cache.contextual_field(&age)));
        }
        ContextualMemberInfo::Property(_) => panic!("second member is a field"),
    }
}

#[test]
fn test_concurrent_queries_share_one_node() {
    init_tracing();
    let cache = ContextCache::new();
    let asm = assembly();
    let property = order_property(&asm);

    let nodes: Vec<_> = (0..64)
        .into_par_iter()
        .map(|_| cache.contextual_property(&property))
        .collect();

    let first = &nodes[0];
    assert_eq!(first.nullability(), Nullability::Nullable);
    assert!(nodes.iter().all(|node| Arc::ptr_eq(first, node)));
    assert_eq!(cache.len(), 1);
}
