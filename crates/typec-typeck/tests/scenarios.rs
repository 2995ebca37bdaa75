//! End-to-end inference over small resolved programs.
//!
//! Programs are built directly with `ProgramBuilder`, the way the name
//! resolver would hand them over.

use pretty_assertions::assert_eq;
use typec_ast::{
    BinaryOp, NodeId, NodeKind, PrimitiveType, Program, ProgramBuilder, TypeDecl,
};
use typec_typeck::{
    collect_diagnostics, InferenceConfig, Primitive, Type, TypeContext, TypeErrorKind,
};

fn root(program: &Program) -> NodeId {
    program.root().expect("program has a root module")
}

/// `type Array<T> = class { fn clone() -> Array<T> }`
fn array_class(b: &mut ProgramBuilder) -> NodeId {
    let decl = b.reserve();
    let t = b.generic("T", None);
    let t_arg = b.reference("T", t, vec![]);
    let ret = b.reference("Array", decl, vec![t_arg]);
    let clone = b.method(&["clone"], vec![], Some(ret), None);
    let class = b.class_ty(vec![], vec![clone], vec![]);
    b.fill(
        decl,
        NodeKind::TypeDecl(TypeDecl {
            name: "Array".into(),
            generics: vec![t],
            definition: class,
        }),
    );
    b.item(decl)
}

/// `type Option<T> = variant { Some(value: T), None }`
fn option_variant(b: &mut ProgramBuilder) -> NodeId {
    let t = b.generic("T", None);
    let t_ref = b.reference("T", t, vec![]);
    let value = b.field("value", t_ref);
    let some = b.variant_ctor("Some", vec![value]);
    let none = b.variant_ctor("None", vec![]);
    let variant = b.variant_ty(vec![some, none]);
    let decl = b.type_decl("Option", vec![t], variant);
    b.item(decl)
}

#[test]
fn test_annotated_literal_takes_declared_type() {
    let mut b = ProgramBuilder::new();
    let ty = b.prim(PrimitiveType::U32);
    let init = b.int("10");
    let x = b.var("x", Some(ty), Some(init));
    b.item(x);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    let init_ty = ctx.get_type(&program, init);
    assert_eq!(init_ty, Type::primitive(Primitive::U32));

    let declared = ctx.get_type(&program, x);
    assert!(ctx.is_assignable(&program, &init_ty, &declared).success);
}

#[test]
fn test_generic_identity_call() {
    let mut b = ProgramBuilder::new();
    let t = b.generic("T", None);
    let param_ty = b.reference("T", t, vec![]);
    let x = b.param("x", Some(param_ty));
    let ret_ty = b.reference("T", t, vec![]);
    let body = b.ident("x", x);
    let id = b.function("id", vec![t], vec![x], Some(ret_ty), Some(body));
    b.item(id);

    let callee = b.ident("id", id);
    let five = b.int("5");
    let call = b.call(callee, vec![five]);
    let y = b.var("y", None, Some(call));
    b.item(y);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    assert_eq!(ctx.get_type(&program, call), Type::primitive(Primitive::I32));
    assert_eq!(ctx.get_type(&program, y).to_string(), "i32");

    let keys: Vec<String> = ctx
        .registry()
        .all_function_instantiations()
        .map(|f| f.key.clone())
        .collect();
    assert_eq!(keys, vec!["id<i32>".to_string()]);
}

#[test]
fn test_method_return_is_substituted() {
    let mut b = ProgramBuilder::new();
    let array = array_class(&mut b);
    let u32_ty = b.prim(PrimitiveType::U32);
    let arr_ty = b.reference("Array", array, vec![u32_ty]);
    let arr = b.var("arr", Some(arr_ty), None);
    b.item(arr);

    let arr_ref = b.ident("arr", arr);
    let member = b.member(arr_ref, "clone");
    let call = b.call(member, vec![]);
    let stmt = b.expr_stmt(call);
    b.item(stmt);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    assert_eq!(ctx.get_type(&program, call).to_string(), "Array<u32>");
    assert!(ctx.registry().class_instantiation("Array<u32>").is_some());
}

#[test]
fn test_variant_constructors() {
    let mut b = ProgramBuilder::new();
    let option = option_variant(&mut b);

    let base = b.ident("Option", option);
    let some = b.member(base, "Some");
    let lit = b.int("42");
    let call = b.call(some, vec![lit]);
    let i32_ty = b.prim(PrimitiveType::I32);
    let annotation = b.reference("Option", option, vec![i32_ty]);
    let o = b.var("o", Some(annotation), Some(call));
    b.item(o);

    let base = b.ident("Option", option);
    let none = b.member(base, "None");
    let n = b.var("n", None, Some(none));
    b.item(n);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    let constructed = ctx.get_type(&program, call);
    assert_eq!(constructed.to_string(), "Option.Some<i32>");

    let declared = ctx.get_type(&program, o);
    let result = ctx.is_assignable(&program, &constructed, &declared);
    assert!(result.success, "{:?}", result.message);

    assert_eq!(ctx.get_type(&program, none).to_string(), "Option.None<never>");
    let none_ty = ctx.get_type(&program, none);
    assert!(ctx.is_assignable(&program, &none_ty, &declared).success);
}

#[test]
fn test_constructor_arguments_are_invariant_against_their_variant() {
    let mut b = ProgramBuilder::new();
    let option = option_variant(&mut b);
    let base = b.ident("Option", option);
    let some = b.member(base, "Some");
    let lit = b.int("42u8");
    let call = b.call(some, vec![lit]);
    let o = b.var("o", None, Some(call));
    b.item(o);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    let small = ctx.get_type(&program, call);
    assert_eq!(small.to_string(), "Option.Some<u8>");

    let u8_ = Type::primitive(Primitive::U8);
    let u32_ = Type::primitive(Primitive::U32);
    let option_u8 = Type::reference(option, "Option", vec![u8_]);
    let option_u32 = Type::reference(option, "Option", vec![u32_]);

    assert!(ctx.is_assignable(&program, &small, &option_u8).success);
    assert!(!ctx.is_assignable(&program, &small, &option_u32).success);
    assert!(!ctx.is_assignable(&program, &option_u8, &option_u32).success);
}

#[test]
fn test_optional_chaining_on_nullable_base() {
    let mut b = ProgramBuilder::new();
    let array = array_class(&mut b);
    let u32_ty = b.prim(PrimitiveType::U32);
    let arr_ty = b.reference("Array", array, vec![u32_ty]);
    let nullable = b.nullable_ty(arr_ty);
    let arr = b.var("arr", Some(nullable), None);
    b.item(arr);

    let arr_ref = b.ident("arr", arr);
    let chained = b.optional_member(arr_ref, "clone");
    let chained_call = b.call(chained, vec![]);
    let first = b.expr_stmt(chained_call);
    b.item(first);

    let arr_ref = b.ident("arr", arr);
    let plain = b.member(arr_ref, "clone");
    let plain_call = b.call(plain, vec![]);
    let second = b.expr_stmt(plain_call);
    b.item(second);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    assert_eq!(ctx.get_type(&program, chained_call).to_string(), "Array<u32>?");

    let rejected = ctx.get_type(&program, plain);
    assert!(matches!(
        rejected.as_error().map(|e| &e.kind),
        Some(TypeErrorKind::NullableAccess { .. })
    ));

    let errors = collect_diagnostics(&mut ctx, &program, root(&program));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].node, plain);
}

fn struct_branches(b: &mut ProgramBuilder) -> (NodeId, NodeId) {
    let x = b.int("1");
    let y = b.int("2");
    let narrow = b.struct_lit(vec![("x", x), ("y", y)]);
    let x = b.int("1");
    let y = b.int("2");
    let z = b.int("3");
    let wide = b.struct_lit(vec![("x", x), ("y", y), ("z", z)]);
    (narrow, wide)
}

#[test]
fn test_struct_branches_narrow_to_shared_fields() {
    let mut b = ProgramBuilder::new();
    let (narrow, wide) = struct_branches(&mut b);
    let cond = b.bool(true);
    let conditional = b.conditional(cond, narrow, wide);
    let u32_x = b.prim(PrimitiveType::U32);
    let u32_y = b.prim(PrimitiveType::U32);
    let fx = b.field("x", u32_x);
    let fy = b.field("y", u32_y);
    let annotation = b.struct_ty(vec![fx, fy]);
    let p = b.var("p", Some(annotation), Some(conditional));
    b.item(p);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    assert_eq!(
        ctx.get_type(&program, conditional).to_string(),
        "struct {x: u32, y: u32}"
    );
    assert!(collect_diagnostics(&mut ctx, &program, root(&program)).is_empty());
}

#[test]
fn test_struct_branches_without_context() {
    let mut b = ProgramBuilder::new();
    let (narrow, wide) = struct_branches(&mut b);
    let cond = b.bool(false);
    let conditional = b.conditional(cond, narrow, wide);
    let p = b.var("p", None, Some(conditional));
    b.item(p);
    let program = b.finish();

    let config = InferenceConfig::default().with_default_int(Primitive::U32);
    let mut ctx = TypeContext::with_config(config);
    assert_eq!(
        ctx.get_type(&program, p).to_string(),
        "struct {x: u32, y: u32}"
    );
}

#[test]
fn test_recursive_function_return_inference() {
    // fn fact(n: u32) { if n == 0 { return 1 } return n * fact(n - 1) }
    let mut b = ProgramBuilder::new();
    let fact = b.reserve();
    let u32_ty = b.prim(PrimitiveType::U32);
    let n = b.param("n", Some(u32_ty));

    let n_ref = b.ident("n", n);
    let zero = b.int("0");
    let is_zero = b.binary(BinaryOp::Eq, n_ref, zero);
    let one = b.int("1");
    let base = b.ret(Some(one));
    let then_block = b.block(vec![base]);
    let guard = b.if_stmt(is_zero, then_block, None);

    let n_ref = b.ident("n", n);
    let one = b.int("1");
    let pred = b.binary(BinaryOp::Sub, n_ref, one);
    let callee = b.ident("fact", fact);
    let recursive = b.call(callee, vec![pred]);
    let n_ref = b.ident("n", n);
    let product = b.binary(BinaryOp::Mul, n_ref, recursive);
    let step = b.ret(Some(product));
    let body = b.block(vec![guard, step]);

    b.fill(
        fact,
        NodeKind::FunctionDecl(typec_ast::FunctionDecl {
            name: "fact".into(),
            generics: vec![],
            params: vec![n],
            return_type: None,
            body: Some(body),
            kind: typec_ast::FnKind::Fn,
        }),
    );
    b.item(fact);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    assert_eq!(ctx.get_type(&program, fact).to_string(), "fn(n: u32) -> i32");
    // the recursive call was only seen in progress; asked again it sees the
    // finished signature
    assert_eq!(ctx.get_type(&program, recursive), Type::primitive(Primitive::I32));
    assert_eq!(ctx.get_type(&program, pred), Type::primitive(Primitive::U32));
    assert!(collect_diagnostics(&mut ctx, &program, root(&program)).is_empty());
}

#[test]
fn test_function_that_only_recurses_never_returns() {
    let mut b = ProgramBuilder::new();
    let spin = b.reserve();
    let callee = b.ident("spin", spin);
    let call = b.call(callee, vec![]);
    let ret = b.ret(Some(call));
    let body = b.block(vec![ret]);
    b.fill(
        spin,
        NodeKind::FunctionDecl(typec_ast::FunctionDecl {
            name: "spin".into(),
            generics: vec![],
            params: vec![],
            return_type: None,
            body: Some(body),
            kind: typec_ast::FnKind::Fn,
        }),
    );
    b.item(spin);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    assert_eq!(ctx.get_type(&program, spin).to_string(), "fn() -> never");
}

#[test]
fn test_expression_bodied_recursion_never_returns() {
    let mut b = ProgramBuilder::new();
    let spin = b.reserve();
    let callee = b.ident("spin", spin);
    let call = b.call(callee, vec![]);
    b.fill(
        spin,
        NodeKind::FunctionDecl(typec_ast::FunctionDecl {
            name: "spin".into(),
            generics: vec![],
            params: vec![],
            return_type: None,
            body: Some(call),
            kind: typec_ast::FnKind::Fn,
        }),
    );
    b.item(spin);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    assert_eq!(ctx.get_type(&program, spin).to_string(), "fn() -> never");
    assert_eq!(ctx.get_type(&program, spin).to_string(), "fn() -> never");
    assert_eq!(ctx.get_type(&program, call), Type::never());
    assert!(collect_diagnostics(&mut ctx, &program, root(&program)).is_empty());
}

#[test]
fn test_lambda_parameters_follow_expected_signature() {
    let mut b = ProgramBuilder::new();
    let u32_param = b.prim(PrimitiveType::U32);
    let sig_param = b.param("x", Some(u32_param));
    let u32_ret = b.prim(PrimitiveType::U32);
    let signature = b.function_ty(vec![sig_param], Some(u32_ret), typec_ast::FnKind::Fn);

    let x = b.param("x", None);
    let body = b.ident("x", x);
    let lambda = b.lambda(vec![x], None, body);
    let f = b.var("f", Some(signature), Some(lambda));
    b.item(f);

    let bare = b.param("y", None);
    let bare_body = b.ident("y", bare);
    let orphan = b.lambda(vec![bare], None, bare_body);
    let g = b.var("g", None, Some(orphan));
    b.item(g);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    assert_eq!(ctx.get_type(&program, lambda).to_string(), "fn(x: u32) -> u32");

    let errors = collect_diagnostics(&mut ctx, &program, root(&program));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, TypeErrorKind::MissingAnnotation("y".into()));
}

#[test]
fn test_this_members_and_operator_methods() {
    // type Vec2 = class { x: f64; fn + add(other: Vec2) -> Vec2; fn getX() = this.x }
    let mut b = ProgramBuilder::new();
    let vec2 = b.reserve();
    let f64_ty = b.prim(PrimitiveType::F64);
    let x_attr = b.attribute("x", f64_ty);

    let other_ty = b.reference("Vec2", vec2, vec![]);
    let other = b.param("other", Some(other_ty));
    let ret_ty = b.reference("Vec2", vec2, vec![]);
    let add = b.method(&["+", "add"], vec![other], Some(ret_ty), None);

    let this = b.this();
    let this_x = b.member(this, "x");
    let get_x = b.method(&["getX"], vec![], None, Some(this_x));

    let class = b.class_ty(vec![x_attr], vec![add, get_x], vec![]);
    b.fill(
        vec2,
        NodeKind::TypeDecl(TypeDecl {
            name: "Vec2".into(),
            generics: vec![],
            definition: class,
        }),
    );
    b.item(vec2);

    let a_ty = b.reference("Vec2", vec2, vec![]);
    let a = b.var("a", Some(a_ty), None);
    b.item(a);
    let lhs = b.ident("a", a);
    let rhs = b.ident("a", a);
    let sum = b.binary(BinaryOp::Add, lhs, rhs);
    let s = b.var("s", None, Some(sum));
    b.item(s);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    assert_eq!(ctx.get_type(&program, get_x).to_string(), "fn() -> f64");
    assert_eq!(ctx.get_type(&program, sum).to_string(), "Vec2");
    assert!(collect_diagnostics(&mut ctx, &program, root(&program)).is_empty());
}

#[test]
fn test_new_infers_class_arguments_from_init() {
    // type Box<T> = class { value: T; fn init(value: T) }
    let mut b = ProgramBuilder::new();
    let t = b.generic("T", None);
    let attr_ty = b.reference("T", t, vec![]);
    let value = b.attribute("value", attr_ty);
    let param_ty = b.reference("T", t, vec![]);
    let param = b.param("value", Some(param_ty));
    let init = b.method(&["init"], vec![param], None, None);
    let class = b.class_ty(vec![value], vec![init], vec![]);
    let boxed = b.type_decl("Box", vec![t], class);
    b.item(boxed);

    let class_ref = b.node(NodeKind::ReferenceType(typec_ast::ReferenceType {
        name: "Box".into(),
        target: Some(boxed),
        args: vec![],
    }));
    let arg = b.int("7u8");
    let new = b.new_expr(class_ref, vec![arg]);
    let v = b.var("v", None, Some(new));
    b.item(v);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    assert_eq!(ctx.get_type(&program, new).to_string(), "Box<u8>");
    let keys: Vec<String> = ctx
        .registry()
        .all_class_instantiations()
        .map(|c| typec_typeck::mangle_name(&c.key))
        .collect();
    assert_eq!(keys, vec!["Box$u8".to_string()]);
}

#[test]
fn test_generic_method_call_is_registered_under_its_class() {
    // type Box<T> = class { fn pick<U>(value: U) -> U }
    let mut b = ProgramBuilder::new();
    let t = b.generic("T", None);
    let u = b.generic("U", None);
    let u_param = b.reference("U", u, vec![]);
    let value = b.param("value", Some(u_param));
    let u_ret = b.reference("U", u, vec![]);
    let pick = b.node(NodeKind::ClassMethod(typec_ast::ClassMethod {
        names: vec!["pick".into()],
        generics: vec![u],
        params: vec![value],
        return_type: Some(u_ret),
        body: None,
        is_static: false,
        kind: typec_ast::FnKind::Fn,
    }));
    let class = b.class_ty(vec![], vec![pick], vec![]);
    let boxed = b.type_decl("Box", vec![t], class);
    b.item(boxed);

    let u32_ty = b.prim(PrimitiveType::U32);
    let box_ty = b.reference("Box", boxed, vec![u32_ty]);
    let bx = b.var("bx", Some(box_ty), None);
    b.item(bx);
    let base = b.ident("bx", bx);
    let member = b.member(base, "pick");
    let arg = b.string("hello");
    let call = b.call(member, vec![arg]);
    let stmt = b.expr_stmt(call);
    b.item(stmt);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    assert_eq!(ctx.get_type(&program, call), Type::string());
    let methods: Vec<String> = ctx
        .registry()
        .method_instantiations("Box<u32>")
        .map(|m| m.key.clone())
        .collect();
    assert_eq!(methods, vec!["Box<u32>::pick<string>".to_string()]);
}

#[test]
fn test_conditional_without_common_type() {
    let mut b = ProgramBuilder::new();
    let cond = b.bool(true);
    let one = b.int("1");
    let text = b.string("a");
    let conditional = b.conditional(cond, one, text);
    let v = b.var("v", None, Some(conditional));
    b.item(v);
    let program = b.finish();

    let mut ctx = TypeContext::new();
    let errors = collect_diagnostics(&mut ctx, &program, root(&program));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].node, conditional);
    assert_eq!(
        errors[0].kind.to_string(),
        "no common type between i32, string"
    );
}
