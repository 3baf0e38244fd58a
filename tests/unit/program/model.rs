use std::cell::Cell;

use super::*;
use crate::foundation::core::Cplx;
use crate::lang::{StandardCompiler, opcode};
use crate::param::ptype::ParameterType;

fn compiler() -> Rc<dyn Compiler> {
    Rc::new(StandardCompiler::new())
}

fn program(src: &str) -> Program {
    Program::new(compiler(), ParameterStore::new(src)).unwrap()
}

fn ids(p: &Program) -> Vec<String> {
    p.required_parameters().iter().map(|r| r.id.to_string()).collect()
}

fn counter(p: &mut Program) -> Rc<Cell<usize>> {
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    p.add_listener(move |_| h.set(h.get() + 1));
    hits
}

#[test]
fn reset_restores_default_code() {
    let mut p = program("extern a int = 1; var x = a;");
    let default_code = p.code().to_vec();
    assert_eq!(default_code, vec![opcode::CONST_INT, 1, opcode::STORE, 0]);

    assert!(p.set_value("a", Some(Value::Int(2))).unwrap());
    assert_eq!(p.code()[1], 2);
    assert!(!p.parameter("a").unwrap().is_default);

    assert!(p.set_value("a", None).unwrap());
    assert_eq!(p.code(), default_code.as_slice());
    assert!(p.parameter("a").unwrap().is_default);
    assert!(p.store().is_default("a"));
}

#[test]
fn expr_parameter_override() {
    let mut p = program("extern a expr = \"0\"; var d = a");
    p.set_value("a", Some(Value::Expr("1".to_owned()))).unwrap();
    assert_eq!(ids(&p), vec![SOURCE_ID, SCALE_ID, "a"]);
    let a = p.parameter("a").unwrap();
    assert_eq!(a.value, Value::Expr("1".to_owned()));
    assert!(!a.is_default);
    assert_eq!(p.code(), &[opcode::CONST_INT, 1, opcode::STORE, 0]);
}

#[test]
fn source_and_scale_come_first() {
    let p = program("var y = 2; extern a int = 0; var x = a");
    assert_eq!(ids(&p), vec![SOURCE_ID, SCALE_ID, "a"]);
    let source = p.parameter(SOURCE_ID).unwrap();
    assert_eq!(source.ptype, ParameterType::Source);
    assert_eq!(source.value.as_str(), Some(p.source()));
    assert_eq!(p.scale(), Scale::DEFAULT);
    assert!(p.parameter(SCALE_ID).unwrap().is_default);
}

#[test]
fn unused_externs_are_not_required() {
    let p = program("extern a int = 0; extern b int = 1; var x = b");
    assert_eq!(ids(&p), vec![SOURCE_ID, SCALE_ID, "b"]);
    assert_eq!(p.extern_declarations().len(), 2);
}

#[test]
fn repeated_identifiers_resolve_once() {
    let p = program("extern a int = 1; var x = a + a * a");
    assert_eq!(ids(&p), vec![SOURCE_ID, SCALE_ID, "a"]);
}

#[test]
fn declared_extern_shadows_builtin() {
    let p = program("extern sin int = 3; var x = sin");
    assert_eq!(p.code(), &[opcode::CONST_INT, 3, opcode::STORE, 0]);
    assert_eq!(p.parameter("sin").unwrap().ptype, ParameterType::Int);
}

#[test]
fn builtins_are_not_parameters() {
    let p = program("var x = sin(1.0)");
    assert_eq!(ids(&p), vec![SOURCE_ID, SCALE_ID]);
}

#[test]
fn inline_identifiers_become_expr_parameters() {
    let mut p = program("extern a \"Alpha\" int = 1; var x = a + foo");
    let foo = p.parameter("foo").unwrap();
    assert_eq!(foo.ptype, ParameterType::Expr);
    assert_eq!(foo.value, Value::Expr("0".to_owned()));
    assert_eq!(foo.description, "Alpha");
    assert!(foo.is_default);

    p.set_value("foo", Some(Value::Int(5))).unwrap();
    assert_eq!(p.value("foo"), Some(&Value::Expr("5".to_owned())));
    assert_eq!(
        p.code(),
        &[
            opcode::CONST_INT,
            1,
            opcode::CONST_INT,
            5,
            opcode::ADD,
            opcode::STORE,
            0,
        ]
    );
}

#[test]
fn inline_parameters_see_program_variables() {
    let mut p = program("var x = 3; var y = k");
    p.set_value("k", Some(Value::Expr("x * 2".to_owned())))
        .unwrap();
    assert_eq!(
        &p.code()[4..],
        &[
            opcode::LOAD,
            0,
            opcode::CONST_INT,
            2,
            opcode::MUL,
            opcode::STORE,
            1,
        ]
    );
}

#[test]
fn failed_edit_rolls_back() {
    let mut p = program("extern a expr = \"1\"; var x = a");
    let hits = counter(&mut p);
    let before = p.store().clone();
    let code = p.code().to_vec();

    let err = p
        .set_value(SOURCE_ID, Some(Value::Source("var x = ".to_owned())))
        .unwrap_err();
    assert!(err.is_compile_error());
    let err = p
        .set_value("a", Some(Value::Expr("1 +".to_owned())))
        .unwrap_err();
    assert!(err.is_compile_error());
    let err = p
        .set_value("a", Some(Value::Expr("true + 1".to_owned())))
        .unwrap_err();
    assert!(err.is_compile_error());

    assert_eq!(p.store(), &before);
    assert_eq!(p.code(), code.as_slice());
    assert!(!p.can_go_back());
    assert_eq!(hits.get(), 0);
}

#[test]
fn construction_fails_on_bad_programs() {
    let bad = |src: &str| Program::new(compiler(), ParameterStore::new(src)).unwrap_err();
    assert!(matches!(bad("var = 1"), ParamError::Syntax { .. }));
    assert!(matches!(
        bad("extern a quat = 1; var x = a"),
        ParamError::UnknownType { .. }
    ));
    assert!(matches!(bad("extern a int = 1.5; var x = a"), ParamError::Type(_)));
    assert!(matches!(bad("var x = Scale"), ParamError::Unsupported(_)));
    assert!(matches!(
        bad("extern j scale = [1, 0, 0, 1, 0, 0]; var x = j"),
        ParamError::Unsupported(_)
    ));
}

#[test]
fn stored_value_of_other_type_is_ignored() {
    let store = ParameterStore::new("extern a int = 1; var x = a")
        .with_value("a", ParameterType::Real, Value::Real(2.5))
        .unwrap();
    let p = Program::new(compiler(), store).unwrap();
    let a = p.parameter("a").unwrap();
    assert_eq!(a.value, Value::Int(1));
    assert!(a.is_default);
}

#[test]
fn scale_precedence() {
    let declared = program("extern Scale scale = [1, 0, 0, 1, -0.5, 0]; var x = 1");
    assert_eq!(declared.scale(), Scale::new(1.0, 0.0, 0.0, 1.0, -0.5, 0.0));
    assert!(declared.parameter(SCALE_ID).unwrap().is_default);
    assert!(declared.scales().is_empty());

    let zoomed = Scale::scaled(0.25);
    let store = ParameterStore::new("extern Scale scale = [1, 0, 0, 1, 0, 0]; var x = 1")
        .with_value(SCALE_ID, ParameterType::Scale, Value::Scale(zoomed))
        .unwrap();
    let stored = Program::new(compiler(), store).unwrap();
    assert_eq!(stored.scale(), zoomed);
    assert!(!stored.parameter(SCALE_ID).unwrap().is_default);

    let opts = ProgramOpts {
        default_scale: Scale::scaled(4.0),
    };
    let plain = Program::with_opts(compiler(), opts, ParameterStore::new("var x = 1")).unwrap();
    assert_eq!(plain.scale(), Scale::scaled(4.0));
}

#[test]
fn extra_scales_are_listed_in_declaration_order() {
    let p = program(
        "extern j scale = [1, 0, 0, 1, 0.5, 0]; extern k scale = [2, 0, 0, 2, 0, 0]; var x = 1",
    );
    assert_eq!(
        p.scales(),
        &[
            Scale::new(1.0, 0.0, 0.0, 1.0, 0.5, 0.0),
            Scale::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0),
        ]
    );
}

#[test]
fn palette_ordinals_follow_resolution_order() {
    let p = program(
        "extern p palette = [#f00, #0f0]; extern q palette = #00f; \
         var x = y; var c = q(0:0) + p(x:1)",
    );
    let reference = program("var x = y; var c = palette(0, 0:0) + palette(1, x:1)");
    assert_eq!(p.code(), reference.code());

    assert_eq!(p.palettes().len(), 2);
    assert_eq!(p.palettes()[0].colors(), &[0xff0000ff]);
    assert_eq!((p.palettes()[1].width(), p.palettes()[1].height()), (1, 2));
    assert_eq!(ids(&p), vec![SOURCE_ID, SCALE_ID, "y", "q", "p"]);
}

#[test]
fn palette_reuse_keeps_its_ordinal() {
    let p = program("extern p palette = 1; var a = p(0:0); var b = p(1:1)");
    let reference = program("var a = palette(0, 0:0); var b = palette(0, 1:1)");
    assert_eq!(p.code(), reference.code());
    assert_eq!(p.palettes().len(), 1);
}

#[test]
fn history_navigation() {
    let mut p = program("extern a int = 1; var x = a");
    let hits = counter(&mut p);
    p.set_value("a", Some(Value::Int(2))).unwrap();
    p.set_value("a", Some(Value::Int(3))).unwrap();
    assert_eq!(hits.get(), 2);

    assert!(p.history_back().unwrap());
    assert_eq!(p.value("a"), Some(&Value::Int(2)));
    assert!(p.history_back().unwrap());
    assert_eq!(p.value("a"), Some(&Value::Int(1)));
    assert!(!p.history_back().unwrap());
    assert_eq!(hits.get(), 4);

    assert!(p.history_forward().unwrap());
    assert_eq!(p.value("a"), Some(&Value::Int(2)));
    assert!(p.can_go_forward());

    p.set_value("a", Some(Value::Int(7))).unwrap();
    assert!(!p.can_go_forward());
    assert!(!p.history_forward().unwrap());
    assert!(p.history_back().unwrap());
    assert_eq!(p.value("a"), Some(&Value::Int(2)));
}

#[test]
fn history_covers_source_edits() {
    let mut p = program("extern a int = 1; var x = a");
    p.set_value(SOURCE_ID, Some(Value::Source("var x = 5".to_owned())))
        .unwrap();
    assert_eq!(ids(&p), vec![SOURCE_ID, SCALE_ID]);
    assert!(p.history_back().unwrap());
    assert_eq!(ids(&p), vec![SOURCE_ID, SCALE_ID, "a"]);
}

#[test]
fn staged_edit_applies_only_on_commit() {
    let mut p = program("extern c cplx = 0:0; var z = c");
    let hits = counter(&mut p);
    let edit = p
        .stage_value("c", Some(Value::Cplx(Cplx::new(1.0, 1.0))))
        .unwrap()
        .unwrap();
    assert!(p.parameter("c").unwrap().is_default);
    assert_eq!(hits.get(), 0);
    assert!(!edit.store().is_default("c"));

    p.commit(edit);
    assert_eq!(p.value("c"), Some(&Value::Cplx(Cplx::new(1.0, 1.0))));
    assert_eq!(hits.get(), 1);
}

#[test]
fn unknown_ids_are_ignored() {
    let mut p = program("var x = 1");
    assert!(!p.set_value("nope", Some(Value::Int(1))).unwrap());
    assert!(p.stage_value("nope", None).unwrap().is_none());
}

#[test]
fn expr_parameters_take_extreme_numbers_exactly() {
    let mut p = program("extern a expr = \"0\"; var x = a");
    let before = ids(&p);

    assert!(p.set_value("a", Some(Value::Int(i32::MIN))).unwrap());
    assert_eq!(p.value("a"), Some(&Value::Expr("-2147483648".to_owned())));
    assert_eq!(p.code(), &[opcode::CONST_INT, i32::MIN, opcode::STORE, 0]);
    assert_eq!(ids(&p), before);

    let store = p.store().clone();
    let hits = counter(&mut p);
    for v in [f64::NAN, f64::INFINITY] {
        let err = p.set_value("a", Some(Value::Real(v))).unwrap_err();
        assert!(matches!(
            err,
            ParamError::TypeCast {
                expected: ParameterType::Expr,
                ..
            }
        ));
    }
    assert_eq!(p.store(), &store);
    assert_eq!(ids(&p), before);
    assert_eq!(hits.get(), 0);
}

#[test]
fn type_mismatch_on_set_is_a_cast_error() {
    let mut p = program("extern b bool = true; var x = b");
    let err = p.set_value("b", Some(Value::Int(1))).unwrap_err();
    assert!(matches!(
        err,
        ParamError::TypeCast {
            expected: ParameterType::Bool,
            ..
        }
    ));
}

#[test]
fn listeners_can_be_removed() {
    let mut p = program("extern a int = 1; var x = a");
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    let id = p.add_listener(move |prog| {
        assert_eq!(prog.value("a"), Some(&Value::Int(2)));
        h.set(h.get() + 1);
    });
    p.set_value("a", Some(Value::Int(2))).unwrap();
    assert!(p.remove_listener(id));
    assert!(!p.remove_listener(id));
    p.set_value("a", Some(Value::Int(3))).unwrap();
    assert_eq!(hits.get(), 1);
}

#[test]
fn parameter_degrees_inherit_previous_declaration() {
    let p = program("extern a int = 0; extern b int = 1; var c = b + z + a");
    assert_eq!(
        p.parameter_degrees(),
        vec![
            (SOURCE_ID.to_owned(), -1),
            (SCALE_ID.to_owned(), -1),
            ("b".to_owned(), 1),
            ("z".to_owned(), 1),
            ("a".to_owned(), 0),
        ]
    );
}

#[test]
fn recompile_keeps_history_unchanged() {
    let mut p = program("var x = 1");
    let hits = counter(&mut p);
    p.recompile().unwrap();
    assert_eq!(hits.get(), 1);
    assert!(!p.can_go_back());
}
