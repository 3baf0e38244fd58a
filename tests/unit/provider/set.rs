use std::cell::Cell;

use super::*;
use crate::lang::StandardCompiler;
use crate::program::resolver::{SCALE_ID, SOURCE_ID};

fn set_of(sources: &[&str]) -> ProgramSet {
    let mut set = ProgramSet::new(Rc::new(StandardCompiler::new()));
    for s in sources {
        set.add_program(ParameterStore::new(*s)).unwrap();
    }
    set
}

fn rows(set: &ProgramSet) -> Vec<(String, usize)> {
    set.table().iter().map(|e| (e.id.clone(), e.owner)).collect()
}

#[test]
fn merged_table_orders_inline_parameters() {
    let mut set = set_of(&[
        "extern a expr = \"0\"; extern c expr = \"0\"; var x = a + b + c",
        "extern a expr = \"0\"; extern b expr = \"0\"; extern c expr = \"0\"; \
         extern d expr = \"0\"; var x = a + b + c + d",
    ]);
    set.add_exclusive_parameter("b");
    assert_eq!(
        rows(&set),
        vec![
            (SOURCE_ID.to_owned(), 0),
            (SCALE_ID.to_owned(), 0),
            ("a".to_owned(), 0),
            ("b".to_owned(), 0),
            ("b".to_owned(), 1),
            ("c".to_owned(), 0),
            ("d".to_owned(), 1),
        ]
    );
}

#[test]
fn shared_edit_reaches_every_program() {
    let mut set = set_of(&[
        "extern a int = 0; var x = a",
        "extern a int = 0; extern b int = 2; var x = a * b",
    ]);
    assert!(set.set_parameter("a", None, Some(Value::Int(7))).unwrap());
    assert_eq!(set.program(0).unwrap().value("a"), Some(&Value::Int(7)));
    assert_eq!(set.program(1).unwrap().value("a"), Some(&Value::Int(7)));
    assert_eq!(set.parameter_value("a", 1), Some(&Value::Int(7)));

    assert!(set.set_parameter("a", None, None).unwrap());
    assert!(set.program(0).unwrap().store().is_default("a"));
    assert!(set.program(1).unwrap().store().is_default("a"));
}

#[test]
fn exclusive_edit_with_owner_stays_local() {
    let src = "extern a int = 0; var x = a";
    let mut set = set_of(&[src, src]);
    set.add_exclusive_parameter("a");
    assert!(set.is_exclusive("a"));
    assert!(!set.is_shared("a"));

    assert!(set.set_parameter("a", Some(1), Some(Value::Int(3))).unwrap());
    assert_eq!(set.program(0).unwrap().value("a"), Some(&Value::Int(0)));
    assert_eq!(set.program(1).unwrap().value("a"), Some(&Value::Int(3)));
    assert_eq!(set.parameter_value("a", 0), Some(&Value::Int(0)));
    assert_eq!(set.parameter_value("a", 1), Some(&Value::Int(3)));

    assert!(set.remove_exclusive_parameter("a"));
    assert!(!set.remove_exclusive_parameter("a"));
    assert_eq!(set.parameter_value("a", 1), Some(&Value::Int(0)));
}

#[test]
fn conflicting_types_are_rejected_before_any_change() {
    let mut set = set_of(&[
        "extern a int = 0; var x = a",
        "extern a bool = true; var x = a",
    ]);
    let err = set.set_parameter("a", None, Some(Value::Int(1))).unwrap_err();
    assert!(matches!(err, ParamError::TypeCast { .. }));
    assert_eq!(set.program(0).unwrap().value("a"), Some(&Value::Int(0)));
    assert!(!set.program(0).unwrap().can_go_back());
}

#[test]
fn expr_parameters_tolerate_other_types() {
    let mut set = set_of(&[
        "extern a int = 0; var x = a",
        "var x = a + 1",
    ]);
    assert_eq!(
        set.program(1).unwrap().parameter("a").unwrap().ptype,
        ParameterType::Expr
    );
    assert!(set.set_parameter("a", None, Some(Value::Int(4))).unwrap());
    assert_eq!(set.program(0).unwrap().value("a"), Some(&Value::Int(4)));
    assert_eq!(
        set.program(1).unwrap().value("a"),
        Some(&Value::Expr("4".to_owned()))
    );
}

#[test]
fn failed_compile_in_one_program_rolls_back_all() {
    let mut set = set_of(&[
        "extern a expr = \"true\"; var x = a == a",
        "extern a expr = \"true\"; var x = a && true",
    ]);
    let before = set.program(0).unwrap().store().clone();
    let err = set
        .set_parameter("a", None, Some(Value::Expr("1".to_owned())))
        .unwrap_err();
    assert!(err.is_compile_error());
    assert_eq!(set.program(0).unwrap().store(), &before);
    assert!(!set.program(0).unwrap().can_go_back());
}

#[test]
fn unknown_parameter_and_bad_owner() {
    let mut set = set_of(&["extern a int = 0; var x = a"]);
    assert!(matches!(
        set.set_parameter("zzz", None, Some(Value::Int(1))),
        Err(ParamError::UnknownParameter(id)) if id == "zzz"
    ));
    set.add_exclusive_parameter("a");
    assert!(matches!(
        set.set_parameter("a", Some(3), Some(Value::Int(1))),
        Err(ParamError::IndexOutOfRange { index: 3, len: 1 })
    ));
    assert!(matches!(
        set.program(5),
        Err(ParamError::IndexOutOfRange { index: 5, len: 1 })
    ));
}

#[test]
fn key_index_follows_removals() {
    let mut set = set_of(&["var x = 1", "var x = 2", "var x = 3"]);
    assert_eq!(set.key_index(), Some(0));
    set.set_key_index(2).unwrap();
    assert_eq!(set.traversal_order(), vec![2, 0, 1]);

    set.remove_program(0).unwrap();
    assert_eq!(set.key_index(), Some(1));
    set.remove_program(1).unwrap();
    assert_eq!(set.key_index(), Some(0));
    set.remove_program(0).unwrap();
    assert_eq!(set.key_index(), None);
    assert!(set.traversal_order().is_empty());
    assert!(set.table().is_empty());
}

#[test]
fn table_listeners_fire_on_invalidation() {
    let mut set = set_of(&["extern a int = 0; var x = a"]);
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    let id = set.add_table_listener(move |s| {
        assert_eq!(s.program_count(), 1);
        h.set(h.get() + 1);
    });

    set.set_parameter("a", None, Some(Value::Int(1))).unwrap();
    assert_eq!(hits.get(), 1);
    set.add_exclusive_parameter("a");
    assert!(!set.add_exclusive_parameter("a"));
    assert_eq!(hits.get(), 2);

    assert!(set.remove_table_listener(id));
    set.set_parameter("a", Some(0), Some(Value::Int(2))).unwrap();
    assert_eq!(hits.get(), 2);
}

#[test]
fn program_listeners_and_history_through_the_set() {
    let mut set = set_of(&["extern a int = 0; var x = a"]);
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    let id = set.add_listener(0, move |_| h.set(h.get() + 1)).unwrap();

    set.set_parameter("a", None, Some(Value::Int(1))).unwrap();
    assert_eq!(hits.get(), 1);
    assert!(set.history_back(0).unwrap());
    assert_eq!(set.parameter_value("a", 0), Some(&Value::Int(0)));
    assert!(set.history_forward(0).unwrap());
    assert_eq!(set.parameter_value("a", 0), Some(&Value::Int(1)));
    assert!(!set.history_forward(0).unwrap());
    assert_eq!(hits.get(), 3);

    assert!(set.remove_listener(0, id).unwrap());
    assert!(!set.remove_listener(0, id).unwrap());
}

#[test]
fn table_is_rebuilt_after_store_replacement() {
    let mut set = set_of(&["extern a int = 0; var x = a"]);
    assert_eq!(set.table().len(), 3);
    set.set_program_store(0, ParameterStore::new("extern a int = 0; extern b int = 0; var x = a + b"))
        .unwrap();
    assert_eq!(set.table().len(), 4);
    assert!(set.table().entry("b", 0).is_some());
}
