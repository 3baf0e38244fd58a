use std::rc::Rc;

use super::*;
use crate::lang::StandardCompiler;
use crate::param::store::ParameterStore;

fn programs(sources: &[&str]) -> Vec<Program> {
    let compiler: Rc<dyn crate::lang::Compiler> = Rc::new(StandardCompiler::new());
    sources
        .iter()
        .map(|s| Program::new(compiler.clone(), ParameterStore::new(*s)).unwrap())
        .collect()
}

fn exclusive(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| (*s).to_owned()).collect()
}

fn rows(table: &ParameterTable) -> Vec<(String, usize)> {
    table.iter().map(|e| (e.id.clone(), e.owner)).collect()
}

#[test]
fn move_range_is_a_block_move() {
    let mut v = vec!['a', 'b', 'c', 'd', 'e'];
    move_range(&mut v, 2, 4, 1);
    assert_eq!(v, vec!['a', 'c', 'd', 'b', 'e']);

    let mut v = vec![1, 2, 3, 4, 5, 6];
    move_range(&mut v, 3, 6, 0);
    assert_eq!(v, vec![4, 5, 6, 1, 2, 3]);

    let mut v = vec![1, 2, 3];
    move_range(&mut v, 1, 2, 1);
    assert_eq!(v, vec![1, 2, 3]);
}

#[test]
fn extern_order_inserts_before_known_keys() {
    let p = programs(&[
        "extern a expr = \"0\"; extern c expr = \"0\"; var x = a + b + c",
        "extern a expr = \"0\"; extern b expr = \"0\"; extern c expr = \"0\"; \
         extern d expr = \"0\"; var x = a + b + c + d",
    ]);
    assert_eq!(
        extern_order(&p, &[0, 1]),
        vec![SOURCE_ID, SCALE_ID, "a", "b", "c", "d"]
    );
    assert_eq!(
        extern_order(&p, &[1, 0]),
        vec![SOURCE_ID, SCALE_ID, "a", "b", "c", "d"]
    );
}

#[test]
fn extern_order_places_new_ids_before_the_next_known_one() {
    let p = programs(&[
        "extern b int = 0; extern a int = 0; var x = a + b",
        "extern a int = 0; extern z int = 0; extern b int = 0; var x = a + b + z",
    ]);
    assert_eq!(
        extern_order(&p, &[0, 1]),
        vec![SOURCE_ID, SCALE_ID, "z", "b", "a"]
    );
}

#[test]
fn shared_and_exclusive_rows() {
    let src = "extern a int = 0; extern b int = 1; var c = a + b";
    let p = programs(&[src, src]);
    let table = ParameterTable::build(&p, &[0, 1], &exclusive(&["b"]));
    assert_eq!(
        rows(&table),
        vec![
            (SOURCE_ID.to_owned(), 0),
            (SCALE_ID.to_owned(), 0),
            ("a".to_owned(), 0),
            ("b".to_owned(), 0),
            ("b".to_owned(), 1),
        ]
    );
    assert!(table.get(2).unwrap().shared);
    assert!(!table.get(4).unwrap().shared);
    assert_eq!(table.position("b", 1), Some(4));
    assert_eq!(table.position("a", 1), Some(2));
    assert_eq!(table.position("nope", 0), None);
}

#[test]
fn inline_parameters_follow_their_declared_neighbour() {
    let p = programs(&[
        "extern a expr = \"0\"; extern c expr = \"0\"; var x = a + b + c",
        "extern a expr = \"0\"; extern b expr = \"0\"; extern c expr = \"0\"; \
         extern d expr = \"0\"; var x = a + b + c + d",
    ]);
    let table = ParameterTable::build(&p, &[0, 1], &exclusive(&["b"]));
    let ids: String = table.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, "SourceScaleabbcd");
}

#[test]
fn runs_move_with_their_key() {
    let p = programs(&[
        "extern k int = 0; var x = k + u + v",
        "extern j int = 0; extern k int = 0; var x = j + k + w",
    ]);
    let table = ParameterTable::build(&p, &[0, 1], &BTreeSet::new());
    let ids: Vec<&str> = table.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec![SOURCE_ID, SCALE_ID, "j", "k", "u", "v", "w"]);
}

#[test]
fn key_program_leads() {
    let p = programs(&[
        "extern a int = 0; var x = a",
        "extern b int = 0; var x = b",
    ]);
    let table = ParameterTable::build(&p, &[1, 0], &BTreeSet::new());
    assert_eq!(
        rows(&table),
        vec![
            (SOURCE_ID.to_owned(), 1),
            (SCALE_ID.to_owned(), 1),
            ("b".to_owned(), 1),
            ("a".to_owned(), 0),
        ]
    );
}

#[test]
fn empty_set_has_empty_table() {
    let table = ParameterTable::build(&[], &[], &BTreeSet::new());
    assert!(table.is_empty());
    assert_eq!(table.len(), 0);
    assert!(table.get(0).is_none());
}
