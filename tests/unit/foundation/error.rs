use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ParamError::syntax(3, "x")
            .to_string()
            .contains("syntax error at byte 3:")
    );
    assert!(
        ParamError::type_error("x")
            .to_string()
            .contains("type error:")
    );
    assert!(
        ParamError::type_cast(ParameterType::Int, "true")
            .to_string()
            .contains("type cast error:")
    );
    assert!(
        ParamError::unsupported("x")
            .to_string()
            .contains("unsupported operation:")
    );
    assert!(
        ParamError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn compile_error_family() {
    assert!(ParamError::syntax(0, "x").is_compile_error());
    assert!(ParamError::type_error("x").is_compile_error());
    assert!(
        ParamError::UnknownType {
            id: "a".to_owned(),
            type_name: "quat".to_owned(),
        }
        .is_compile_error()
    );
    assert!(!ParamError::unsupported("x").is_compile_error());
    assert!(!ParamError::IndexOutOfRange { index: 2, len: 1 }.is_compile_error());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ParamError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
