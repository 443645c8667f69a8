use super::*;
use cq_core::Attribute;

fn definition() -> TableDefinition {
    TableDefinition::new(
        "ODS.BIDS",
        vec![
            Attribute::new("GTP_ID", "GTP_ID", true),
            Attribute::new("VOLUME", "VOL", false),
        ],
    )
}

#[test]
fn test_builtins_registered() {
    let registry = TransformRegistry::with_builtins();
    assert_eq!(registry.len(), 1);
    assert!(registry.contains("group"));
    assert!(!registry.is_empty());
    assert!(TransformRegistry::new().is_empty());
}

#[test]
fn test_dispatch_builtin() {
    let registry = TransformRegistry::with_builtins();
    let mut def = definition();
    registry.dispatch(&mut def, "group()").unwrap();
    assert_eq!(def.group_by, vec!["GTP_ID"]);
}

#[test]
fn test_dispatch_unknown_command() {
    let registry = TransformRegistry::with_builtins();
    let mut def = definition();
    let err = registry.dispatch(&mut def, "pivot(by=[A])").unwrap_err();
    assert!(matches!(err, TransformError::UnknownCommand { ref name } if name == "pivot"));
}

#[test]
fn test_dispatch_parse_error() {
    let registry = TransformRegistry::with_builtins();
    let mut def = definition();
    let err = registry.dispatch(&mut def, "group(by=").unwrap_err();
    assert!(matches!(err, TransformError::Parse { .. }));
}

#[test]
fn test_closure_handler_receives_alias() {
    let mut registry = TransformRegistry::new();
    registry.register(
        "get_const",
        |def: &mut TableDefinition, call: &TransformCall, alias: Option<&str>| -> TransformResult<()> {
            let value = call.args.first().map(|v| v.to_string()).unwrap_or_default();
            def.attributes
                .insert(0, Attribute::new(alias.unwrap_or("CONST"), value, false));
            Ok(())
        },
    );

    let mut def = definition();
    registry.dispatch(&mut def, "get_const(42) as ANSWER").unwrap();
    assert_eq!(def.attributes[0], Attribute::new("ANSWER", "42", false));

    let mut def = definition();
    registry.dispatch(&mut def, "get_const(7)").unwrap();
    assert_eq!(def.attributes[0].name, "CONST");
}

#[test]
fn test_from_config_registers_lookups() {
    let config: Config = serde_yaml::from_str(
        r#"
name: test
transforms:
  get_target_date:
    table: ODS_002.TRADE_SESSION
    on: "{{ base }}.TRADE_SESSION_ID = {{ alias }}.TRADE_SESSION_ID"
    value: TARGET_DATE
"#,
    )
    .unwrap();
    let registry = TransformRegistry::from_config(&config).unwrap();

    let names: Vec<&str> = registry.list().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["get_target_date", "group"]);

    let mut def = definition();
    registry
        .dispatch(&mut def, "get_target_date() as TARGET_DATE")
        .unwrap();
    assert_eq!(def.attributes[0].formula, "t2.TARGET_DATE");
    assert_eq!(def.tables.len(), 2);
}

#[test]
fn test_registry_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TransformRegistry>();
}
