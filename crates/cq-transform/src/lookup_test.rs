use super::*;
use cq_core::Config;

const CONFIG: &str = r#"
name: test
transforms:
  get_real_trader_id:
    table: ODS_001.TRADER
    on: "{{ base }}.{{ original_field }} = {{ alias }}.{{ join_field }} AND {{ date_field }} between {{ alias }}.BEGIN_DATE and {{ alias }}.END_DATE"
    value: REAL_TRADER_ID
    params:
      original_field: GTP_ID
      join_field: REAL_TRADER_ID
      date_field: TARGET_DATE
      filter_trader_type: 100
      filter_dpg_type: ~
      filter_impex: ~
    filters:
      - "{{ alias }}.TRADER_TYPE = {{ filter_trader_type }}"
      - "{% if filter_dpg_type is not none %}{{ alias }}.DPG_TYPE = {{ filter_dpg_type }}{% endif %}"
      - "{% if filter_impex is not none %}{{ alias }}.IS_IMPEX = {{ filter_impex }}{% endif %}"
  get_target_date:
    table: ODS_002.TRADE_SESSION
    on: "{{ base }}.TRADE_SESSION_ID = {{ alias }}.TRADE_SESSION_ID AND {{ alias }}.VALID_TO_DTTM = '5999-12-31'"
    value: TARGET_DATE
"#;

fn lookup(name: &str) -> LookupTransform {
    let config: Config = serde_yaml::from_str(CONFIG).unwrap();
    LookupTransform::new(
        name,
        config.transforms[name].clone(),
        config.alias_rewriter(),
    )
    .unwrap()
}

fn definition() -> TableDefinition {
    TableDefinition::new(
        "ODS.BIDS",
        vec![Attribute::new("VOLUME", "VOL", false)],
    )
}

fn apply(name: &str, text: &str, target: Option<&str>) -> TransformResult<TableDefinition> {
    let mut def = definition();
    let call = TransformCall::parse(text)?;
    lookup(name).apply(&mut def, &call, target)?;
    Ok(def)
}

#[test]
fn test_lookup_joins_with_next_alias() {
    let def = apply("get_real_trader_id", "get_real_trader_id()", Some("TRADER_ID")).unwrap();

    assert_eq!(def.tables.len(), 2);
    assert_eq!(def.tables[1].alias, "t2");
    assert_eq!(def.tables[1].name, "ODS_001.TRADER");
    assert_eq!(
        def.tables[1].join_clause,
        "\tINNER JOIN ODS_001.TRADER t2 ON t1.GTP_ID = t2.REAL_TRADER_ID \
         AND TARGET_DATE between t2.BEGIN_DATE and t2.END_DATE"
    );

    assert_eq!(def.attributes[0], Attribute::new("TRADER_ID", "t2.REAL_TRADER_ID", true));
    assert_eq!(def.attributes[1].name, "VOLUME");

    // Filters rendering empty are skipped
    assert_eq!(def.filters, vec!["t2.TRADER_TYPE = 100"]);
}

#[test]
fn test_lookup_without_target_adds_no_attribute() {
    let def = apply("get_target_date", "get_target_date", None).unwrap();
    assert_eq!(def.attributes.len(), 1);
    assert_eq!(def.tables[1].alias, "t2");
    assert!(def.filters.is_empty());
}

#[test]
fn test_keyword_and_positional_overrides() {
    let def = apply(
        "get_real_trader_id",
        "get_real_trader_id('BID_GTP', filter_trader_type=200, filter_impex=1)",
        None,
    )
    .unwrap();
    assert!(def.tables[1].join_clause.contains("ON t1.BID_GTP = t2.REAL_TRADER_ID"));
    assert_eq!(def.filters, vec!["t2.TRADER_TYPE = 200", "t2.IS_IMPEX = 1"]);
}

#[test]
fn test_addition_filters_qualified_against_lookup_table() {
    let def = apply(
        "get_target_date",
        "get_target_date(addition_filters=\"TRADE_SESSION.STATE = 'A' AND KIND > 1\")",
        None,
    )
    .unwrap();
    assert_eq!(def.filters, vec!["t2.STATE = 'A' AND t2.KIND > 1"]);
}

#[test]
fn test_chained_lookups_number_aliases() {
    let mut def = definition();
    let trader = lookup("get_real_trader_id");
    let date = lookup("get_target_date");
    trader
        .apply(&mut def, &TransformCall::parse("get_real_trader_id()").unwrap(), Some("RT"))
        .unwrap();
    date.apply(&mut def, &TransformCall::parse("get_target_date()").unwrap(), Some("TD"))
        .unwrap();

    let aliases: Vec<&str> = def.tables.iter().map(|t| t.alias.as_str()).collect();
    assert_eq!(aliases, vec!["t1", "t2", "t3"]);
    assert_eq!(def.attributes[0].name, "TD");
    assert_eq!(def.attributes[0].formula, "t3.TARGET_DATE");
    assert_eq!(def.attributes[1].name, "RT");
}

#[test]
fn test_bad_arguments_rejected() {
    let unknown = apply("get_target_date", "get_target_date(nope=1)", None);
    assert!(matches!(unknown, Err(TransformError::InvalidArgument { .. })));

    let too_many = apply("get_target_date", "get_target_date(1)", None);
    assert!(matches!(too_many, Err(TransformError::InvalidArgument { .. })));

    let twice = apply(
        "get_real_trader_id",
        "get_real_trader_id('A', original_field='B')",
        None,
    );
    assert!(twice.is_err());

    let not_string = apply("get_target_date", "get_target_date(addition_filters=[1])", None);
    assert!(not_string.is_err());
}

#[test]
fn test_failed_apply_leaves_definition_untouched() {
    let mut def = definition();
    let call = TransformCall::parse("get_target_date(nope=1)").unwrap();
    assert!(lookup("get_target_date").apply(&mut def, &call, Some("X")).is_err());
    assert_eq!(def, definition());
}

#[test]
fn test_target_requires_value() {
    let config = LookupConfig {
        table: "A.B".to_string(),
        on: "{{ base }}.ID = {{ alias }}.ID".to_string(),
        value: None,
        params: Default::default(),
        filters: vec![],
    };
    let handler = LookupTransform::new("get_b", config, AliasRewriter::default()).unwrap();
    let mut def = definition();
    let call = TransformCall::parse("get_b()").unwrap();
    assert!(handler.apply(&mut def, &call, Some("X")).is_err());
    assert!(handler.apply(&mut def, &call, None).is_ok());
}

#[test]
fn test_undefined_template_variable_is_render_error() {
    let config = LookupConfig {
        table: "A.B".to_string(),
        on: "{{ missing }} = 1".to_string(),
        value: None,
        params: Default::default(),
        filters: vec![],
    };
    let handler = LookupTransform::new("get_b", config, AliasRewriter::default()).unwrap();
    let mut def = definition();
    let err = handler
        .apply(&mut def, &TransformCall::parse("get_b").unwrap(), None)
        .unwrap_err();
    assert!(matches!(err, TransformError::Render { .. }));
}

#[test]
fn test_invalid_template_rejected_at_construction() {
    let config = LookupConfig {
        table: "A.B".to_string(),
        on: "{{ alias ".to_string(),
        value: None,
        params: Default::default(),
        filters: vec![],
    };
    assert!(matches!(
        LookupTransform::new("get_b", config, AliasRewriter::default()),
        Err(TransformError::Render { .. })
    ));
}

#[test]
fn test_reserved_parameter_rejected() {
    let config: LookupConfig =
        serde_yaml::from_str("table: A.B\non: 'x'\nparams:\n  alias: X\n").unwrap();
    assert!(LookupTransform::new("get_b", config, AliasRewriter::default()).is_err());
}

#[test]
fn test_describe_lists_params() {
    assert_eq!(lookup("get_target_date").describe(), "lookup join on ODS_002.TRADE_SESSION");
    assert!(lookup("get_real_trader_id")
        .describe()
        .contains("(original_field, join_field, date_field"));
}
