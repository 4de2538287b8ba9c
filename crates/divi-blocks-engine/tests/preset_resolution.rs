use divi_blocks_config::{GlobalDataConfig, PresetConfig};
use divi_blocks_engine::preset::{ModuleDefinition, is_preset_id_as_default, normalize_preset_stack};
use divi_blocks_engine::{
    BlockParser, BlockParserStore, FilterMode, GlobalData, GlobalPreset, MemoryOptions,
    ModuleRegistry, NullHost,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

fn presets() -> GlobalPreset {
    let path = format!("{}/tests/fixtures/presets.json", env!("CARGO_MANIFEST_DIR"));
    let data: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    let options = MemoryOptions::new().with(&PresetConfig::default().option_key, data);
    let registry = ModuleRegistry::new().with(ModuleDefinition::new(
        "divi/button",
        json!({"button": {"settings": {"decoration": {"font": {}, "background": {}}}}}),
    ));
    GlobalPreset::from_options(&options, registry, PresetConfig::default()).unwrap()
}

fn global_data() -> GlobalData {
    GlobalData::default()
        .with_color("gcid-primary", "#2ea3f2")
        .with_variable("gvid-body-size", json!("16px"))
}

const PAGE: &str = r##"<!-- wp:divi/section -->
<!-- wp:divi/button {"button":{"innerContent":{"desktop":{"value":{"text":"Plain"}}}}} /-->
<!-- wp:divi/button {"modulePreset":["btn-ghost","btn-large"]} /-->
<!-- wp:divi/button {"modulePreset":"btn-large","button":{"decoration":{"background":{"desktop":{"value":{"color":"#ffffff"}}}}}} /-->
<!-- /wp:divi/section -->"##;

fn resolved(store: &BlockParserStore, presets: &GlobalPreset, id: &str) -> Value {
    let block = store.get(id).unwrap();
    let merged = presets
        .get_merged_attrs(block.name(), Some(&block.attrs), &NullHost)
        .unwrap();
    global_data().resolve_attrs(&merged, FilterMode::Accumulate)
}

#[test]
fn parsed_blocks_resolve_through_presets_and_global_data() {
    let presets = presets();
    let mut store = BlockParserStore::new();
    BlockParser::default().parse(PAGE, &mut store, &NullHost);

    let plain = resolved(&store, &presets, "divi/button-0");
    assert_eq!(
        plain["button"]["decoration"]["background"]["desktop"]["value"]["color"],
        json!("#2ea3f2")
    );
    assert_eq!(
        plain["button"]["decoration"]["font"]["font"]["desktop"]["value"]["size"],
        json!("16px")
    );
    assert_eq!(
        plain["button"]["innerContent"]["desktop"]["value"]["text"],
        json!("Plain")
    );

    // Higher priority merges last
    let stacked = resolved(&store, &presets, "divi/button-1");
    assert_eq!(
        stacked["button"]["decoration"]["background"]["desktop"]["value"]["color"],
        json!("transparent")
    );
    assert_eq!(
        stacked["button"]["decoration"]["spacing"]["desktop"]["value"]["padding"]["top"],
        json!("20px")
    );
    assert_eq!(
        stacked["module"]["meta"]["adminLabel"]["desktop"]["value"],
        json!("Ghost")
    );

    let overridden = resolved(&store, &presets, "divi/button-2");
    assert_eq!(
        overridden["button"]["decoration"]["background"]["desktop"]["value"]["color"],
        json!("#ffffff")
    );
}

#[test]
fn class_names_follow_the_applied_stack() {
    let presets = presets();

    assert_eq!(
        presets.selector_class_names("divi/button", &json!({"modulePreset": ["btn-ghost", "btn-large"]})),
        vec![
            "preset--module--divi-button--btn-large",
            "preset--module--divi-button--btn-ghost",
            "preset--group--divi-font--default",
        ]
    );
}

#[rstest]
#[case::missing(json!(null), vec![])]
#[case::single(json!("btn-large"), vec!["btn-large"])]
#[case::empty_entries(json!(["", "btn-ghost", ""]), vec!["btn-ghost"])]
#[case::default_marker(json!("default"), vec![])]
fn preset_stacks_normalize(#[case] value: Value, #[case] expected: Vec<&str>) {
    assert_eq!(normalize_preset_stack(&value), expected);
}

#[rstest]
#[case("default", "btn-default", true)]
#[case("_initial", "btn-default", true)]
#[case("btn-default", "btn-default", true)]
#[case("btn-ghost", "btn-default", false)]
fn default_aliases(#[case] id: &str, #[case] default_id: &str, #[case] expected: bool) {
    assert_eq!(is_preset_id_as_default(id, default_id), expected);
}

#[test]
fn missing_options_load_as_empty() {
    let options = MemoryOptions::new();

    let presets = GlobalPreset::from_options(&options, ModuleRegistry::new(), PresetConfig::default())
        .unwrap();
    let data = GlobalData::from_options(&options, &GlobalDataConfig::default()).unwrap();

    assert_eq!(
        presets
            .get_merged_attrs("divi/button", Some(&json!({"x": 1})), &NullHost)
            .unwrap(),
        json!({"x": 1})
    );
    assert_eq!(data.resolve_color("var(--gcid-primary)", FilterMode::Nest), "var(--gcid-primary)");
}

#[test]
fn color_cycles_in_stored_data_terminate() {
    let data = GlobalData::default()
        .with_color("gcid-a", "var(--gcid-b)")
        .with_color("gcid-b", "var(--gcid-c)")
        .with_color("gcid-c", "var(--gcid-a)");

    assert_eq!(
        data.resolve_attrs(&json!({"color": "var(--gcid-a)"}), FilterMode::Nest),
        json!({"color": "var(--gcid-a)"})
    );
}
