use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const PAGE: &str = "<!-- wp:divi/section -->\n<!-- wp:divi/row -->\n<!-- wp:divi/column -->\n<!-- wp:divi/text /-->\n<!-- /wp:divi/column -->\n<!-- /wp:divi/row -->\n<!-- /wp:divi/section -->";

fn divi_blocks() -> Command {
    Command::cargo_bin("divi-blocks").unwrap()
}

#[test]
fn parse_prints_blocks_as_json() {
    divi_blocks()
        .arg("parse")
        .write_stdin(PAGE)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""blockName": "divi/section""#))
        .stdout(predicate::str::contains(r#""innerHTML""#));
}

#[test]
fn parse_serializes_back_to_block_comments() {
    divi_blocks()
        .args(["parse", "--serialize"])
        .write_stdin("<!-- wp:divi/placeholder -->\n<!-- wp:divi/text /-->\n<!-- /wp:divi/placeholder -->")
        .assert()
        .success()
        .stdout(predicate::str::contains("<!-- wp:divi/text /-->"));
}

#[test]
fn normalize_unwraps_placeholders() {
    divi_blocks()
        .args(["parse", "--serialize", "--normalize"])
        .write_stdin("<!-- wp:divi/placeholder -->\n<!-- wp:divi/text /-->\n<!-- /wp:divi/placeholder -->")
        .assert()
        .success()
        .stdout(predicate::str::diff("<!-- wp:divi/text /-->"));
}

#[test]
fn tree_shows_ids_and_layout() {
    let temp_dir = TempDir::new().unwrap();
    let page = temp_dir.path().join("page.html");
    fs::write(&page, PAGE).unwrap();

    divi_blocks()
        .arg("tree")
        .arg(&page)
        .args(["--layout", "et_body_layout"])
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "divi/section-0 [et_body_layout]\n  divi/row-0 [et_body_layout]\n    divi/column-0 [et_body_layout]\n      divi/text-0 [et_body_layout]\n",
        ));
}

#[test]
fn tree_inlines_layouts_from_directory() {
    let temp_dir = TempDir::new().unwrap();
    let layouts = temp_dir.path().join("layouts");
    fs::create_dir(&layouts).unwrap();
    fs::write(
        layouts.join("77.html"),
        r#"<!-- wp:divi/blurb {"title":"saved"} /-->"#,
    )
    .unwrap();

    divi_blocks()
        .arg("tree")
        .arg("--layouts-dir")
        .arg(&layouts)
        .write_stdin(r#"<!-- wp:divi/section --><!-- wp:divi/global-layout {"globalModule":77} /--><!-- /wp:divi/section -->"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("  divi/blurb-0"));
}

#[test]
fn tree_rejects_unknown_layout_type() {
    divi_blocks()
        .args(["tree", "--layout", "nope"])
        .write_stdin(PAGE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown layout type: nope"));
}

#[test]
fn presets_merge_defaults_under_block_attrs() {
    let temp_dir = TempDir::new().unwrap();
    let presets = temp_dir.path().join("presets.json");
    fs::write(
        &presets,
        r#"{"module":{"divi/text":{"default":"p1","items":{"p1":{"id":"p1","moduleName":"divi/text","attrs":{"color":"var(--gcid-1)","size":"12px"}}}}}}"#,
    )
    .unwrap();
    let global = temp_dir.path().join("global.json");
    fs::write(&global, r##"{"global_colors":{"gcid-1":{"color":"#abcdef"}}}"##).unwrap();

    divi_blocks()
        .args(["presets", "--module", "divi/text", "--attrs", r#"{"size":"14px"}"#])
        .arg("--presets")
        .arg(&presets)
        .arg("--global-data")
        .arg(&global)
        .assert()
        .success()
        .stdout(predicate::str::contains(r##""color": "#abcdef""##))
        .stdout(predicate::str::contains(r#""size": "14px""#));
}

#[test]
fn presets_print_class_names() {
    let temp_dir = TempDir::new().unwrap();
    let presets = temp_dir.path().join("presets.json");
    fs::write(
        &presets,
        r#"{"module":{"divi/text":{"default":"p1","items":{"p1":{"id":"p1","moduleName":"divi/text"}}}}}"#,
    )
    .unwrap();

    divi_blocks()
        .args(["presets", "--module", "divi/text", "--classes"])
        .arg("--presets")
        .arg(&presets)
        .assert()
        .success()
        .stdout(predicate::str::diff("preset--module--divi-text--default\n"));
}

#[test]
fn presets_reject_invalid_attrs() {
    divi_blocks()
        .args(["presets", "--module", "divi/text", "--attrs", "{nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--attrs is not valid JSON"));
}

#[test]
fn color_resolves_through_global_data() {
    let temp_dir = TempDir::new().unwrap();
    let global = temp_dir.path().join("global.json");
    fs::write(
        &global,
        r##"{"global_colors":{"gcid-a":{"color":"var(--gcid-b)"},"gcid-b":{"color":"#112233"}}}"##,
    )
    .unwrap();

    divi_blocks()
        .args(["color", "var(--gcid-a)", "--global-data"])
        .arg(&global)
        .assert()
        .success()
        .stdout(predicate::str::diff("#112233\n"));
}

#[test]
fn config_file_changes_global_data_key() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("divi-blocks.toml");
    fs::write(&config, "[global_data]\nmax_depth = 1\n").unwrap();
    let global = temp_dir.path().join("global.json");
    fs::write(
        &global,
        r##"{"global_colors":{"gcid-a":{"color":"var(--gcid-b)"},"gcid-b":{"color":"#112233"}}}"##,
    )
    .unwrap();

    divi_blocks()
        .arg("--config")
        .arg(&config)
        .args(["color", "var(--gcid-a)", "--global-data"])
        .arg(&global)
        .assert()
        .success()
        .stdout(predicate::str::diff("var(--gcid-b)\n"));
}

#[test]
fn init_writes_a_loadable_default_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("conf").join("divi-blocks.toml");

    divi_blocks()
        .arg("--config")
        .arg(&config)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let written = fs::read_to_string(&config).unwrap();
    assert!(written.contains("reset_order_index = false"));
    assert!(written.contains("max_depth = 10"));

    divi_blocks()
        .arg("--config")
        .arg(&config)
        .args(["color", "#fff"])
        .assert()
        .success()
        .stdout(predicate::str::diff("#fff\n"));
}

#[test]
fn init_keeps_an_existing_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("divi-blocks.toml");
    fs::write(&config, "[global_data]\nmax_depth = 1\n").unwrap();

    divi_blocks()
        .arg("--config")
        .arg(&config)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(
        fs::read_to_string(&config).unwrap(),
        "[global_data]\nmax_depth = 1\n"
    );

    divi_blocks()
        .arg("--config")
        .arg(&config)
        .args(["init", "--force"])
        .assert()
        .success();
    assert!(fs::read_to_string(&config).unwrap().contains("max_depth = 10"));
}
