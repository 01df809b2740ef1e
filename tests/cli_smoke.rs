use std::path::PathBuf;
use std::process::Command;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_reelmerge")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "reelmerge.exe"
            } else {
                "reelmerge"
            });
            p
        })
}

#[test]
fn cli_resolve_prints_substituted_text() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.json");
    std::fs::write(
        &catalog,
        r#"{ "indeksy": [ { "item_no": "10004", "assortment_card_no": "K-1",
                            "description_pl": "Stół", "description_en": "Table" } ] }"#,
    )
    .unwrap();

    let out = Command::new(exe())
        .args(["resolve", "--text", "{NAZWA_EN} #{INDEKS} {FOO}", "--item", "10004"])
        .arg("--catalog")
        .arg(&catalog)
        .output()
        .unwrap();

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        "Table #10004 {FOO}"
    );
}

#[test]
fn cli_template_save_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let pre = dir.path().join("pre.json");
    let template = dir.path().join("template.json");
    std::fs::write(
        &pre,
        r#"{ "clips": [ { "path": "intro.png", "image_duration": 2.5,
                          "texts": [ { "text": "{NAZWA_PL}", "config": { "fontsize": 40 } } ] } ] }"#,
    )
    .unwrap();

    let status = Command::new(exe())
        .args(["template", "save", "--pre"])
        .arg(&pre)
        .arg("--template")
        .arg(&template)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(template.exists());

    let out = Command::new(exe())
        .args(["template", "show", "--template"])
        .arg(&template)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(doc["pre_clips"][0]["path"], "intro.png");
    assert_eq!(doc["pre_clips"][0]["image_duration"], 2.5);
    assert_eq!(doc["pre_clips"][0]["texts"][0]["config"]["fontsize"], 40);
    assert_eq!(doc["post_clips"].as_array().map(Vec::len), Some(0));
}

#[test]
fn cli_template_show_fails_without_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = Command::new(exe())
        .args(["template", "show", "--template"])
        .arg(dir.path().join("none.json"))
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no template found"));
}
